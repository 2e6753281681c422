//! Paw Market storefront library.
//!
//! Customer-facing JSON API: catalog, cart, wishlist, checkout and order
//! history. The binary in `main.rs` wires configuration, logging and the
//! server loop around [`routes::app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
