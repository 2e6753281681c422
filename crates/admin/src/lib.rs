//! Paw Market back-office library.
//!
//! Staff-facing JSON API on its own port: order management, the dashboard
//! and the spreadsheet export. Shares the `shop` schema with the storefront.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
