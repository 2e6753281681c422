//! Paw Market Core - Shared types library.
//!
//! This crate provides common types used across all Paw Market components:
//! - `storefront` - Customer-facing catalog, cart, checkout and orders
//! - `admin` - Back-office order management and reporting
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Pricing and status rules live here so both
//! binaries agree on them.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, order statuses, pricing, catalog query
//!   types and the session secret policy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
