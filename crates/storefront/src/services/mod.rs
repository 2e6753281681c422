//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, password login and password changes (argon2)
//! - `cart` - Stock-checked cart writes
//! - `checkout` - Order planning and the checkout transaction
//! - `location` - Province/district/ward lookup with a 24-hour cache

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod location;

pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartService};
pub use checkout::{CheckoutError, CheckoutRequest, CheckoutService};
pub use location::{HttpLocationClient, LocationError, LocationLookup};
