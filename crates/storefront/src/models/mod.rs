//! Domain models for the storefront.
//!
//! These are validated domain objects returned by repositories and
//! serialized by handlers. Database row types stay private to `db`.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod session;
pub mod user;

pub use cart::{Cart, CartLine};
pub use catalog::{Brand, CategorySummary, Product, ProductFilter};
pub use order::{Order, OrderDetail, OrderLine, OrderSummary, ShippingMethod};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{Profile, ProfileUpdate, User};
