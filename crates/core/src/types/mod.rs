//! Core domain types.

pub mod email;
pub mod id;
pub mod price;

pub use email::{Email, EmailError};
pub use id::{OrderId, ProductId, UserId};
pub use price::{Currency, Price};
