//! Application services.
//!
//! The pipeline modules (`cart`, `checkout`, `invoice`) carry the shop's
//! actual behavior; `auth`, `payment`, `email`, and `uploads` wrap the
//! collaborators those flows call through.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod email;
pub mod invoice;
pub mod payment;
pub mod uploads;
