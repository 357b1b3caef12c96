//! Authentication service models

pub mod user;

pub use user::{NewUser, PublicUser, UpdateProfile, User};
