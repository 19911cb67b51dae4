mod auth;
mod client;
mod error;

pub use auth::*;
pub use client::*;
pub use error::*;
