pub mod error;
pub mod health;
pub mod intake;
pub mod openapi;

pub use error::ApiError;
