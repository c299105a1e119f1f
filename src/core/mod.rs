pub mod error;
pub mod last_error;
pub mod properties;
