//! Infrastructure error mapping

mod conversions;

pub use conversions::{error_from_status, InfraError};
