//! Shared domain model, the exact-decimal contract, and the error taxonomy
//! every other `fairstake-*` crate builds on.

pub mod decimal;
pub mod error;
pub mod model;

pub use decimal::Decimal;
pub use error::{CoreError, CoreResult};
