//! Invocation input and output models.

pub mod request;
pub mod result;

pub use request::{CompressionRequest, EffectiveRequest};
pub use result::{CompressionResult, ResultCode};
