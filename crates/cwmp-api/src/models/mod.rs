//! Request and response models for the web API.

pub mod common;
pub mod error;

pub use common::{ApiResponse, ResponseMeta};
pub use error::{ApiResult, ErrorResponse};
