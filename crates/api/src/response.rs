//! Shared response envelope types for API handlers.
//!
//! Single resources use a `{ "data": ... }` envelope; listings serialize
//! [`storefront_core::listing::Page`] directly as `{ "data", "meta" }`.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "message": ... }` acknowledgement for actions without a body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
