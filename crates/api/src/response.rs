//! Shared response types for API handlers.
//!
//! Reads return their payload as-is. Writes answer with a human-readable
//! `message` plus whatever identifiers the client needs next.

use serde::Serialize;

/// `{ "message": ... }` acknowledgement for writes with nothing else to report.
///
/// ```ignore
/// Ok(Json(MessageResponse::new("PTW cancelled successfully")))
/// ```
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
