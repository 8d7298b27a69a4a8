//! API response envelope
//!
//! Every HTTP endpoint wraps its payload in this structure:
//!
//! ```json
//! {
//!   "code": "E0000",
//!   "message": "Success",
//!   "data": { ... }
//! }
//! ```
//!
//! The envelope is the single response shape; clients decode it once at the
//! transport boundary instead of shape-sniffing per call site.

use serde::{Deserialize, Serialize};

/// Success code
pub const CODE_OK: &str = "E0000";

/// Unified API response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Error code (E0000 on success)
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Response payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Build a success envelope
    pub fn success(data: T) -> Self {
        Self {
            code: CODE_OK.to_string(),
            message: "Success".to_string(),
            data: Some(data),
        }
    }

    /// Build an error envelope
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }

    /// Whether the envelope carries a success code
    pub fn is_success(&self) -> bool {
        self.code == CODE_OK
    }
}
