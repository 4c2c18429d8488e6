//! Registry of standard error responses.

use crate::schema::{Schema, object, string};

/// Status codes with a standard error definition.
pub const STANDARD_ERROR_CODES: [u16; 12] =
    [400, 401, 403, 404, 405, 409, 422, 429, 500, 502, 503, 504];

/// A predefined error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardError {
    pub code: u16,
    pub description: &'static str,
}

impl StandardError {
    /// The schema every standard error uses: `{error: string (required), details: string}`.
    pub fn schema(&self) -> Schema {
        error_schema()
    }
}

/// The generic error body.
pub fn error_schema() -> Schema {
    object([
        ("error", string().required()),
        ("details", string()),
    ])
}

/// Looks up the standard definition for `code`.
pub fn standard_error(code: u16) -> Option<StandardError> {
    let description = match code {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => return None,
    };
    Some(StandardError { code, description })
}
