//! Error classification shared by every domain module.

use serde::Serialize;

/// Broad category of a domain error.
///
/// Each module error maps onto one of these so the HTTP layer can pick a
/// status code without knowing every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or malformed input, or a rule violation (400)
    Validation,
    /// Missing or bad credentials (401)
    Unauthorized,
    /// Caller lacks the admin/organizer capability (403)
    Forbidden,
    /// Referenced entity does not exist (404)
    NotFound,
    /// Anything unexpected (500)
    Internal,
}
