//! API data models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of a tick invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickRequest {
    /// Course to advance
    pub course_id: Uuid,

    /// Report aggregate counts without dispatching
    #[serde(default)]
    pub check_only: bool,
}

/// Fatal-error body: `{ "success": false, "error": "..." }`
pub fn error_body(message: impl Into<String>) -> serde_json::Value {
    serde_json::json!({
        "success": false,
        "error": message.into(),
    })
}
