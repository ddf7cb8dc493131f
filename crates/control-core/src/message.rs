//! Self-describing control-plane request/reply records (spec §6).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// `{msg_id, msg_type, msg_val, params}`. `msg_type` is `"cmd"` for
/// every request this engine recognises; anything else is NACKed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlRequest {
    pub msg_id: u64,
    pub msg_type: String,
    pub msg_val: String,
    #[serde(default = "default_params")]
    pub params: Value,
}

fn default_params() -> Value {
    json!({})
}

/// Reply echoing `msg_id`/`msg_val`, with `msg_type` set to `"ack"` on
/// success or `"nack"` with `params.error` set on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlReply {
    pub msg_id: u64,
    pub msg_val: String,
    pub msg_type: String,
    pub params: Value,
}

impl ControlReply {
    pub fn ack(msg_id: u64, msg_val: impl Into<String>, params: Value) -> Self {
        Self {
            msg_id,
            msg_val: msg_val.into(),
            msg_type: "ack".to_string(),
            params,
        }
    }

    pub fn nack(msg_id: u64, msg_val: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            msg_id,
            msg_val: msg_val.into(),
            msg_type: "nack".to_string(),
            params: json!({ "error": error.into() }),
        }
    }
}
