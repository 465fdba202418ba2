//! Wire protocol for the streaming endpoint.
//!
//! Inbound units are text frames. Two structured shapes are recognized:
//!
//! ```json
//! {"type":"userName","userName":"alice"}
//! {"type":"frame","image":"<base64 or data-URL>","userName":"alice"}
//! ```
//!
//! Anything else (invalid JSON, or JSON matching neither shape) is treated
//! as a bare image payload from a legacy client, never as a parse error.

use serde::{Deserialize, Serialize};

/// Session name used when a client never declares one.
pub const DEFAULT_USER_NAME: &str = "Unknown";

/// Structured inbound message shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "userName")]
    UserName {
        #[serde(rename = "userName")]
        user_name: Option<String>,
    },
    #[serde(rename = "frame")]
    Frame {
        #[serde(default)]
        image: String,
        #[serde(rename = "userName")]
        user_name: Option<String>,
    },
}

/// Routing decision for one inbound text unit.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundUnit {
    /// Bind the connection to a session name; carries no frame data.
    Identity { user_name: Option<String> },
    /// An image payload, optionally tagged with a session name.
    Frame {
        image: String,
        user_name: Option<String>,
    },
    /// Unstructured text: the whole unit is the image payload.
    Raw { payload: String },
}

impl InboundUnit {
    /// Best-effort classification of a text unit.
    pub fn decode(text: &str) -> Self {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(ClientMessage::UserName { user_name }) => Self::Identity { user_name },
            Ok(ClientMessage::Frame { image, user_name }) => Self::Frame { image, user_name },
            Err(_) => Self::Raw {
                payload: text.to_string(),
            },
        }
    }
}

/// Outbound message shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "prediction")]
    Prediction {
        #[serde(rename = "userName")]
        user_name: String,
        prediction: String,
    },
}
