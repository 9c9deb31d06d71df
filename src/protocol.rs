//! Wire messages exchanged with the game server.
//!
//! Every message is a JSON object tagged by its `type` field and sent on a
//! single line. Decoding happens in two steps so that malformed JSON and a
//! well-formed record of the wrong shape can be told apart.

use crate::solver::{Feedback, format_marks};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Hello { northeastern_username: String },
    Guess { id: String, word: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Start { id: String },
    Retry { guesses: Vec<GuessRecord> },
    Bye { flag: String },
}

/// One scored guess, as reported back by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessRecord {
    pub word: String,
    pub marks: Feedback,
}

impl fmt::Display for GuessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.word, format_marks(&self.marks))
    }
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Retry { .. } => "retry",
            Self::Bye { .. } => "bye",
        }
    }
}

#[derive(Debug)]
pub enum DecodeError {
    /// The line is not a JSON object.
    Malformed(serde_json::Error),
    /// Valid JSON, but without a recognised `type` or with missing/invalid fields.
    Invalid {
        kind: Option<String>,
        detail: String,
    },
}

pub fn encode(message: &ClientMessage) -> serde_json::Result<String> {
    serde_json::to_string(message)
}

pub fn decode(line: &str) -> Result<ServerMessage, DecodeError> {
    let value: serde_json::Value = serde_json::from_str(line).map_err(DecodeError::Malformed)?;
    let kind = value
        .get("type")
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned);
    match kind.as_deref() {
        Some("start" | "retry" | "bye") => {}
        Some(other) => {
            return Err(DecodeError::Invalid {
                kind: kind.clone(),
                detail: format!("unexpected message type '{other}'"),
            });
        }
        None => {
            return Err(DecodeError::Invalid {
                kind: None,
                detail: "message has no 'type' field".to_string(),
            });
        }
    }
    serde_json::from_value(value).map_err(|e| DecodeError::Invalid {
        kind,
        detail: e.to_string(),
    })
}
