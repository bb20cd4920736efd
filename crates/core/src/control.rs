//! Control messages sent from the page to the worker.

use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

/// A command carried in the `type` field of a page message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControlCommand {
    /// `SKIP_WAITING`: promote the waiting worker now.
    #[serde(rename = "SKIP_WAITING")]
    ActivateNow,
    /// `BUST_CACHE`: delete every cache generation.
    #[serde(rename = "BUST_CACHE")]
    PurgeAll,
}

impl ControlCommand {
    /// Extract a command from an arbitrary message.
    ///
    /// Returns `None` for anything unrecognised: non-objects, a missing or
    /// non-string `type`, or an unknown command.
    pub fn from_message(message: &Value) -> Option<Self> {
        message.get("type").and_then(Value::as_str).and_then(|t| t.parse().ok())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ControlCommand::ActivateNow => "SKIP_WAITING",
            ControlCommand::PurgeAll => "BUST_CACHE",
        }
    }
}

impl FromStr for ControlCommand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SKIP_WAITING" => Ok(ControlCommand::ActivateNow),
            "BUST_CACHE" => Ok(ControlCommand::PurgeAll),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_commands() {
        assert_eq!(ControlCommand::from_message(&json!({"type": "SKIP_WAITING"})), Some(ControlCommand::ActivateNow));
        assert_eq!(ControlCommand::from_message(&json!({"type": "BUST_CACHE"})), Some(ControlCommand::PurgeAll));
    }

    #[test]
    fn test_extra_fields_ignored() {
        let msg = json!({"type": "BUST_CACHE", "reason": "manual"});
        assert_eq!(ControlCommand::from_message(&msg), Some(ControlCommand::PurgeAll));
    }

    #[test]
    fn test_unknown_messages() {
        for msg in [
            json!({"type": "RELOAD"}),
            json!({"type": "skip_waiting"}),
            json!({"type": 7}),
            json!({}),
            json!(null),
            json!("SKIP_WAITING"),
            json!([1, 2]),
        ] {
            assert_eq!(ControlCommand::from_message(&msg), None, "{msg}");
        }
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&ControlCommand::ActivateNow).unwrap(), "\"SKIP_WAITING\"");
        assert_eq!(ControlCommand::PurgeAll.as_str(), "BUST_CACHE");
    }
}
