//! Protocol module - JSON message types for the environment API
//!
//! Every WebSocket text message carries one JSON object with a `type` tag.
//! Clients send `reset` and `step`; the server answers each with a message
//! of the same type, or with a final `error`.

use serde::{Deserialize, Serialize};

use crate::types::{Action, KeyEvent, MouseEvent};

// ============== Client -> Server ==============

/// Raw incoming envelope. Unknown `type` values are kept so the session can
/// report them.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientMessage {
    #[serde(rename = "type", default)]
    pub msg_type: String,
    #[serde(default)]
    pub actions: Option<Vec<RawAction>>,
}

/// Wire form of an action: an object with a `keyEvent` or a `mouseEvent`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAction {
    #[serde(default)]
    pub key_event: Option<KeyEvent>,
    #[serde(default)]
    pub mouse_event: Option<MouseEvent>,
}

impl RawAction {
    /// The key event wins if both are present; an empty object yields
    /// nothing.
    pub fn into_action(self) -> Option<Action> {
        match (self.key_event, self.mouse_event) {
            (Some(key), _) => Some(Action::Key(key)),
            (None, Some(mouse)) => Some(Action::Mouse(mouse)),
            (None, None) => None,
        }
    }
}

/// A validated client command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Reset,
    Step(Vec<Action>),
    Unknown(String),
}

pub const RESET: &str = "reset";
pub const STEP: &str = "step";
pub const ERROR: &str = "error";

/// Parse one incoming message.
///
/// Fails only when the text is not a JSON object of the expected shape; an
/// unrecognized `type` is returned as [`Command::Unknown`].
pub fn parse_message(text: &str) -> Result<Command, serde_json::Error> {
    let msg: ClientMessage = serde_json::from_str(text)?;
    Ok(match msg.msg_type.as_str() {
        RESET => Command::Reset,
        STEP => Command::Step(
            msg.actions
                .unwrap_or_default()
                .into_iter()
                .filter_map(RawAction::into_action)
                .collect(),
        ),
        _ => Command::Unknown(msg.msg_type),
    })
}

// ============== Server -> Client ==============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Reset {
        observation: String,
    },
    Step {
        observation: String,
        reward: f64,
        done: bool,
    },
    Error {
        error: String,
    },
}

impl ServerMessage {
    pub fn reset(observation: String) -> Self {
        ServerMessage::Reset { observation }
    }

    pub fn step(observation: String, reward: f64, done: bool) -> Self {
        ServerMessage::Step {
            observation,
            reward,
            done,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        ServerMessage::Error {
            error: error.into(),
        }
    }

    pub fn type_str(&self) -> &'static str {
        match self {
            ServerMessage::Reset { .. } => RESET,
            ServerMessage::Step { .. } => STEP,
            ServerMessage::Error { .. } => ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{KeyEventType, MouseEventType};

    #[test]
    fn test_parse_reset() {
        assert_eq!(parse_message(r#"{"type":"reset"}"#).unwrap(), Command::Reset);
    }

    #[test]
    fn test_parse_step_actions() {
        let cmd = parse_message(
            r#"{"type":"step","actions":[
                {"mouseEvent":{"type":"mouseMoved","x":10,"y":20}},
                {"keyEvent":{"type":"keyDown","code":"KeyA"}}
            ]}"#,
        )
        .unwrap();
        let Command::Step(actions) = cmd else {
            panic!("expected step, got {:?}", cmd);
        };
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].as_mouse().unwrap().kind, MouseEventType::Moved);
        assert_eq!(actions[1].as_key().unwrap().kind, KeyEventType::KeyDown);
    }

    #[test]
    fn test_parse_step_without_actions() {
        assert_eq!(
            parse_message(r#"{"type":"step"}"#).unwrap(),
            Command::Step(Vec::new())
        );
        assert_eq!(
            parse_message(r#"{"type":"step","actions":null}"#).unwrap(),
            Command::Step(Vec::new())
        );
    }

    #[test]
    fn test_empty_action_is_skipped_and_key_wins() {
        let cmd = parse_message(
            r#"{"type":"step","actions":[{},
                {"keyEvent":{"type":"keyUp","code":"KeyB"},
                 "mouseEvent":{"type":"mouseMoved","x":1,"y":1}}]}"#,
        )
        .unwrap();
        let Command::Step(actions) = cmd else {
            panic!("expected step");
        };
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].as_key().unwrap().code, "KeyB");
    }

    #[test]
    fn test_unknown_and_missing_type() {
        assert_eq!(
            parse_message(r#"{"type":"observe"}"#).unwrap(),
            Command::Unknown("observe".to_string())
        );
        assert_eq!(
            parse_message(r#"{}"#).unwrap(),
            Command::Unknown(String::new())
        );
    }

    #[test]
    fn test_malformed_is_error() {
        assert!(parse_message("not json").is_err());
        assert!(parse_message(r#"{"type":"step","actions":[{"keyEvent":{"type":"keyPress","code":"A"}}]}"#).is_err());
        assert!(parse_message(r#"[1,2]"#).is_err());
    }

    #[test]
    fn test_server_message_shapes() {
        let v = serde_json::to_value(ServerMessage::reset("abc".into())).unwrap();
        assert_eq!(v, serde_json::json!({"type":"reset","observation":"abc"}));

        let v = serde_json::to_value(ServerMessage::step("o".into(), 1.5, true)).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"type":"step","observation":"o","reward":1.5,"done":true})
        );

        let v = serde_json::to_value(ServerMessage::error("boom")).unwrap();
        assert_eq!(v, serde_json::json!({"type":"error","error":"boom"}));
        assert_eq!(ServerMessage::error("x").type_str(), "error");
    }
}
