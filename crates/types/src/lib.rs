//! Shared types module - input actions, frames, and environment descriptors
//!
//! This module defines the plain data types used throughout the workspace.
//! They carry no engine or networking logic, so the filter, the engines,
//! and the protocol layer can all depend on them.
//!
//! # Actions
//!
//! An [`Action`] is exactly one input event:
//!
//! - **Pointer events** ([`MouseEvent`]): `mouseMoved`, `mousePressed`, `mouseReleased`
//! - **Key events** ([`KeyEvent`]): `keyDown`, `keyUp`
//!
//! On the wire an action is an object with a single `keyEvent` or
//! `mouseEvent` field:
//!
//! ```text
//! {"mouseEvent":{"type":"mousePressed","x":10,"y":20,"button":"left","clickCount":1}}
//! {"keyEvent":{"type":"keyDown","code":"KeyA"}}
//! ```
//!
//! # Event Filters
//!
//! [`EventFilter`] selects how raw client events are reduced before they
//! reach an engine:
//!
//! | Filter | Behavior |
//! |--------|----------|
//! | `NoFilter` | Events are forwarded verbatim |
//! | `DeltaFilter` | Only the net input-state change of the frame is forwarded |
//!
//! # Examples
//!
//! ```
//! use remote_env_types::{Action, EventFilter, KeyEvent, KeyEventType, MouseEvent};
//!
//! let click = Action::Mouse(MouseEvent::pressed(10, 20));
//! let key = Action::Key(KeyEvent::new(KeyEventType::KeyDown, "KeyA"));
//! assert!(click.is_mouse());
//! assert_eq!(key.as_key().map(|k| k.code.as_str()), Some("KeyA"));
//!
//! let filter: EventFilter = "DeltaFilter".parse().unwrap();
//! assert_eq!(filter, EventFilter::DeltaFilter);
//! assert_eq!(filter.to_string(), "DeltaFilter");
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default simulated time per frame (100ms, 10 frames per second)
pub const DEFAULT_FRAME_MS: u64 = 100;

/// Bytes per pixel in a [`Frame`] (packed RGB8)
pub const FRAME_CHANNELS: usize = 3;

// ============== Pointer events ==============

/// Kind of pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseEventType {
    #[serde(rename = "mouseMoved")]
    Moved,
    #[serde(rename = "mousePressed")]
    Pressed,
    #[serde(rename = "mouseReleased")]
    Released,
}

impl MouseEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MouseEventType::Moved => "mouseMoved",
            MouseEventType::Pressed => "mousePressed",
            MouseEventType::Released => "mouseReleased",
        }
    }
}

/// Pointer button identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    None,
    Left,
    Middle,
    Right,
}

/// A single pointer event in frame coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseEvent {
    #[serde(rename = "type")]
    pub kind: MouseEventType,
    pub x: i32,
    pub y: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<MouseButton>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_count: Option<u32>,
}

impl MouseEvent {
    /// Pointer move without a button marker
    pub fn moved(x: i32, y: i32) -> Self {
        Self {
            kind: MouseEventType::Moved,
            x,
            y,
            button: None,
            click_count: None,
        }
    }

    /// Primary-button press with a click count of one
    pub fn pressed(x: i32, y: i32) -> Self {
        Self {
            kind: MouseEventType::Pressed,
            x,
            y,
            button: Some(MouseButton::Left),
            click_count: Some(1),
        }
    }

    /// Primary-button release with a click count of one
    pub fn released(x: i32, y: i32) -> Self {
        Self {
            kind: MouseEventType::Released,
            ..Self::pressed(x, y)
        }
    }
}

// ============== Key events ==============

/// Kind of key event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyEventType {
    #[serde(rename = "keyDown")]
    KeyDown,
    #[serde(rename = "keyUp")]
    KeyUp,
}

impl KeyEventType {
    pub fn is_down(&self) -> bool {
        matches!(self, KeyEventType::KeyDown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyEventType::KeyDown => "keyDown",
            KeyEventType::KeyUp => "keyUp",
        }
    }
}

/// A single key event
///
/// `code` identifies the physical key (`"KeyA"`, `"ArrowLeft"`, ...). The
/// remaining fields are optional metadata that browser clients attach and
/// engines may forward to the simulated application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEvent {
    #[serde(rename = "type")]
    pub kind: KeyEventType,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unmodified_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows_virtual_key_code: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_virtual_key_code: Option<u32>,
}

impl KeyEvent {
    pub fn new(kind: KeyEventType, code: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            key: None,
            text: None,
            unmodified_text: None,
            windows_virtual_key_code: None,
            native_virtual_key_code: None,
        }
    }

    /// Copy of this event with a different kind, keeping all metadata
    pub fn with_kind(&self, kind: KeyEventType) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }
}

// ============== Actions ==============

/// One input event: either a pointer event or a key event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "mouseEvent")]
    Mouse(MouseEvent),
    #[serde(rename = "keyEvent")]
    Key(KeyEvent),
}

impl Action {
    pub fn is_mouse(&self) -> bool {
        matches!(self, Action::Mouse(_))
    }

    pub fn as_mouse(&self) -> Option<&MouseEvent> {
        match self {
            Action::Mouse(evt) => Some(evt),
            Action::Key(_) => None,
        }
    }

    pub fn as_key(&self) -> Option<&KeyEvent> {
        match self {
            Action::Key(evt) => Some(evt),
            Action::Mouse(_) => None,
        }
    }
}

impl From<MouseEvent> for Action {
    fn from(evt: MouseEvent) -> Self {
        Action::Mouse(evt)
    }
}

impl From<KeyEvent> for Action {
    fn from(evt: KeyEvent) -> Self {
        Action::Key(evt)
    }
}

// ============== Event filter mode ==============

/// How raw client events are pruned before they reach an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventFilter {
    /// Forward every event verbatim
    #[default]
    NoFilter,
    /// Forward the minimum set of events describing how the pointer and
    /// keyboard state changed from the beginning to the end of the frame
    DeltaFilter,
}

impl EventFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventFilter::NoFilter => "NoFilter",
            EventFilter::DeltaFilter => "DeltaFilter",
        }
    }
}

impl fmt::Display for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`EventFilter`] name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event filter '{0}'")]
pub struct UnknownFilter(pub String);

impl FromStr for EventFilter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NoFilter" => Ok(EventFilter::NoFilter),
            "DeltaFilter" => Ok(EventFilter::DeltaFilter),
            other => Err(UnknownFilter(other.to_string())),
        }
    }
}

// ============== Frames ==============

/// Raw RGB8 pixel buffer produced by an engine, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    /// Create a frame filled with a single color
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let len = (width as usize) * (height as usize);
        let mut pixels = Vec::with_capacity(len * FRAME_CHANNELS);
        for _ in 0..len {
            pixels.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Expected buffer length for the frame's dimensions
    pub fn expected_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * FRAME_CHANNELS
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * FRAME_CHANNELS;
        let px = self.pixels.get(i..i + FRAME_CHANNELS)?;
        Some([px[0], px[1], px[2]])
    }
}

// ============== Environment descriptors ==============

/// Which built-in engine simulates a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    /// Click a moving target
    Target,
    /// Press the arrow key the frame points at
    KeyMatch,
}

/// Immutable metadata identifying and configuring one environment type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSpec {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Key codes the environment recognizes; `None` accepts every key
    pub key_whitelist: Option<Vec<String>>,
    pub engine: EngineKind,
    /// Simulated time after which an episode ends
    pub episode_length: Duration,
}

impl EnvSpec {
    /// Pointer position at the center of the frame
    pub fn center(&self) -> (i32, i32) {
        ((self.width / 2) as i32, (self.height / 2) as i32)
    }

    pub fn accepts_key(&self, code: &str) -> bool {
        match &self.key_whitelist {
            Some(keys) => keys.iter().any(|k| k == code),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(width: u32, height: u32) -> EnvSpec {
        EnvSpec {
            name: "Test-v0".to_string(),
            width,
            height,
            key_whitelist: None,
            engine: EngineKind::Target,
            episode_length: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_action_wire_shape() {
        let v: Action = serde_json::from_str(
            r#"{"mouseEvent":{"type":"mouseMoved","x":10,"y":20}}"#,
        )
        .unwrap();
        assert_eq!(v, Action::Mouse(MouseEvent::moved(10, 20)));

        let v: Action =
            serde_json::from_str(r#"{"keyEvent":{"type":"keyUp","code":"ArrowLeft"}}"#).unwrap();
        assert_eq!(v, Action::Key(KeyEvent::new(KeyEventType::KeyUp, "ArrowLeft")));
    }

    #[test]
    fn test_mouse_event_serializes_camel_case() {
        let json = serde_json::to_value(Action::Mouse(MouseEvent::pressed(1, 2))).unwrap();
        assert_eq!(json["mouseEvent"]["type"], "mousePressed");
        assert_eq!(json["mouseEvent"]["button"], "left");
        assert_eq!(json["mouseEvent"]["clickCount"], 1);
    }

    #[test]
    fn test_key_event_metadata_is_optional() {
        let evt: KeyEvent = serde_json::from_str(
            r#"{"type":"keyDown","code":"KeyA","key":"a","text":"a","windowsVirtualKeyCode":65}"#,
        )
        .unwrap();
        assert_eq!(evt.key.as_deref(), Some("a"));
        assert_eq!(evt.windows_virtual_key_code, Some(65));

        let up = evt.with_kind(KeyEventType::KeyUp);
        assert_eq!(up.kind, KeyEventType::KeyUp);
        assert_eq!(up.text.as_deref(), Some("a"));
    }

    #[test]
    fn test_event_filter_parse_and_format() {
        assert_eq!("NoFilter".parse::<EventFilter>(), Ok(EventFilter::NoFilter));
        assert_eq!(
            "DeltaFilter".parse::<EventFilter>(),
            Ok(EventFilter::DeltaFilter)
        );
        let err = "deltafilter".parse::<EventFilter>().unwrap_err();
        assert_eq!(err, UnknownFilter("deltafilter".to_string()));
        let source: &dyn std::error::Error = &err;
        assert_eq!(source.to_string(), "unknown event filter 'deltafilter'");
        assert_eq!(EventFilter::default(), EventFilter::NoFilter);
        assert_eq!(EventFilter::DeltaFilter.to_string(), "DeltaFilter");
    }

    #[test]
    fn test_spec_center_uses_integer_division() {
        assert_eq!(spec(100, 80).center(), (50, 40));
        assert_eq!(spec(101, 81).center(), (50, 40));
    }

    #[test]
    fn test_spec_key_whitelist() {
        let mut s = spec(10, 10);
        assert!(s.accepts_key("KeyA"));
        s.key_whitelist = Some(vec!["ArrowLeft".to_string()]);
        assert!(s.accepts_key("ArrowLeft"));
        assert!(!s.accepts_key("KeyA"));
    }

    #[test]
    fn test_frame_pixels() {
        let frame = Frame::filled(2, 3, [1, 2, 3]);
        assert_eq!(frame.pixels.len(), frame.expected_len());
        assert_eq!(frame.pixel(1, 2), Some([1, 2, 3]));
        assert_eq!(frame.pixel(2, 0), None);
    }
}
