//! Event filtering between the client and an engine.
//!
//! Clients report every raw input event they observed during a frame. Agents
//! are usually parameterized to describe only "what changed", so the
//! [`EventFilter::DeltaFilter`] mode reduces a frame's raw events to the
//! minimal set of synthetic events that reproduces the same end-of-frame
//! input state:
//!
//! 1. at most one `mouseMoved` (if the pointer ended somewhere new),
//! 2. at most one `mousePressed`/`mouseReleased` (if the button state flipped),
//! 3. one `keyDown`/`keyUp` per key whose state flipped.
//!
//! A key pressed and released within the same frame has no net change and
//! produces no synthetic event. This is a known approximation: agents that
//! need to observe transient presses should run with `NoFilter`.

use std::collections::HashMap;
use std::time::Duration;

use crate::env::{Env, StepResult};
use crate::error::EnvError;
use crate::types::{Action, EnvSpec, EventFilter, Frame, KeyEvent, KeyEventType, MouseButton};
use crate::types::{MouseEvent, MouseEventType};

/// Pointer and keyboard state as seen at a frame boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    pub x: i32,
    pub y: i32,
    pub pressed: bool,
    /// Keys absent from the map are not pressed.
    pub keys: HashMap<String, bool>,
}

impl InputState {
    /// Pointer at the center of the frame, nothing pressed.
    pub fn centered(spec: &EnvSpec) -> Self {
        let (x, y) = spec.center();
        Self {
            x,
            y,
            pressed: false,
            keys: HashMap::new(),
        }
    }

    pub fn is_key_pressed(&self, code: &str) -> bool {
        self.keys.get(code).copied().unwrap_or(false)
    }

    /// Codes of every currently pressed key, sorted.
    pub fn pressed_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .keys
            .iter()
            .filter(|(_, pressed)| **pressed)
            .map(|(code, _)| code.as_str())
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Track the effect of one event, the way an observer of the event
    /// stream would.
    pub fn apply(&mut self, action: &Action) {
        match action {
            Action::Mouse(evt) => {
                self.x = evt.x;
                self.y = evt.y;
                match evt.kind {
                    MouseEventType::Pressed => self.pressed = true,
                    MouseEventType::Released => self.pressed = false,
                    MouseEventType::Moved => {}
                }
            }
            Action::Key(evt) => {
                self.keys.insert(evt.code.clone(), evt.kind.is_down());
            }
        }
    }
}

/// Stateful delta reduction over consecutive frames.
#[derive(Debug, Clone, Default)]
pub struct DeltaFilter {
    state: InputState,
}

impl DeltaFilter {
    pub fn new(spec: &EnvSpec) -> Self {
        Self {
            state: InputState::centered(spec),
        }
    }

    pub fn reset(&mut self, spec: &EnvSpec) {
        self.state = InputState::centered(spec);
    }

    pub fn state(&self) -> &InputState {
        &self.state
    }

    /// Reduce one frame of raw events to the net state change, and remember
    /// the frame's end state for the next call.
    pub fn filter(&mut self, events: &[Action]) -> Vec<Action> {
        let (mut x, mut y, mut pressed) = (self.state.x, self.state.y, self.state.pressed);

        // Keys mentioned this frame, in first-mention order. The stored
        // event is the last raw one seen for the code, so synthetic events
        // keep the client's key metadata.
        let mut key_index: HashMap<&str, usize> = HashMap::new();
        let mut new_keys: Vec<(&KeyEvent, bool)> = Vec::new();

        for evt in events {
            match evt {
                Action::Mouse(m) => {
                    x = m.x;
                    y = m.y;
                    match m.kind {
                        MouseEventType::Pressed => pressed = true,
                        MouseEventType::Released => pressed = false,
                        MouseEventType::Moved => {}
                    }
                }
                Action::Key(k) => {
                    let down = k.kind.is_down();
                    match key_index.get(k.code.as_str()) {
                        Some(&i) => new_keys[i] = (k, down),
                        None => {
                            key_index.insert(k.code.as_str(), new_keys.len());
                            new_keys.push((k, down));
                        }
                    }
                }
            }
        }

        let mut out = Vec::new();

        if x != self.state.x || y != self.state.y {
            let mut moved = MouseEvent::moved(x, y);
            if pressed {
                moved.button = Some(MouseButton::Left);
            }
            out.push(Action::Mouse(moved));
            self.state.x = x;
            self.state.y = y;
        }

        if pressed != self.state.pressed {
            // TODO: derive clickCount from press timing instead of always 1.
            let evt = if pressed {
                MouseEvent::pressed(x, y)
            } else {
                MouseEvent::released(x, y)
            };
            out.push(Action::Mouse(evt));
            self.state.pressed = pressed;
        }

        for (template, down) in new_keys {
            if down == self.state.is_key_pressed(&template.code) {
                continue;
            }
            let kind = if down {
                KeyEventType::KeyDown
            } else {
                KeyEventType::KeyUp
            };
            out.push(Action::Key(template.with_kind(kind)));
            self.state.keys.insert(template.code.clone(), down);
        }

        out
    }
}

/// Decorator applying an [`EventFilter`] to every step of the wrapped
/// environment. Only `reset` and `step` are intercepted.
pub struct FilteredEnv {
    inner: Box<dyn Env>,
    mode: EventFilter,
    delta: DeltaFilter,
}

impl FilteredEnv {
    pub fn new(inner: Box<dyn Env>, mode: EventFilter) -> Self {
        let delta = DeltaFilter::new(inner.spec());
        Self { inner, mode, delta }
    }

    pub fn mode(&self) -> EventFilter {
        self.mode
    }

    pub fn input_state(&self) -> &InputState {
        self.delta.state()
    }
}

/// Wrap `inner` so its events go through `mode`.
///
/// `NoFilter` returns `inner` unchanged. Closing the result closes `inner`.
pub fn filter_env(inner: Box<dyn Env>, mode: EventFilter) -> Box<dyn Env> {
    match mode {
        EventFilter::NoFilter => inner,
        EventFilter::DeltaFilter => Box::new(FilteredEnv::new(inner, mode)),
    }
}

impl Env for FilteredEnv {
    fn spec(&self) -> &EnvSpec {
        self.inner.spec()
    }

    fn reset(&mut self) -> Result<(), EnvError> {
        self.inner.reset()?;
        self.delta.reset(self.inner.spec());
        Ok(())
    }

    fn step(&mut self, frame_time: Duration, events: &[Action]) -> Result<StepResult, EnvError> {
        match self.mode {
            EventFilter::NoFilter => self.inner.step(frame_time, events),
            EventFilter::DeltaFilter => {
                let filtered = self.delta.filter(events);
                self.inner.step(frame_time, &filtered)
            }
        }
    }

    fn observe(&mut self) -> Result<Frame, EnvError> {
        self.inner.observe()
    }

    fn close(&mut self) -> Result<(), EnvError> {
        self.inner.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EngineKind;
    use std::sync::{Arc, Mutex};

    fn spec() -> EnvSpec {
        EnvSpec {
            name: "Filter-v0".to_string(),
            width: 100,
            height: 80,
            key_whitelist: None,
            engine: EngineKind::Target,
            episode_length: Duration::from_secs(10),
        }
    }

    fn key(kind: KeyEventType, code: &str) -> Action {
        Action::Key(KeyEvent::new(kind, code))
    }

    fn down(code: &str) -> Action {
        key(KeyEventType::KeyDown, code)
    }

    fn up(code: &str) -> Action {
        key(KeyEventType::KeyUp, code)
    }

    fn replay(start: &InputState, events: &[Action]) -> InputState {
        let mut s = start.clone();
        for e in events {
            s.apply(e);
        }
        s
    }

    fn assert_same_input(a: &InputState, b: &InputState) {
        assert_eq!((a.x, a.y, a.pressed), (b.x, b.y, b.pressed));
        assert_eq!(a.pressed_keys(), b.pressed_keys());
    }

    #[test]
    fn test_empty_batch_yields_nothing() {
        let mut f = DeltaFilter::new(&spec());
        assert!(f.filter(&[]).is_empty());
        assert_eq!(f.state(), &InputState::centered(&spec()));
    }

    #[test]
    fn test_move_and_key_down() {
        let mut f = DeltaFilter::new(&spec());
        let out = f.filter(&[Action::Mouse(MouseEvent::moved(10, 20)), down("KeyA")]);
        assert_eq!(
            out,
            vec![Action::Mouse(MouseEvent::moved(10, 20)), down("KeyA")]
        );
        assert!(f.filter(&[]).is_empty());
    }

    #[test]
    fn test_repeated_moves_collapse() {
        let mut f = DeltaFilter::new(&spec());
        let out = f.filter(&[
            Action::Mouse(MouseEvent::moved(1, 1)),
            Action::Mouse(MouseEvent::moved(7, 9)),
            Action::Mouse(MouseEvent::moved(7, 9)),
        ]);
        assert_eq!(out, vec![Action::Mouse(MouseEvent::moved(7, 9))]);
    }

    #[test]
    fn test_move_back_to_start_is_no_change() {
        let mut f = DeltaFilter::new(&spec());
        let out = f.filter(&[
            Action::Mouse(MouseEvent::moved(3, 3)),
            Action::Mouse(MouseEvent::moved(50, 40)),
        ]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_press_emits_move_with_button_then_press() {
        let mut f = DeltaFilter::new(&spec());
        let out = f.filter(&[Action::Mouse(MouseEvent::pressed(10, 20))]);
        let mut moved = MouseEvent::moved(10, 20);
        moved.button = Some(MouseButton::Left);
        assert_eq!(
            out,
            vec![
                Action::Mouse(moved),
                Action::Mouse(MouseEvent::pressed(10, 20)),
            ]
        );
        assert!(f.state().pressed);

        let out = f.filter(&[Action::Mouse(MouseEvent::released(10, 20))]);
        assert_eq!(out, vec![Action::Mouse(MouseEvent::released(10, 20))]);
        assert!(!f.state().pressed);
    }

    #[test]
    fn test_click_within_one_frame_is_dropped() {
        let mut f = DeltaFilter::new(&spec());
        let out = f.filter(&[
            Action::Mouse(MouseEvent::pressed(50, 40)),
            Action::Mouse(MouseEvent::released(50, 40)),
        ]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_key_tap_within_one_frame_is_dropped() {
        let mut f = DeltaFilter::new(&spec());
        assert!(f.filter(&[down("Space"), up("Space")]).is_empty());
        assert!(!f.state().is_key_pressed("Space"));
    }

    #[test]
    fn test_key_last_write_wins() {
        let mut f = DeltaFilter::new(&spec());
        let out = f.filter(&[down("KeyA"), up("KeyA"), down("KeyA")]);
        assert_eq!(out, vec![down("KeyA")]);

        let out = f.filter(&[down("KeyA")]);
        assert!(out.is_empty());

        let out = f.filter(&[up("KeyA")]);
        assert_eq!(out, vec![up("KeyA")]);
    }

    #[test]
    fn test_release_of_unknown_key_is_no_change() {
        let mut f = DeltaFilter::new(&spec());
        assert!(f.filter(&[up("KeyZ")]).is_empty());
    }

    #[test]
    fn test_synthetic_key_keeps_metadata() {
        let mut f = DeltaFilter::new(&spec());
        let mut raw = KeyEvent::new(KeyEventType::KeyDown, "KeyQ");
        raw.key = Some("q".to_string());
        raw.text = Some("q".to_string());
        let out = f.filter(&[Action::Key(raw.clone())]);
        assert_eq!(out, vec![Action::Key(raw)]);
    }

    #[test]
    fn test_same_batch_twice_is_idempotent() {
        let batch = vec![
            Action::Mouse(MouseEvent::moved(5, 6)),
            Action::Mouse(MouseEvent::pressed(8, 9)),
            down("ArrowLeft"),
            down("ArrowUp"),
            up("ArrowUp"),
        ];
        let mut f = DeltaFilter::new(&spec());
        assert!(!f.filter(&batch).is_empty());
        assert!(f.filter(&batch).is_empty());
    }

    #[test]
    fn test_replaying_synthetic_events_reproduces_final_state() {
        let frames: Vec<Vec<Action>> = vec![
            vec![
                Action::Mouse(MouseEvent::moved(1, 2)),
                down("KeyA"),
                down("KeyB"),
            ],
            vec![
                Action::Mouse(MouseEvent::pressed(3, 4)),
                Action::Mouse(MouseEvent::moved(30, 40)),
                up("KeyA"),
            ],
            vec![
                up("KeyB"),
                down("KeyC"),
                Action::Mouse(MouseEvent::released(30, 40)),
            ],
            vec![],
            vec![down("KeyC"), up("KeyC")],
        ];

        let mut f = DeltaFilter::new(&spec());
        for raw in &frames {
            let before = f.state().clone();
            let synthetic = f.filter(raw);
            let expected = replay(&before, raw);
            let observed = replay(&before, &synthetic);
            assert_same_input(&observed, &expected);
            assert_same_input(f.state(), &expected);
        }
    }

    // Records what reaches the engine.
    struct Recorder {
        spec: EnvSpec,
        seen: Arc<Mutex<Vec<Vec<Action>>>>,
    }

    impl Env for Recorder {
        fn spec(&self) -> &EnvSpec {
            &self.spec
        }

        fn reset(&mut self) -> Result<(), EnvError> {
            Ok(())
        }

        fn step(&mut self, _t: Duration, events: &[Action]) -> Result<StepResult, EnvError> {
            self.seen.lock().unwrap().push(events.to_vec());
            Ok(StepResult {
                reward: 0.0,
                done: false,
            })
        }

        fn observe(&mut self) -> Result<Frame, EnvError> {
            Ok(Frame::filled(self.spec.width, self.spec.height, [0, 0, 0]))
        }

        fn close(&mut self) -> Result<(), EnvError> {
            Ok(())
        }
    }

    fn recorder() -> (Box<dyn Env>, Arc<Mutex<Vec<Vec<Action>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let env = Recorder {
            spec: spec(),
            seen: Arc::clone(&seen),
        };
        (Box::new(env), seen)
    }

    #[test]
    fn test_filtered_env_forwards_deltas() {
        let (inner, seen) = recorder();
        let mut env = FilteredEnv::new(inner, EventFilter::DeltaFilter);
        env.reset().unwrap();

        let batch = [Action::Mouse(MouseEvent::moved(10, 20)), down("KeyA")];
        env.step(Duration::from_millis(100), &batch).unwrap();
        env.step(Duration::from_millis(100), &[]).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], batch.to_vec());
        assert!(seen[1].is_empty());
    }

    #[test]
    fn test_reset_recenters_pointer_and_clears_keys() {
        let (inner, _) = recorder();
        let mut env = FilteredEnv::new(inner, EventFilter::DeltaFilter);
        env.reset().unwrap();
        env.step(
            Duration::from_millis(100),
            &[Action::Mouse(MouseEvent::pressed(1, 1)), down("KeyA")],
        )
        .unwrap();
        assert!(env.input_state().pressed);

        env.reset().unwrap();
        assert_eq!(env.input_state(), &InputState::centered(&spec()));
    }

    #[test]
    fn test_no_filter_is_identity() {
        let (inner, seen) = recorder();
        let mut env = FilteredEnv::new(inner, EventFilter::NoFilter);
        let batch = [down("KeyA"), up("KeyA"), down("KeyA")];
        env.step(Duration::from_millis(100), &batch).unwrap();
        env.step(Duration::from_millis(100), &batch).unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], batch.to_vec());
        assert_eq!(seen[1], batch.to_vec());
        assert_eq!(env.input_state(), &InputState::centered(&spec()));
    }

    #[test]
    fn test_filter_env_no_filter_returns_inner() {
        let (inner, seen) = recorder();
        let mut env = filter_env(inner, EventFilter::NoFilter);
        env.step(Duration::from_millis(100), &[down("KeyA"), up("KeyA")])
            .unwrap();
        assert_eq!(seen.lock().unwrap()[0].len(), 2);
    }
}
