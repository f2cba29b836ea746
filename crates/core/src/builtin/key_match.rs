//! KeyMatch engine: a bar lights up one edge of the frame, and pressing the
//! arrow key pointing at it scores.

use std::time::Duration;

use super::canvas::{Canvas, Rgb, BACKGROUND};
use super::Episode;
use crate::env::{Env, StepResult};
use crate::error::EnvError;
use crate::rng::Lcg;
use crate::types::{Action, EnvSpec, Frame, KeyEventType, MouseEventType};

const PROMPT_COLOR: Rgb = Rgb::new(60, 200, 120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    const ALL: [Edge; 4] = [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom];

    fn code(self) -> &'static str {
        match self {
            Edge::Left => "ArrowLeft",
            Edge::Right => "ArrowRight",
            Edge::Top => "ArrowUp",
            Edge::Bottom => "ArrowDown",
        }
    }
}

pub struct KeyMatchEnv {
    spec: EnvSpec,
    episode: Episode,
    rng: Lcg,
    prompt: Edge,
    pointer: (i32, i32, bool),
    cursor: bool,
}

impl KeyMatchEnv {
    pub fn new(spec: EnvSpec, seed: u32, cursor: bool) -> Self {
        let (cx, cy) = spec.center();
        Self {
            episode: Episode::new(seed),
            rng: Lcg::new(seed),
            prompt: Edge::Left,
            pointer: (cx, cy, false),
            cursor,
            spec,
        }
    }

    fn next_prompt(&mut self) {
        self.prompt = Edge::ALL[self.rng.next_below(Edge::ALL.len() as u32) as usize];
    }
}

impl Env for KeyMatchEnv {
    fn spec(&self) -> &EnvSpec {
        &self.spec
    }

    fn reset(&mut self) -> Result<(), EnvError> {
        let seed = self.episode.begin()?;
        self.rng = Lcg::new(seed);
        let (cx, cy) = self.spec.center();
        self.pointer = (cx, cy, false);
        self.next_prompt();
        Ok(())
    }

    fn step(&mut self, frame_time: Duration, events: &[Action]) -> Result<StepResult, EnvError> {
        self.episode.check_running()?;
        let mut reward = 0.0;
        for evt in events {
            match evt {
                Action::Key(k) => {
                    if k.kind != KeyEventType::KeyDown || !self.spec.accepts_key(&k.code) {
                        continue;
                    }
                    if k.code == self.prompt.code() {
                        reward += 1.0;
                        self.next_prompt();
                    } else {
                        reward -= 1.0;
                    }
                }
                Action::Mouse(m) => {
                    self.pointer.0 = m.x;
                    self.pointer.1 = m.y;
                    match m.kind {
                        MouseEventType::Pressed => self.pointer.2 = true,
                        MouseEventType::Released => self.pointer.2 = false,
                        MouseEventType::Moved => {}
                    }
                }
            }
        }
        let done = self.episode.advance(frame_time, self.spec.episode_length);
        Ok(StepResult { reward, done })
    }

    fn observe(&mut self) -> Result<Frame, EnvError> {
        self.episode.check_open()?;
        let (w, h) = (self.spec.width, self.spec.height);
        let bar = (w.min(h) / 10).max(1);
        let mut canvas = Canvas::new(w, h, BACKGROUND);
        match self.prompt {
            Edge::Left => canvas.fill_rect(0, 0, bar, h, PROMPT_COLOR),
            Edge::Right => canvas.fill_rect((w - bar) as i32, 0, bar, h, PROMPT_COLOR),
            Edge::Top => canvas.fill_rect(0, 0, w, bar, PROMPT_COLOR),
            Edge::Bottom => canvas.fill_rect(0, (h - bar) as i32, w, bar, PROMPT_COLOR),
        }
        if self.cursor {
            let (x, y, pressed) = self.pointer;
            canvas.draw_cursor(x, y, pressed);
        }
        Ok(canvas.into_frame())
    }

    fn close(&mut self) -> Result<(), EnvError> {
        self.episode.close()
    }
}
