//! Target engine: press the pointer on the square to score.

use std::time::Duration;

use super::canvas::{Canvas, Rgb, BACKGROUND};
use super::Episode;
use crate::env::{Env, StepResult};
use crate::error::EnvError;
use crate::rng::Lcg;
use crate::types::{Action, EnvSpec, Frame, MouseEventType};

const TARGET_COLOR: Rgb = Rgb::new(220, 60, 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Square {
    x: i32,
    y: i32,
    size: u32,
}

impl Square {
    fn contains(&self, x: i32, y: i32) -> bool {
        let s = self.size as i32;
        x >= self.x && x < self.x + s && y >= self.y && y < self.y + s
    }
}

pub struct TargetEnv {
    spec: EnvSpec,
    episode: Episode,
    rng: Lcg,
    target: Square,
    pointer: (i32, i32, bool),
    cursor: bool,
}

impl TargetEnv {
    pub fn new(spec: EnvSpec, seed: u32, cursor: bool) -> Self {
        let (cx, cy) = spec.center();
        let size = target_size(&spec);
        Self {
            episode: Episode::new(seed),
            rng: Lcg::new(seed),
            target: Square {
                x: cx,
                y: cy,
                size,
            },
            pointer: (cx, cy, false),
            cursor,
            spec,
        }
    }

    fn place_target(&mut self) {
        let size = self.target.size;
        let x = self.rng.next_below(self.spec.width.saturating_sub(size).max(1));
        let y = self.rng.next_below(self.spec.height.saturating_sub(size).max(1));
        self.target.x = x as i32;
        self.target.y = y as i32;
    }
}

fn target_size(spec: &EnvSpec) -> u32 {
    (spec.width.min(spec.height) / 8).max(2)
}

impl Env for TargetEnv {
    fn spec(&self) -> &EnvSpec {
        &self.spec
    }

    fn reset(&mut self) -> Result<(), EnvError> {
        let seed = self.episode.begin()?;
        self.rng = Lcg::new(seed);
        let (cx, cy) = self.spec.center();
        self.pointer = (cx, cy, false);
        self.place_target();
        Ok(())
    }

    fn step(&mut self, frame_time: Duration, events: &[Action]) -> Result<StepResult, EnvError> {
        self.episode.check_running()?;
        let mut reward = 0.0;
        for evt in events {
            let Action::Mouse(m) = evt else {
                continue;
            };
            self.pointer.0 = m.x;
            self.pointer.1 = m.y;
            match m.kind {
                MouseEventType::Pressed => {
                    self.pointer.2 = true;
                    if self.target.contains(m.x, m.y) {
                        reward += 1.0;
                        self.place_target();
                    }
                }
                MouseEventType::Released => self.pointer.2 = false,
                MouseEventType::Moved => {}
            }
        }
        let done = self.episode.advance(frame_time, self.spec.episode_length);
        Ok(StepResult { reward, done })
    }

    fn observe(&mut self) -> Result<Frame, EnvError> {
        self.episode.check_open()?;
        let mut canvas = Canvas::new(self.spec.width, self.spec.height, BACKGROUND);
        let t = self.target;
        canvas.fill_rect(t.x, t.y, t.size, t.size, TARGET_COLOR);
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
