//! Pixel canvas the built-in engines render into.

use crate::types::{Frame, FRAME_CHANNELS};

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

pub const BACKGROUND: Rgb = Rgb::new(24, 24, 32);
pub const CURSOR: Rgb = Rgb::new(255, 255, 255);
pub const CURSOR_PRESSED: Rgb = Rgb::new(255, 210, 0);

/// RGB framebuffer with clipped drawing primitives.
#[derive(Debug, Clone)]
pub struct Canvas {
    frame: Frame,
}

impl Canvas {
    pub fn new(width: u32, height: u32, bg: Rgb) -> Self {
        Self {
            frame: Frame::filled(width, height, bg.to_array()),
        }
    }

    #[inline(always)]
    fn idx(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.frame.width || y as u32 >= self.frame.height {
            return None;
        }
        Some(((y as usize) * (self.frame.width as usize) + (x as usize)) * FRAME_CHANNELS)
    }

    pub fn set(&mut self, x: i32, y: i32, color: Rgb) {
        if let Some(i) = self.idx(x, y) {
            self.frame.pixels[i..i + FRAME_CHANNELS].copy_from_slice(&color.to_array());
        }
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgb) {
        for dy in 0..h as i32 {
            for dx in 0..w as i32 {
                self.set(x.saturating_add(dx), y.saturating_add(dy), color);
            }
        }
    }

    /// Small crosshair centered on the pointer.
    pub fn draw_cursor(&mut self, x: i32, y: i32, pressed: bool) {
        let color = if pressed { CURSOR_PRESSED } else { CURSOR };
        for d in -2..=2 {
            self.set(x + d, y, color);
            self.set(x, y + d, color);
        }
    }

    pub fn into_frame(self) -> Frame {
        self.frame
    }
}
