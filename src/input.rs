//! Host input for the background.
//!
//! `Input` turns raw winit window events into the three things the scene
//! cares about: where the user clicked (in normalized device coordinates),
//! how far the page has been scrolled, and the current window size.
//!
//! # Usage
//!
//! ```ignore
//! // In the winit event handler:
//! input.handle_event(&event);
//!
//! // Once per frame:
//! scene.handle_input(&mut input);
//! scene.frame(dt);
//! input.begin_frame();
//! ```

use glam::Vec2;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};

/// Pixels scrolled per wheel line.
pub const LINE_SCROLL_PX: f32 = 40.0;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other,
}

impl From<WinitMouseButton> for MouseButton {
    fn from(btn: WinitMouseButton) -> Self {
        match btn {
            WinitMouseButton::Left => MouseButton::Left,
            WinitMouseButton::Right => MouseButton::Right,
            WinitMouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Other,
        }
    }
}

/// Accumulated input state between frames.
#[derive(Debug, Clone)]
pub struct Input {
    window_size: (u32, u32),
    cursor_position: Vec2,
    cursor_ndc: Vec2,
    /// Left clicks since the last drain, in NDC.
    clicks: Vec<Vec2>,
    /// Page scroll in pixels, never negative.
    scroll_px: f32,
    /// Set when the window was resized since the last frame.
    resized: bool,
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}

impl Input {
    pub fn new() -> Self {
        Self {
            window_size: (800, 600),
            cursor_position: Vec2::ZERO,
            cursor_ndc: Vec2::ZERO,
            clicks: Vec::new(),
            scroll_px: 0.0,
            resized: false,
        }
    }

    // ========== Queries ==========

    /// Window size in physical pixels.
    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    /// Width over height; 1.0 for a degenerate window.
    pub fn aspect(&self) -> f32 {
        let (w, h) = self.window_size;
        if w == 0 || h == 0 {
            1.0
        } else {
            w as f32 / h as f32
        }
    }

    /// Cursor position in screen pixels.
    pub fn cursor_position(&self) -> Vec2 {
        self.cursor_position
    }

    /// Cursor in normalized device coordinates (-1 to 1, y up).
    pub fn cursor_ndc(&self) -> Vec2 {
        self.cursor_ndc
    }

    /// Page scroll offset in pixels.
    pub fn scroll_px(&self) -> f32 {
        self.scroll_px
    }

    /// Whether the window was resized since the last [`begin_frame`](Self::begin_frame).
    pub fn was_resized(&self) -> bool {
        self.resized
    }

    /// Take all left clicks recorded since the last drain, oldest first.
    pub fn drain_clicks(&mut self) -> Vec<Vec2> {
        std::mem::take(&mut self.clicks)
    }

    // ========== Event Handling ==========

    /// Clear per-frame flags. Call after the scene consumed the input.
    pub fn begin_frame(&mut self) {
        self.resized = false;
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::Resized(size) => self.set_window_size(size.width, size.height),

            WindowEvent::CursorMoved { position, .. } => {
                self.move_cursor(Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if *state == ElementState::Pressed {
                    self.press(MouseButton::from(*button));
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let pixels = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y * LINE_SCROLL_PX,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                };
                // Wheel up (positive) scrolls the page back toward the top.
                self.scroll_by(-pixels);
            }

            _ => {}
        }
    }

    pub(crate) fn set_window_size(&mut self, width: u32, height: u32) {
        if self.window_size != (width, height) {
            self.window_size = (width, height);
            self.resized = true;
            self.cursor_ndc = self.to_ndc(self.cursor_position);
        }
    }

    pub(crate) fn move_cursor(&mut self, position: Vec2) {
        self.cursor_position = position;
        self.cursor_ndc = self.to_ndc(position);
    }

    pub(crate) fn press(&mut self, button: MouseButton) {
        if button == MouseButton::Left {
            self.clicks.push(self.cursor_ndc);
        }
    }

    pub(crate) fn scroll_by(&mut self, pixels: f32) {
        self.scroll_px = (self.scroll_px + pixels).max(0.0);
    }

    fn to_ndc(&self, position: Vec2) -> Vec2 {
        let (w, h) = self.window_size;
        if w == 0 || h == 0 {
            return Vec2::ZERO;
        }
        Vec2::new(
            (position.x / w as f32) * 2.0 - 1.0,
            1.0 - (position.y / h as f32) * 2.0, // Y flipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_ndc() {
        let mut input = Input::new();
        input.set_window_size(800, 600);

        input.move_cursor(Vec2::new(400.0, 300.0));
        assert!(input.cursor_ndc().length() < 1e-6);

        input.move_cursor(Vec2::new(800.0, 0.0));
        assert_eq!(input.cursor_ndc(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_only_left_clicks_are_recorded() {
        let mut input = Input::new();
        input.move_cursor(Vec2::new(0.0, 600.0));

        input.press(MouseButton::Right);
        input.press(MouseButton::Left);
        assert_eq!(input.drain_clicks(), vec![Vec2::new(-1.0, -1.0)]);
        assert!(input.drain_clicks().is_empty());
    }

    #[test]
    fn test_scroll_never_negative() {
        let mut input = Input::new();
        input.scroll_by(120.0);
        input.scroll_by(-40.0);
        assert_eq!(input.scroll_px(), 80.0);
        input.scroll_by(-500.0);
        assert_eq!(input.scroll_px(), 0.0);
    }

    #[test]
    fn test_resize_flag() {
        let mut input = Input::new();
        input.set_window_size(800, 600);
        assert!(!input.was_resized());

        input.set_window_size(1920, 1080);
        assert!(input.was_resized());
        assert!((input.aspect() - 16.0 / 9.0).abs() < 1e-6);

        input.begin_frame();
        assert!(!input.was_resized());
    }

    #[test]
    fn test_resized_event() {
        use winit::dpi::PhysicalSize;

        let mut input = Input::new();
        input.move_cursor(Vec2::new(400.0, 300.0));

        input.handle_event(&WindowEvent::Resized(PhysicalSize::new(1600, 1200)));
        assert_eq!(input.window_size(), (1600, 1200));
        assert!(input.was_resized());
        // Same pixel position is now in the upper-left quadrant.
        assert!((input.cursor_ndc() - Vec2::new(-0.5, 0.5)).length() < 1e-6);
    }
}
