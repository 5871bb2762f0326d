use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

/// Framebuffer as shared between the tick thread and the renderer
pub type SharedFramebuffer = Arc<Mutex<Framebuffer>>;

/// lock a shared framebuffer; a panicked holder can't leave the grid in a
/// state worse than "some pixels are stale", so poisoning is ignored
pub fn lock(fb: &SharedFramebuffer) -> MutexGuard<'_, Framebuffer> {
    fb.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 64x32 monochrome pixel grid, plus what the renderer needs to know about
/// which cells changed since it last looked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    pixels: [[bool; SCREEN_WIDTH]; SCREEN_HEIGHT],
    dirty: [[bool; SCREEN_WIDTH]; SCREEN_HEIGHT],
    full_redraw: bool,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framebuffer {
    pub fn new() -> Self {
        Framebuffer {
            pixels: [[false; SCREEN_WIDTH]; SCREEN_HEIGHT],
            dirty: [[false; SCREEN_WIDTH]; SCREEN_HEIGHT],
            full_redraw: false,
        }
    }

    pub fn shared() -> SharedFramebuffer {
        Arc::new(Mutex::new(Self::new()))
    }

    fn in_bounds(x: usize, y: usize) -> bool {
        x < SCREEN_WIDTH && y < SCREEN_HEIGHT
    }

    /// XOR the pixel; returns what it was before so the caller can spot a
    /// collision. Off-screen is a no-op and reads as off.
    pub fn toggle_pixel(&mut self, x: usize, y: usize) -> bool {
        if !Self::in_bounds(x, y) {
            return false;
        }
        let prev = self.pixels[y][x];
        self.pixels[y][x] = !prev;
        prev
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        Self::in_bounds(x, y) && self.pixels[y][x]
    }

    /// flag a cell for repaint; setting twice is the same as setting once
    pub fn mark_dirty(&mut self, x: usize, y: usize) {
        if Self::in_bounds(x, y) {
            self.dirty[y][x] = true;
        }
    }

    pub fn clear_dirty(&mut self, x: usize, y: usize) {
        if Self::in_bounds(x, y) {
            self.dirty[y][x] = false;
        }
    }

    pub fn is_dirty(&self, x: usize, y: usize) -> bool {
        Self::in_bounds(x, y) && self.dirty[y][x]
    }

    /// blank everything, including the repaint bookkeeping
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn set_full_redraw(&mut self, full_redraw: bool) {
        self.full_redraw = full_redraw;
    }

    pub fn is_full_redraw(&self) -> bool {
        self.full_redraw
    }

    /// The renderer's per-frame pass: hands `paint` every cell that needs
    /// repainting along with its current value, clearing the cell's dirty flag
    /// as it goes and the full-redraw flag at the end. Returns how many cells
    /// were painted.
    pub fn sweep(&mut self, mut paint: impl FnMut(usize, usize, bool)) -> usize {
        let mut painted = 0;
        for y in 0..SCREEN_HEIGHT {
            for x in 0..SCREEN_WIDTH {
                if self.full_redraw || self.dirty[y][x] {
                    paint(x, y, self.pixels[y][x]);
                    self.dirty[y][x] = false;
                    painted += 1;
                }
            }
        }
        self.full_redraw = false;
        painted
    }

    /// how many pixels are lit
    pub fn lit(&self) -> usize {
        self.pixels.iter().flatten().filter(|p| **p).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_returns_previous() {
        let mut fb = Framebuffer::new();
        assert!(!fb.toggle_pixel(3, 4));
        assert!(fb.pixel(3, 4));
        assert!(fb.toggle_pixel(3, 4));
        assert!(!fb.pixel(3, 4));
    }

    #[test]
    fn test_out_of_range_is_noop() {
        let mut fb = Framebuffer::new();
        assert!(!fb.toggle_pixel(64, 0));
        assert!(!fb.toggle_pixel(0, 32));
        fb.mark_dirty(64, 31);
        assert!(!fb.pixel(64, 0));
        assert!(!fb.is_dirty(64, 31));
        assert_eq!(fb, Framebuffer::new());
    }

    #[test]
    fn test_mark_dirty_is_idempotent() {
        let mut fb = Framebuffer::new();
        fb.mark_dirty(10, 10);
        fb.mark_dirty(10, 10);
        assert!(fb.is_dirty(10, 10));
        fb.clear_dirty(10, 10);
        assert!(!fb.is_dirty(10, 10));
    }

    #[test]
    fn test_clear() {
        let mut fb = Framebuffer::new();
        fb.toggle_pixel(0, 0);
        fb.mark_dirty(0, 0);
        fb.set_full_redraw(true);
        fb.clear();
        assert!(!fb.pixel(0, 0));
        assert!(!fb.is_dirty(0, 0));
        assert!(!fb.is_full_redraw());
    }

    #[test]
    fn test_sweep_dirty_only() {
        let mut fb = Framebuffer::new();
        fb.toggle_pixel(1, 2);
        fb.mark_dirty(1, 2);
        fb.mark_dirty(5, 5);
        let mut seen = Vec::new();
        assert_eq!(fb.sweep(|x, y, on| seen.push((x, y, on))), 2);
        assert_eq!(seen, vec![(1, 2, true), (5, 5, false)]);
        // nothing left to do on the next frame
        assert_eq!(fb.sweep(|_, _, _| {}), 0);
    }

    #[test]
    fn test_sweep_full_redraw() {
        let mut fb = Framebuffer::new();
        fb.toggle_pixel(63, 31);
        fb.set_full_redraw(true);
        let mut lit = 0;
        let painted = fb.sweep(|_, _, on| lit += on as usize);
        assert_eq!(painted, SCREEN_WIDTH * SCREEN_HEIGHT);
        assert_eq!(lit, 1);
        assert!(!fb.is_full_redraw());
    }

    #[test]
    fn test_lit() {
        let mut fb = Framebuffer::new();
        fb.toggle_pixel(0, 0);
        fb.toggle_pixel(1, 0);
        assert_eq!(fb.lit(), 2);
    }
}
