use std::io;

use tui::backend::{Backend, CrosstermBackend};
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

use crate::framebuffer::{self, Framebuffer, SharedFramebuffer, SCREEN_HEIGHT, SCREEN_WIDTH};

type Screen = [[bool; SCREEN_WIDTH]; SCREEN_HEIGHT];

/// Display is used to put the framebuffer on a screen. It should abstract the
/// implementation details, so a variety of kinds of screen would work.
pub trait Display {
    /// copy across the cells the framebuffer says need repainting, clearing
    /// its flags as it goes; returns how many cells were copied
    fn update(&mut self, fb: &mut Framebuffer) -> usize;

    /// put the current picture on screen
    fn render(&mut self) -> io::Result<()>;

    /// one frame. The framebuffer is only locked while copying, never while
    /// talking to the screen.
    fn present(&mut self, fb: &SharedFramebuffer) -> io::Result<()> {
        let changed = self.update(&mut framebuffer::lock(fb));
        if changed > 0 {
            self.render()
        } else {
            Ok(())
        }
    }
}

// store useful metadata about the terminal
struct Resolution(usize, usize);

impl Resolution {
    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// canvas size including the border; clipped to the terminal at draw time
    fn area(&self) -> Rect {
        Rect::new(0, 0, 2 + self.0 as u16, 2 + self.1 as u16)
    }

    /// lit cells as canvas coordinates; y grows downwards on the chip8
    fn lit_points(&self, screen: &Screen) -> Vec<(f64, f64)> {
        screen
            .iter()
            .enumerate()
            .flat_map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, on)| **on)
                    .map(move |(x, _)| (x as f64, -1.0 * y as f64))
            })
            .collect()
    }
}

/// monochrome display in a terminal, rendered using TUI
pub struct TermDisplay<B: Backend> {
    terminal: Terminal<B>,
    resolution: Resolution,
    screen: Screen,
    title: String,
}

/// the real thing, on stdout
pub type MonoTermDisplay = TermDisplay<CrosstermBackend<io::Stdout>>;

impl MonoTermDisplay {
    pub fn new() -> io::Result<MonoTermDisplay> {
        TermDisplay::with_backend(CrosstermBackend::new(io::stdout()))
    }
}

impl<B: Backend> TermDisplay<B> {
    pub fn with_backend(backend: B) -> io::Result<Self> {
        let terminal = Terminal::new(backend)?;
        Ok(TermDisplay {
            terminal,
            resolution: Resolution(SCREEN_WIDTH, SCREEN_HEIGHT),
            screen: [[false; SCREEN_WIDTH]; SCREEN_HEIGHT],
            title: String::from("CHIP-8"),
        })
    }

    /// shown in the border; takes effect on the next render
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < SCREEN_WIDTH && y < SCREEN_HEIGHT && self.screen[y][x]
    }
}

impl<B: Backend> Display for TermDisplay<B> {
    fn update(&mut self, fb: &mut Framebuffer) -> usize {
        let screen = &mut self.screen;
        fb.sweep(|x, y, on| screen[y][x] = on)
    }

    fn render(&mut self) -> io::Result<()> {
        let coords = self.resolution.lit_points(&self.screen);
        let area = self.resolution.area();
        let x_bounds = self.resolution.x_bounds();
        let y_bounds = self.resolution.y_bounds();
        let title = self.title.as_str();

        // for now this assumes a 1:1 ratio between terminal cells and chip8
        // pixels
        self.terminal.draw(|f| {
            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title(title)
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(x_bounds)
                .y_bounds(y_bounds)
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &coords,
                        color: Color::White,
                    });
                });
            let area = area.intersection(f.size());
            f.render_widget(canvas, area);
        })?;
        Ok(())
    }
}

/// useful for testing non-display routines
#[derive(Debug, Default)]
pub struct DummyDisplay {
    pub screen: Vec<(usize, usize, bool)>,
    pub renders: usize,
}

impl DummyDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Display for DummyDisplay {
    fn update(&mut self, fb: &mut Framebuffer) -> usize {
        let painted = &mut self.screen;
        fb.sweep(|x, y, on| painted.push((x, y, on)))
    }

    fn render(&mut self) -> io::Result<()> {
        self.renders += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tui::backend::TestBackend;

    #[test]
    fn test_x_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.x_bounds(), [0.0, 63.0]);
    }

    #[test]
    fn test_y_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.y_bounds(), [-31.0, 0.0]);
    }

    #[test]
    fn test_lit_points() {
        let r = Resolution(64, 32);
        let mut screen = [[false; SCREEN_WIDTH]; SCREEN_HEIGHT];
        screen[0][0] = true;
        screen[3][5] = true;
        assert_eq!(r.lit_points(&screen), vec![(0.0, 0.0), (5.0, -3.0)]);
    }

    #[test]
    fn test_present_skips_unchanged_frames() -> io::Result<()> {
        let fb = Framebuffer::shared();
        let mut d = DummyDisplay::new();
        d.present(&fb)?;
        assert_eq!(d.renders, 0);

        {
            let mut f = framebuffer::lock(&fb);
            f.toggle_pixel(2, 3);
            f.mark_dirty(2, 3);
        }
        d.present(&fb)?;
        assert_eq!(d.renders, 1);
        assert_eq!(d.screen, vec![(2, 3, true)]);
        assert!(!framebuffer::lock(&fb).is_dirty(2, 3));
        Ok(())
    }

    #[test]
    fn test_full_redraw_repaints_everything() -> io::Result<()> {
        let fb = Framebuffer::shared();
        framebuffer::lock(&fb).set_full_redraw(true);
        let mut d = DummyDisplay::new();
        d.present(&fb)?;
        assert_eq!(d.screen.len(), SCREEN_WIDTH * SCREEN_HEIGHT);
        assert!(!framebuffer::lock(&fb).is_full_redraw());
        Ok(())
    }

    #[test]
    fn test_term_display_mirrors_framebuffer() -> io::Result<()> {
        let mut d = TermDisplay::with_backend(TestBackend::new(66, 34))?;
        let mut fb = Framebuffer::new();
        fb.toggle_pixel(10, 20);
        fb.mark_dirty(10, 20);
        assert_eq!(d.update(&mut fb), 1);
        assert!(d.pixel(10, 20));
        d.render()?;

        // turning it off again only repaints that cell
        fb.toggle_pixel(10, 20);
        fb.mark_dirty(10, 20);
        assert_eq!(d.update(&mut fb), 1);
        assert!(!d.pixel(10, 20));
        d.render()
    }

    #[test]
    fn test_term_display_title() -> io::Result<()> {
        let mut d = TermDisplay::with_backend(TestBackend::new(66, 34))?;
        d.set_title("CHIP-8 [paused]");
        d.render()?;
        let buffer = d.terminal().backend().buffer();
        let top: String = (1..16).map(|x| buffer.get(x, 0).symbol.clone()).collect();
        assert_eq!(top, "CHIP-8 [paused]");
        Ok(())
    }
}
