//! Player: the interactive terminal front end.
//!
//! Drives the engine at a fixed cadence, turns keyboard and mouse events
//! into `Control`s between frames, and writes each finished grid to the
//! terminal. Only cells that changed since the last frame are sent.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::{cursor, execute, queue, style, terminal};
use tracing::{debug, info};

use crate::camera::Control;
use crate::config::{matches_binding, ViewerConfig};
use crate::engine::Engine;
use crate::menubar::render_menubar;
use crate::renderer::FrameBuffer;
use crate::types::{Cell, Color, GridSize, NamedColor, Style};

/// Rows reserved above the canvas for the menu bar.
const CANVAS_OFFSET: u16 = 1;
/// Menu bar plus status bar.
const CHROME_ROWS: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Continue,
    Redraw,
    Quit,
}

/// A mouse button held down, and where the pointer was last seen.
#[derive(Debug, Clone, Copy)]
struct Drag {
    button: MouseButton,
    column: u16,
    row: u16,
}

pub struct Player {
    engine: Engine,
    config: ViewerConfig,
    /// What the terminal currently shows.
    shown: FrameBuffer,
    needs_full: bool,
    drag: Option<Drag>,
}

pub fn canvas_size(term_w: u16, term_h: u16) -> GridSize {
    GridSize::new(term_w, term_h.saturating_sub(CHROME_ROWS))
}

impl Player {
    pub fn new(engine: Engine, config: ViewerConfig) -> Self {
        let size = engine.buffer().size();
        Self {
            engine,
            config,
            shown: FrameBuffer::new(size),
            needs_full: true,
            drag: None,
        }
    }

    /// Run until the user quits.
    ///
    /// Sets up the terminal, enters the frame loop, and restores the terminal
    /// on exit (even on error).
    pub fn play(&mut self) -> Result<()> {
        let (term_w, term_h) = terminal::size()?;
        self.engine.resize(canvas_size(term_w, term_h));

        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            event::EnableMouseCapture,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All),
        )?;

        let result = self.run_loop(&mut stdout);

        // Always restore terminal state.
        let _ = execute!(
            stdout,
            event::DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();

        result
    }

    // -----------------------------------------------------------------------
    // Frame loop
    // -----------------------------------------------------------------------

    fn run_loop(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        let fps = self.config.display.target_fps.max(1);
        let frame_budget = Duration::from_secs_f64(1.0 / f64::from(fps));
        info!(fps, "entering frame loop");

        loop {
            let deadline = Instant::now() + frame_budget;

            self.engine.render_frame(Instant::now());
            self.present(stdout)?;

            // Sleep out the rest of the frame, waking for input.
            loop {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                if !event::poll(deadline - now)? {
                    break;
                }
                match self.handle_event(event::read()?) {
                    Action::Quit => return Ok(()),
                    Action::Redraw => self.needs_full = true,
                    Action::Continue => {}
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    fn handle_event(&mut self, event: Event) -> Action {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key),
            Event::Mouse(mouse) => {
                self.handle_mouse(mouse);
                Action::Continue
            }
            Event::Resize(w, h) => {
                debug!(w, h, "terminal resized");
                self.engine.resize(canvas_size(w, h));
                Action::Redraw
            }
            _ => Action::Continue,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        let kb = &self.config.key_bindings;
        let step = self.config.input;

        if matches_binding(&kb.quit, &key) || matches_binding("Esc", &key) {
            return Action::Quit;
        }
        if matches_binding(&kb.reset_camera, &key) {
            self.engine.camera = self.config.camera;
            return Action::Continue;
        }

        let bindings = [
            (kb.toggle_culling.as_str(), Control::ToggleCulling),
            (kb.toggle_ground.as_str(), Control::ToggleGround),
            (kb.toggle_depth_test.as_str(), Control::ToggleDepthTest),
            (kb.toggle_fill.as_str(), Control::ToggleFill),
            (kb.rotate_left.as_str(), Control::Rotate { d_yaw: step.key_rotate, d_pitch: 0.0 }),
            (kb.rotate_right.as_str(), Control::Rotate { d_yaw: -step.key_rotate, d_pitch: 0.0 }),
            (kb.rotate_up.as_str(), Control::Rotate { d_yaw: 0.0, d_pitch: step.key_rotate }),
            (kb.rotate_down.as_str(), Control::Rotate { d_yaw: 0.0, d_pitch: -step.key_rotate }),
            (kb.pan_left.as_str(), Control::Pan { dx: step.key_pan, dy: 0.0 }),
            (kb.pan_right.as_str(), Control::Pan { dx: -step.key_pan, dy: 0.0 }),
            (kb.pan_up.as_str(), Control::Pan { dx: 0.0, dy: -step.key_pan }),
            (kb.pan_down.as_str(), Control::Pan { dx: 0.0, dy: step.key_pan }),
            (kb.zoom_in.as_str(), Control::Zoom(-step.key_zoom)),
            (kb.zoom_out.as_str(), Control::Zoom(step.key_zoom)),
        ];

        let hit = bindings
            .into_iter()
            .find(|(binding, _)| matches_binding(binding, &key));
        if let Some((_, control)) = hit {
            self.engine.apply(control);
        }
        Action::Continue
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let sens = self.config.input;
        match mouse.kind {
            MouseEventKind::Down(button) => {
                self.drag = Some(Drag {
                    button,
                    column: mouse.column,
                    row: mouse.row,
                });
            }
            MouseEventKind::Up(_) => self.drag = None,
            MouseEventKind::Drag(_) => {
                let Some(drag) = self.drag.as_mut() else {
                    return;
                };
                let dx = f64::from(mouse.column) - f64::from(drag.column);
                let dy = f64::from(mouse.row) - f64::from(drag.row);
                drag.column = mouse.column;
                drag.row = mouse.row;
                let control = match drag.button {
                    MouseButton::Middle => Control::Pan {
                        dx: -dx * sens.drag_pan,
                        dy: dy * sens.drag_pan,
                    },
                    _ => Control::Rotate {
                        d_yaw: -dx * sens.drag_rotate,
                        d_pitch: -dy * sens.drag_rotate,
                    },
                };
                self.engine.apply(control);
            }
            MouseEventKind::ScrollDown => self.engine.apply(Control::Zoom(sens.scroll_zoom)),
            MouseEventKind::ScrollUp => self.engine.apply(Control::Zoom(-sens.scroll_zoom)),
            _ => {}
        }
    }

    // -----------------------------------------------------------------------
    // Terminal output
    // -----------------------------------------------------------------------

    fn present(&mut self, stdout: &mut io::Stdout) -> Result<()> {
        if self.needs_full || self.shown.size() != self.engine.buffer().size() {
            queue!(stdout, terminal::Clear(terminal::ClearType::All))?;
            self.render_menu(stdout)?;
            self.render_full(stdout)?;
            self.needs_full = false;
        } else {
            self.render_diff(stdout)?;
        }
        self.render_status(stdout)?;
        stdout.flush()?;
        self.shown.copy_from(self.engine.buffer());
        Ok(())
    }

    fn render_menu(&self, stdout: &mut io::Stdout) -> Result<()> {
        let kb = &self.config.key_bindings;
        let items = [
            format!("[{}] quit", kb.quit),
            "[drag] rotate".to_string(),
            "[mid-drag] pan".to_string(),
            "[wheel] zoom".to_string(),
            format!("[{}] cull", kb.toggle_culling),
            format!("[{}] wire", kb.toggle_fill),
            format!("[{}] depth", kb.toggle_depth_test),
            format!("[{}] floor", kb.toggle_ground),
            format!("[{}] reset", kb.reset_camera),
        ];
        queue!(stdout, cursor::MoveTo(0, 0))?;
        render_menubar(stdout, &items)
    }

    fn render_full(&self, stdout: &mut io::Stdout) -> Result<()> {
        let buffer = self.engine.buffer();
        for y in 0..buffer.size().height {
            queue!(stdout, cursor::MoveTo(0, y + CANVAS_OFFSET))?;
            let Some(row) = buffer.row(y as usize) else {
                break;
            };
            for cell in row {
                print_cell(stdout, cell)?;
            }
        }
        Ok(())
    }

    fn render_diff(&self, stdout: &mut io::Stdout) -> Result<()> {
        for change in self.engine.buffer().diff(&self.shown) {
            queue!(stdout, cursor::MoveTo(change.x, change.y + CANVAS_OFFSET))?;
            print_cell(stdout, &change.cell)?;
        }
        Ok(())
    }

    fn render_status(&self, stdout: &mut io::Stdout) -> Result<()> {
        let status_y = self.engine.buffer().size().height + CANVAS_OFFSET;
        let (term_w, term_h) = terminal::size()?;
        if status_y >= term_h {
            return Ok(()); // No room for status bar.
        }

        let status: String = format!(" {}", self.engine.diagnostics())
            .chars()
            .take(term_w as usize)
            .collect();

        let mut cs = style::ContentStyle::default();
        cs.attributes.set(style::Attribute::Dim);

        queue!(
            stdout,
            cursor::MoveTo(0, status_y),
            terminal::Clear(terminal::ClearType::CurrentLine),
            style::PrintStyledContent(style::StyledContent::new(cs, status)),
        )?;
        Ok(())
    }
}

fn print_cell(stdout: &mut io::Stdout, cell: &Cell) -> Result<()> {
    let cs = to_content_style(&cell.style);
    queue!(
        stdout,
        style::PrintStyledContent(style::StyledContent::new(cs, cell.ch))
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Style conversion
// ---------------------------------------------------------------------------

pub fn to_content_style(s: &Style) -> style::ContentStyle {
    let mut cs = style::ContentStyle::default();
    if let Some(fg) = &s.fg {
        cs.foreground_color = Some(to_ct_color(fg));
    }
    if s.bold {
        cs.attributes.set(style::Attribute::Bold);
    }
    if s.dim {
        cs.attributes.set(style::Attribute::Dim);
    }
    cs
}

pub fn to_ct_color(c: &Color) -> style::Color {
    match c {
        Color::Named(n) => match n {
            NamedColor::Black => style::Color::Black,
            NamedColor::Red => style::Color::Red,
            NamedColor::Green => style::Color::Green,
            NamedColor::Yellow => style::Color::Yellow,
            NamedColor::Blue => style::Color::Blue,
            NamedColor::Magenta => style::Color::Magenta,
            NamedColor::Cyan => style::Color::Cyan,
            NamedColor::White => style::Color::White,
        },
        Color::Rgb { r, g, b } => style::Color::Rgb {
            r: *r,
            g: *g,
            b: *b,
        },
    }
}
