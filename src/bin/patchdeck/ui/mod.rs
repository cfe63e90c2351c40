//! Control surface for a live rig.
//!
//! Keyboard model: Up/Down move focus, Left/Right nudge the focused
//! slider (a burst of nudges forms one drag gesture; the gesture ends when
//! the keys go quiet), Enter opens and commits text entry, Tab flips
//! between the parameter and preset panes. The first keypress of the
//! session fires the resume latch that starts audio output.

mod header;
mod params;
mod presets;

use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};

use patchdeck::bind::BindingLayer;
use patchdeck::bootstrap::{LiveRig, ResumeLatch};
use patchdeck::presets::PresetSelector;

use header::render_header;
use params::render_params;
use presets::render_presets;

/// How long after the last slider nudge the drag gesture is considered
/// released.
const DRAG_RELEASE: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, PartialEq, Eq)]
enum Pane {
    Params,
    Presets,
}

struct Drag {
    id: String,
    deadline: Instant,
}

pub struct UiApp {
    binding: BindingLayer,
    selector: Option<PresetSelector>,
    patch_name: String,
    resume: ResumeLatch,
    pane: Pane,
    focus: usize,
    preset_cursor: usize,
    edit: Option<String>,
    drag: Option<Drag>,
    should_quit: bool,
}

impl UiApp {
    pub fn new(rig: LiveRig, resume: ResumeLatch) -> Self {
        let LiveRig { device, changes, presets, patch_name } = rig;
        let binding = BindingLayer::build(device.clone(), changes);
        let selector = PresetSelector::build(device, presets);
        Self {
            binding,
            selector,
            patch_name,
            resume,
            pane: Pane::Params,
            focus: 0,
            preset_cursor: 0,
            edit: None,
            drag: None,
            should_quit: false,
        }
    }

    /// Run the UI event loop (~60fps).
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.binding.poll_changes();
            self.expire_drag();

            terminal.draw(|frame| self.render(frame))?;

            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }
        Ok(())
    }

    /// End the drag gesture once the adjustment keys have gone quiet.
    fn expire_drag(&mut self) {
        if let Some(drag) = &self.drag {
            if Instant::now() >= drag.deadline {
                let id = drag.id.clone();
                self.binding.gesture_end(&id);
                self.drag = None;
            }
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        // Any interaction resumes the audio output path
        self.resume.fire();

        if self.edit.is_some() {
            self.handle_edit_key(code);
            return;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab if self.selector.is_some() => {
                self.pane = match self.pane {
                    Pane::Params => Pane::Presets,
                    Pane::Presets => Pane::Params,
                };
            }
            KeyCode::Up => self.move_cursor(-1),
            KeyCode::Down => self.move_cursor(1),
            KeyCode::Left if self.pane == Pane::Params => self.nudge(-1.0),
            KeyCode::Right if self.pane == Pane::Params => self.nudge(1.0),
            KeyCode::Enter => match self.pane {
                Pane::Params => {
                    if let Some(pair) = self.binding.pairs().get(self.focus) {
                        self.edit = Some(pair.text.content.clone());
                    }
                }
                Pane::Presets => {
                    if let Some(selector) = &mut self.selector {
                        selector.select(self.preset_cursor);
                    }
                }
            },
            _ => {}
        }
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => {
                if let (Some(buffer), Some(pair)) =
                    (self.edit.take(), self.binding.pairs().get(self.focus))
                {
                    let id = pair.param_id.clone();
                    self.binding.text_commit(&id, &buffer);
                }
            }
            KeyCode::Esc => {
                self.edit = None;
            }
            KeyCode::Backspace => {
                if let Some(buffer) = &mut self.edit {
                    buffer.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(buffer) = &mut self.edit {
                    buffer.push(c);
                }
            }
            _ => {}
        }
    }

    fn move_cursor(&mut self, delta: i32) {
        match self.pane {
            Pane::Params => {
                let len = self.binding.pairs().len();
                if len > 0 {
                    self.focus =
                        (self.focus as i32 + delta).clamp(0, len as i32 - 1) as usize;
                }
            }
            Pane::Presets => {
                if let Some(selector) = &self.selector {
                    let len = selector.len();
                    self.preset_cursor =
                        (self.preset_cursor as i32 + delta).clamp(0, len as i32 - 1) as usize;
                }
            }
        }
    }

    /// One slider nudge. Starts a gesture when none is active, retargets
    /// when focus moved to a different slider mid-gesture.
    fn nudge(&mut self, direction: f64) {
        let Some(pair) = self.binding.pairs().get(self.focus) else {
            return;
        };
        let id = pair.param_id.clone();
        let target = pair.slider.position + direction * pair.slider.granularity;

        match &self.drag {
            Some(drag) if drag.id == id => {}
            Some(drag) => {
                let previous = drag.id.clone();
                self.binding.gesture_end(&previous);
                self.binding.gesture_start(&id);
            }
            None => self.binding.gesture_start(&id),
        }

        self.binding.slider_input(&id, target);
        self.drag = Some(Drag { id, deadline: Instant::now() + DRAG_RELEASE });
    }

    fn render(&self, frame: &mut Frame) {
        let presets_height = match &self.selector {
            Some(selector) => (selector.len() as u16 + 2).min(8),
            None => 3,
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),              // Header bar
                Constraint::Min(4),                 // Parameter pane
                Constraint::Length(presets_height), // Preset pane
                Constraint::Length(1),              // Help bar
            ])
            .split(frame.area());

        render_header(
            frame,
            chunks[0],
            &self.patch_name,
            self.binding.theme(),
            self.resume.has_fired(),
        );

        render_params(
            frame,
            chunks[1],
            self.binding.pairs(),
            self.focus,
            self.edit.as_deref(),
            self.pane == Pane::Params,
        );

        render_presets(
            frame,
            chunks[2],
            self.selector.as_ref(),
            self.preset_cursor,
            self.pane == Pane::Presets,
        );

        let help = Paragraph::new(
            " [↑↓] Select  [←→] Adjust  [Enter] Edit/Apply  [Tab] Pane  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}
