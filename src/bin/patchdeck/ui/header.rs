//! Header bar - patch name, output state, and theme-driven styling.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use patchdeck::bind::ThemeState;

pub fn render_header(
    frame: &mut Frame,
    area: Rect,
    patch_name: &str,
    theme: &ThemeState,
    output_live: bool,
) {
    // Theme flags are purely presentational: glow tints the border, pulse
    // tints the patch name.
    let border_color = if theme.glow { Color::Yellow } else { Color::DarkGray };
    let name_color = if theme.pulse { Color::Magenta } else { Color::Cyan };

    let block = Block::default()
        .title(" patchdeck ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let (state_str, state_color) = if output_live {
        ("▶ live", Color::Green)
    } else {
        ("⏸ press any key for sound", Color::Yellow)
    };

    let line = Line::from(vec![
        Span::styled(format!(" {patch_name}  "), Style::default().fg(name_color)),
        Span::styled(state_str, Style::default().fg(state_color)),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
