//! Preset pane - positional options with the fixed placeholder label.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use patchdeck::presets::PresetSelector;

pub fn render_presets(
    frame: &mut Frame,
    area: Rect,
    selector: Option<&PresetSelector>,
    cursor: usize,
    active: bool,
) {
    let border = if active { Color::White } else { Color::DarkGray };
    let block = Block::default()
        .title(" presets ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(selector) = selector else {
        let placeholder = Paragraph::new("no presets")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(placeholder, inner);
        return;
    };

    let lines: Vec<Line> = (0..selector.len())
        .map(|i| {
            let marker = if active && i == cursor { "▸" } else { " " };
            let applied = if selector.selected() == Some(i) { "●" } else { " " };
            let style = if active && i == cursor {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::from(Span::styled(
                format!("{marker} {applied} {} {i}", selector.label(i)),
                style,
            ))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}
