//! Parameter pane - one slider row and text mirror per control pair.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use patchdeck::bind::ControlPair;

const BAR_WIDTH: usize = 24;
const LABEL_WIDTH: usize = 14;

pub fn render_params(
    frame: &mut Frame,
    area: Rect,
    pairs: &[ControlPair],
    focus: usize,
    edit: Option<&str>,
    active: bool,
) {
    let border = if active { Color::White } else { Color::DarkGray };
    let block = Block::default()
        .title(" parameters ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if pairs.is_empty() {
        let placeholder = Paragraph::new("no parameters")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(placeholder, inner);
        return;
    }

    let rows = inner.height as usize;
    // Keep the focused row visible when the list is taller than the pane
    let first = focus.saturating_sub(rows.saturating_sub(1));

    let lines: Vec<Line> = pairs
        .iter()
        .enumerate()
        .skip(first)
        .take(rows)
        .map(|(i, pair)| param_line(i, pair, focus, edit, active))
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn param_line<'a>(
    index: usize,
    pair: &'a ControlPair,
    focus: usize,
    edit: Option<&'a str>,
    active: bool,
) -> Line<'a> {
    let focused = active && index == focus;
    let marker = if focused { "▸" } else { " " };

    let label_style = if focused {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };

    let span = pair.slider.max - pair.slider.min;
    let ratio = if span > 0.0 {
        ((pair.slider.position - pair.slider.min) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (ratio * BAR_WIDTH as f64).round() as usize;
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled));

    // While editing the focused row, the text cell shows the edit buffer
    let value_cell = match edit {
        Some(buffer) if focused => format!("{buffer}▏"),
        _ => pair.text.content.clone(),
    };
    let value_style = if edit.is_some() && focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Cyan)
    };

    Line::from(vec![
        Span::styled(format!("{marker} {:<LABEL_WIDTH$}", pair.label), label_style),
        Span::styled(bar, Style::default().fg(Color::Blue)),
        Span::raw("  "),
        Span::styled(value_cell, value_style),
    ])
}
