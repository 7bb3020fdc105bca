//! Reusable rendering helpers shared by screens and overlays.

pub mod credentials;
pub mod input;

use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear},
};

use crate::forms::FormError;
use crate::theme;

/// A `width` x `height` rect centered in `area`, shrunk to fit.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Clear `area` and draw a rounded panel over it; returns the inner rect.
pub fn panel(frame: &mut Frame, area: Rect, title: &str, border: Style) -> Rect {
    frame.render_widget(Clear, area);
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border)
        .style(Style::default().bg(theme::BG_DARK));
    if !title.is_empty() {
        block = block
            .title(format!(" {title} "))
            .title_style(theme::title_style());
    }
    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

/// `key description  key description ...` in hint colors.
pub fn key_hints(hints: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::with_capacity(hints.len() * 2 + 1);
    spans.push(Span::raw(" "));
    for (key, desc) in hints {
        spans.push(Span::styled(format!("{key} "), theme::key_hint_key()));
        spans.push(Span::styled(format!("{desc}  "), theme::key_hint()));
    }
    Line::from(spans)
}

/// The error message followed by one line per field error.
pub fn error_lines(error: &FormError) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        error.message.clone(),
        theme::error_text(),
    ))];
    lines.extend(error.fields.iter().map(|f| {
        Line::from(Span::styled(
            format!("  {}: {}", f.field, f.message),
            theme::error_text(),
        ))
    }));
    lines
}
