use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::Span,
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::theme;

/// Labelled single-line input: one label row plus a 3-row bordered box.
/// `masked` renders every character as a dot.
pub fn render_input_field(
    frame: &mut Frame,
    area: Rect,
    label: &str,
    value: &str,
    active: bool,
    masked: bool,
) {
    if area.height < 4 {
        return;
    }

    let label_style = if active {
        Style::default().fg(theme::HIGHLIGHT)
    } else {
        Style::default().fg(theme::TEXT)
    };
    frame.render_widget(
        Paragraph::new(Span::styled(label.to_owned(), label_style)),
        Rect::new(area.x, area.y, area.width, 1),
    );

    let shown = if masked {
        "\u{25CF}".repeat(value.chars().count())
    } else {
        value.to_owned()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if active {
            theme::border_focused()
        } else {
            theme::border_default()
        });
    let box_area = Rect::new(area.x, area.y + 1, area.width, 3);
    let inner = block.inner(box_area);
    frame.render_widget(block, box_area);

    let text = if active { format!("{shown}\u{2588}") } else { shown };
    // Keep the cursor end visible when the value outgrows the box.
    let width = usize::from(inner.width);
    let visible: String = {
        let len = text.chars().count();
        text.chars().skip(len.saturating_sub(width)).collect()
    };
    frame.render_widget(
        Paragraph::new(Span::styled(visible, Style::default().fg(theme::TEXT))),
        inner,
    );
}
