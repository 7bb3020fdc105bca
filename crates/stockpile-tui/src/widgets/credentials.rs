//! The email/password panel used by the login and register screens.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use throbber_widgets_tui::{Throbber, ThrobberState};

use crate::forms::{CredentialField, CredentialsForm};
use crate::theme;
use crate::widgets::{self, input::render_input_field};

/// Static text that differs between login and register.
pub struct CredentialsCopy {
    pub title: &'static str,
    pub submit: &'static str,
    pub pending: &'static str,
    /// e.g. "No account? Ctrl+R to register"
    pub switch_prompt: &'static str,
    pub switch_key: &'static str,
}

pub fn render(
    frame: &mut Frame,
    area: Rect,
    form: &CredentialsForm,
    copy: &CredentialsCopy,
    throbber: &ThrobberState,
) {
    let error_rows = form
        .error()
        .map_or(0, |e| u16::try_from(e.fields.len() + 1).unwrap_or(u16::MAX));
    let panel_area = widgets::centered(area, 52, 16 + error_rows);
    let inner = widgets::panel(frame, panel_area, copy.title, theme::border_focused());

    let [_, email, password, errors, submit, _, switch] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Length(error_rows),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner.inner(ratatui::layout::Margin::new(2, 0)));

    render_input_field(
        frame,
        email,
        "Email",
        form.email.value(),
        form.focus == CredentialField::Email,
        false,
    );
    render_input_field(
        frame,
        password,
        "Password",
        form.password.value(),
        form.focus == CredentialField::Password,
        true,
    );

    if let Some(error) = form.error() {
        frame.render_widget(Paragraph::new(widgets::error_lines(error)), errors);
    }

    if form.is_pending() {
        let throbber_widget = Throbber::default()
            .label(copy.pending)
            .style(Style::default().fg(theme::HIGHLIGHT))
            .throbber_style(Style::default().fg(theme::ACCENT));
        frame.render_stateful_widget(throbber_widget, submit, &mut throbber.clone());
    } else {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!("[ {} ]", copy.submit),
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            )))
            .alignment(Alignment::Center),
            submit,
        );
    }

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(copy.switch_prompt, theme::key_hint()),
            Span::styled(copy.switch_key, theme::key_hint_key()),
        ]))
        .alignment(Alignment::Center),
        switch,
    );
}
