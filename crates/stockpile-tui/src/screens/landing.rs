//! Shown while the session check decides where to go.

use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::Style,
};
use throbber_widgets_tui::{Throbber, ThrobberState};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

pub struct LandingScreen {
    throbber: ThrobberState,
}

impl LandingScreen {
    pub fn new() -> Self {
        Self {
            throbber: ThrobberState::default(),
        }
    }
}

impl Component for LandingScreen {
    fn handle_key_event(&mut self, _key: KeyEvent) -> Result<Option<Action>> {
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::Tick = action {
            self.throbber.calc_next();
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [row] = Layout::vertical([Constraint::Length(1)])
            .flex(Flex::Center)
            .areas(area);
        let [cell] = Layout::horizontal([Constraint::Length(14)])
            .flex(Flex::Center)
            .areas(row);

        let throbber = Throbber::default()
            .label("Loading...")
            .style(Style::default().fg(theme::HIGHLIGHT))
            .throbber_style(Style::default().fg(theme::ACCENT));
        frame.render_stateful_widget(throbber, cell, &mut self.throbber.clone());
    }
}
