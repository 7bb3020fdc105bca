use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{Frame, layout::Rect};
use stockpile_core::Route;
use throbber_widgets_tui::ThrobberState;

use crate::action::Action;
use crate::component::Component;
use crate::forms::CredentialsForm;
use crate::widgets::credentials::{self, CredentialsCopy};

const COPY: CredentialsCopy = CredentialsCopy {
    title: "Register",
    submit: "Register",
    pending: "Creating account...",
    switch_prompt: "Already have an account? ",
    switch_key: "Esc log in",
};

pub struct RegisterScreen {
    form: CredentialsForm,
    throbber: ThrobberState,
}

impl RegisterScreen {
    pub fn new() -> Self {
        Self {
            form: CredentialsForm::new(),
            throbber: ThrobberState::default(),
        }
    }
}

impl Component for RegisterScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let back = key.code == KeyCode::Esc
            || (key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('l'));
        if back {
            if self.form.is_pending() {
                return Ok(None);
            }
            return Ok(Some(Action::Navigate(Route::Login)));
        }
        Ok(super::edit_credentials(&mut self.form, key).map(Action::SubmitRegister))
    }

    fn handle_paste(&mut self, text: &str) {
        self.form.paste(text);
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::Tick if self.form.is_pending() => self.throbber.calc_next(),
            Action::AuthFailed(error) => self.form.fail(error.clone()),
            Action::AuthSucceeded => self.form.reset(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        credentials::render(frame, area, &self.form, &COPY, &self.throbber);
    }

    fn captures_input(&self) -> bool {
        true
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        &[("Tab", "next field"), ("Enter", "register"), ("Esc", "back to login")]
    }
}
