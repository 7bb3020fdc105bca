//! One screen per route.

pub mod landing;
pub mod login;
pub mod products;
pub mod register;

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use stockpile_core::{Credentials, Route};

use crate::component::Component;
use crate::forms::CredentialsForm;

pub fn create_screens() -> HashMap<Route, Box<dyn Component>> {
    let mut screens: HashMap<Route, Box<dyn Component>> = HashMap::new();
    screens.insert(Route::Landing, Box::new(landing::LandingScreen::new()));
    screens.insert(Route::Login, Box::new(login::LoginScreen::new()));
    screens.insert(Route::Register, Box::new(register::RegisterScreen::new()));
    screens.insert(Route::Products, Box::new(products::ProductsScreen::new()));
    screens
}

/// Editing keys shared by the login and register forms. Returns the
/// credentials when Enter produced a valid submit.
fn edit_credentials(form: &mut CredentialsForm, key: KeyEvent) -> Option<Credentials> {
    match key.code {
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => form.focus_next(),
        KeyCode::Enter => return form.submit(),
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => form.input(c),
        _ => {}
    }
    None
}
