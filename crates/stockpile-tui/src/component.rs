//! Component trait: the building block for every screen.

use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::{Frame, layout::Rect};

use crate::action::Action;

/// Every screen implements Component.
///
/// Lifecycle: (`handle_key_event` | `handle_paste` | `update` | `render`)*
pub trait Component: Send {
    /// Handle a keyboard event. Return an Action to dispatch, or None.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>>;

    /// Bracketed paste into whatever input has focus.
    fn handle_paste(&mut self, _text: &str) {}

    /// Process a dispatched action. May return a follow-up action.
    fn update(&mut self, _action: &Action) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Render into the provided frame area.
    fn render(&self, frame: &mut Frame, area: Rect);

    /// True while a text field has the keyboard; global single-key
    /// bindings (`q`, `?`) are then typed instead of acted on.
    fn captures_input(&self) -> bool {
        false
    }

    /// Key hints for the status bar.
    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }
}
