//! Products table with create/edit dialogs and delete confirmation.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState},
};
use stockpile_core::{EMPTY_PLACEHOLDER, Product};
use throbber_widgets_tui::{Throbber, ThrobberState};

use crate::action::{Action, ConfirmAction};
use crate::component::Component;
use crate::forms::{ProductField, ProductForm};
use crate::theme;
use crate::widgets::{self, input::render_input_field};

pub struct ProductsScreen {
    products: Arc<Vec<Product>>,
    /// At least one successful load since the screen was last cleared.
    loaded: bool,
    loading: bool,
    error: Option<String>,
    table_state: TableState,
    dialog: Option<ProductForm>,
    throbber: ThrobberState,
}

impl ProductsScreen {
    pub fn new() -> Self {
        Self {
            products: Arc::new(Vec::new()),
            loaded: false,
            loading: false,
            error: None,
            table_state: TableState::default().with_selected(Some(0)),
            dialog: None,
            throbber: ThrobberState::default(),
        }
    }

    fn selected_index(&self) -> usize {
        self.table_state.selected().unwrap_or(0)
    }

    fn select(&mut self, idx: usize) {
        let clamped = idx.min(self.products.len().saturating_sub(1));
        self.table_state.select(Some(clamped));
    }

    fn move_selection(&mut self, delta: isize) {
        if self.products.is_empty() {
            return;
        }
        let next = self.selected_index().saturating_add_signed(delta);
        self.select(next);
    }

    fn selected(&self) -> Option<&Product> {
        self.products.get(self.selected_index())
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) -> Option<Action> {
        let form = self.dialog.as_mut()?;
        match key.code {
            KeyCode::Esc => self.dialog = None,
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
            KeyCode::Enter => return form.submit().map(Action::SubmitProduct),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => form.input(c),
            _ => {}
        }
        None
    }

    fn render_body(&self, frame: &mut Frame, area: Rect) {
        let mut title = vec![Span::styled(
            format!(" Products ({}) ", self.products.len()),
            theme::title_style(),
        )];
        if self.loaded && self.loading {
            title.push(Span::styled("refreshing\u{2026} ", theme::dimmed()));
        } else if self.loaded && self.error.is_some() {
            title.push(Span::styled("refresh failed ", theme::error_text()));
        }
        let block = Block::default()
            .title(Line::from(title))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.dialog.is_some() {
                theme::border_default()
            } else {
                theme::border_focused()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if !self.loaded {
            if let Some(ref error) = self.error {
                render_centered(
                    frame,
                    inner,
                    vec![
                        Line::from(Span::styled(
                            format!("Failed to load products: {error}"),
                            theme::error_text(),
                        )),
                        widgets::key_hints(&[("r", "retry")]),
                    ],
                );
            } else {
                let [row] = Layout::vertical([Constraint::Length(1)])
                    .flex(Flex::Center)
                    .areas(inner);
                let [cell] = Layout::horizontal([Constraint::Length(22)])
                    .flex(Flex::Center)
                    .areas(row);
                let throbber = Throbber::default()
                    .label("Loading products...")
                    .style(Style::default().fg(theme::HIGHLIGHT))
                    .throbber_style(Style::default().fg(theme::ACCENT));
                frame.render_stateful_widget(throbber, cell, &mut self.throbber.clone());
            }
            return;
        }

        if self.products.is_empty() {
            render_centered(
                frame,
                inner,
                vec![
                    Line::from(Span::styled("No products yet.", theme::table_row())),
                    widgets::key_hints(&[("n", "add one")]),
                ],
            );
            return;
        }

        let header = Row::new(
            ["Name", "Description", "Price", "Stock", "Updated"]
                .into_iter()
                .map(|h| Cell::from(Span::styled(h, theme::table_header()))),
        );
        let rows = self.products.iter().map(|p| {
            let description = match p.description.as_deref() {
                Some(text) if !text.is_empty() => Cell::from(text.to_owned()),
                _ => Cell::from(Span::styled(EMPTY_PLACEHOLDER, theme::dimmed())),
            };
            Row::new(vec![
                Cell::from(p.name.clone()),
                description,
                Cell::from(Line::from(p.price.clone()).alignment(Alignment::Right)),
                Cell::from(Line::from(p.stock.to_string()).alignment(Alignment::Right)),
                Cell::from(short_timestamp(&p.updated_at)),
            ])
            .style(theme::table_row())
        });
        let widths = [
            Constraint::Percentage(25),
            Constraint::Fill(1),
            Constraint::Length(12),
            Constraint::Length(7),
            Constraint::Length(17),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(2)
            .row_highlight_style(theme::table_selected());

        let mut state = self.table_state;
        frame.render_stateful_widget(table, inner, &mut state);
    }

    fn render_dialog(&self, frame: &mut Frame, area: Rect, form: &ProductForm) {
        let error_rows = form
            .error()
            .map_or(0, |e| u16::try_from(e.fields.len() + 1).unwrap_or(u16::MAX));
        let dialog_area = widgets::centered(area, 60, 21 + error_rows);
        let inner = widgets::panel(frame, dialog_area, form.title(), theme::border_focused());

        let [_, fields, errors, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(16),
            Constraint::Length(error_rows),
            Constraint::Length(1),
        ])
        .areas(inner.inner(ratatui::layout::Margin::new(2, 0)));

        let field_areas = Layout::vertical([Constraint::Length(4); 4]).split(fields);
        for (field, field_area) in ProductField::ALL.into_iter().zip(field_areas.iter()) {
            render_input_field(
                frame,
                *field_area,
                field.label(),
                form.field(field).value(),
                form.focus == field,
                false,
            );
        }

        if let Some(error) = form.error() {
            frame.render_widget(Paragraph::new(widgets::error_lines(error)), errors);
        }

        if form.is_pending() {
            let throbber = Throbber::default()
                .label("Saving...")
                .style(Style::default().fg(theme::HIGHLIGHT))
                .throbber_style(Style::default().fg(theme::ACCENT));
            frame.render_stateful_widget(throbber, footer, &mut self.throbber.clone());
        } else {
            frame.render_widget(
                Paragraph::new(widgets::key_hints(&[
                    ("Enter", "save"),
                    ("Tab", "next"),
                    ("Esc", "cancel"),
                ])),
                footer,
            );
        }
    }
}

impl Component for ProductsScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.dialog.is_some() {
            return Ok(self.handle_dialog_key(key));
        }

        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                None
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.select(0);
                None
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.select(usize::MAX);
                None
            }
            KeyCode::Char('n') => {
                self.dialog = Some(ProductForm::create());
                None
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                self.dialog = self.selected().map(ProductForm::edit);
                None
            }
            KeyCode::Char('d') | KeyCode::Delete => self.selected().map(|p| {
                Action::ShowConfirm(ConfirmAction::DeleteProduct {
                    id: p.id.clone(),
                    name: p.name.clone(),
                })
            }),
            KeyCode::Char('r') => Some(Action::RefreshProducts),
            KeyCode::Char('L') => Some(Action::Logout),
            _ => None,
        };
        Ok(action)
    }

    fn handle_paste(&mut self, text: &str) {
        if let Some(ref mut form) = self.dialog {
            form.paste(text);
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::Tick => self.throbber.calc_next(),
            Action::ProductsLoading => self.loading = true,
            Action::ProductsLoaded(products) => {
                self.products = Arc::clone(products);
                self.loaded = true;
                self.loading = false;
                self.error = None;
                self.select(self.selected_index());
            }
            Action::ProductsFailed(message) => {
                self.loading = false;
                self.error = Some(message.clone());
            }
            Action::CacheCleared => *self = Self::new(),
            Action::ProductSaved(_) => self.dialog = None,
            Action::ProductSaveFailed(error) => {
                if let Some(ref mut form) = self.dialog {
                    form.fail(error.clone());
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        self.render_body(frame, area);
        if let Some(ref form) = self.dialog {
            self.render_dialog(frame, area, form);
        }
    }

    fn captures_input(&self) -> bool {
        self.dialog.is_some()
    }

    fn hints(&self) -> &'static [(&'static str, &'static str)] {
        if self.dialog.is_some() {
            &[("Tab", "next field"), ("Enter", "save"), ("Esc", "cancel")]
        } else {
            &[
                ("n", "new"),
                ("e", "edit"),
                ("d", "delete"),
                ("r", "refresh"),
                ("L", "log out"),
            ]
        }
    }
}

fn render_centered(frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
    let height = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), row);
}

/// RFC 3339 timestamps in local time, minute precision; anything else as-is.
fn short_timestamp(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_owned(),
        |ts| {
            ts.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        },
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use stockpile_core::{ApiError, Description};

    use super::*;
    use crate::forms::{FormError, ProductSubmission};

    fn product(id: &str, name: &str) -> Product {
        Product {
            id: id.into(),
            user_id: "u-1".into(),
            name: name.into(),
            description: Description::null(),
            price: "1.00".into(),
            stock: 1,
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: "2024-01-01T00:00:00Z".into(),
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn loaded(names: &[&str]) -> ProductsScreen {
        let mut screen = ProductsScreen::new();
        let products = names
            .iter()
            .enumerate()
            .map(|(i, n)| product(&format!("p-{i}"), n))
            .collect();
        screen
            .update(&Action::ProductsLoaded(Arc::new(products)))
            .unwrap();
        screen
    }

    #[test]
    fn selection_is_clamped() {
        let mut screen = loaded(&["a", "b", "c"]);
        screen.handle_key_event(key(KeyCode::Char('G'))).unwrap();
        assert_eq!(screen.selected_index(), 2);
        screen.handle_key_event(key(KeyCode::Char('j'))).unwrap();
        assert_eq!(screen.selected_index(), 2);
        screen.handle_key_event(key(KeyCode::Char('g'))).unwrap();
        screen.handle_key_event(key(KeyCode::Char('k'))).unwrap();
        assert_eq!(screen.selected_index(), 0);
    }

    #[test]
    fn reload_with_fewer_rows_keeps_selection_in_range() {
        let mut screen = loaded(&["a", "b", "c"]);
        screen.select(2);
        screen
            .update(&Action::ProductsLoaded(Arc::new(vec![product("p-0", "a")])))
            .unwrap();
        assert_eq!(screen.selected_index(), 0);
    }

    #[test]
    fn delete_asks_for_confirmation() {
        let mut screen = loaded(&["a", "Widget"]);
        screen.handle_key_event(key(KeyCode::Char('j'))).unwrap();
        let action = screen.handle_key_event(key(KeyCode::Char('d'))).unwrap();

        let Some(Action::ShowConfirm(confirm)) = action else {
            panic!("expected a confirmation, got {action:?}");
        };
        assert_eq!(
            confirm,
            ConfirmAction::DeleteProduct {
                id: "p-1".into(),
                name: "Widget".into()
            }
        );
        assert_eq!(
            confirm.to_string(),
            "Delete Widget? This action cannot be undone."
        );
    }

    #[test]
    fn nothing_to_edit_or_delete_when_empty() {
        let mut screen = loaded(&[]);
        assert!(screen.handle_key_event(key(KeyCode::Char('d'))).unwrap().is_none());
        screen.handle_key_event(key(KeyCode::Char('e'))).unwrap();
        assert!(!screen.captures_input());
    }

    #[test]
    fn edit_dialog_targets_selected_product() {
        let mut screen = loaded(&["a", "b"]);
        screen.handle_key_event(key(KeyCode::Char('j'))).unwrap();
        screen.handle_key_event(key(KeyCode::Char('e'))).unwrap();

        assert!(screen.captures_input());
        let form = screen.dialog.as_mut().unwrap();
        assert_eq!(form.name.value(), "b");
        let Some(ProductSubmission::Update { id, .. }) = form.submit() else {
            panic!("expected an update");
        };
        assert_eq!(id, "p-1");
    }

    #[test]
    fn dialog_captures_letters_and_closes_on_save() {
        let mut screen = loaded(&[]);
        screen.handle_key_event(key(KeyCode::Char('n'))).unwrap();
        // 'r' and 'L' are typed into the name, not acted on.
        for c in ['r', 'L'] {
            assert!(screen.handle_key_event(key(KeyCode::Char(c))).unwrap().is_none());
        }
        assert_eq!(screen.dialog.as_ref().unwrap().name.value(), "rL");

        screen.handle_key_event(key(KeyCode::Tab)).unwrap();
        screen.handle_key_event(key(KeyCode::Tab)).unwrap();
        screen.handle_paste("4.50");
        let action = screen.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(matches!(action, Some(Action::SubmitProduct(_))));

        screen
            .update(&Action::ProductSaved(product("p-9", "rL")))
            .unwrap();
        assert!(screen.dialog.is_none());
    }

    #[test]
    fn failed_save_keeps_dialog_open_with_error() {
        let mut screen = loaded(&["a"]);
        screen.handle_key_event(key(KeyCode::Char('e'))).unwrap();
        screen.handle_key_event(key(KeyCode::Enter)).unwrap();

        let err = stockpile_core::CoreError::Api {
            status: 422,
            error: ApiError::new("Validation failed"),
        };
        screen
            .update(&Action::ProductSaveFailed(FormError::from_core(
                &err,
                "Failed to update product",
            )))
            .unwrap();

        let form = screen.dialog.as_ref().unwrap();
        assert!(!form.is_pending());
        assert_eq!(form.error().unwrap().message, "Validation failed");
    }

    #[test]
    fn cache_clear_forgets_rows() {
        let mut screen = loaded(&["a"]);
        screen.update(&Action::CacheCleared).unwrap();
        assert!(screen.products.is_empty());
        assert!(!screen.loaded);
    }

    #[test]
    fn refetch_error_keeps_previous_rows() {
        let mut screen = loaded(&["a"]);
        screen
            .update(&Action::ProductsFailed("Something went wrong".into()))
            .unwrap();
        assert_eq!(screen.products.len(), 1);
        assert_eq!(screen.error.as_deref(), Some("Something went wrong"));
    }

    #[test]
    fn timestamps_without_offset_pass_through() {
        assert_eq!(short_timestamp("yesterday"), "yesterday");
    }
}
