//! Application core: event loop, action dispatch, and screen management.
//!
//! The [`App`] owns one screen per [`Route`], the overlays (confirm
//! dialog, help, notification toast) and the [`Client`]. Terminal events
//! become [`Action`]s; writes run on spawned tasks that report back
//! through the same channel, and the data bridge turns cache events into
//! fresh view data.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use stockpile_core::{Client, Credentials, QueryKey, Route, User, resolve_landing};

use crate::action::{Action, ConfirmAction, Notification, NotificationLevel};
use crate::component::Component;
use crate::data_bridge;
use crate::event::{Event, EventReader};
use crate::forms::{FormError, ProductSubmission};
use crate::screens;
use crate::theme;
use crate::tui::Tui;
use crate::widgets;

const TICK_RATE: Duration = Duration::from_millis(250);
const RENDER_RATE: Duration = Duration::from_millis(33);
const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Top-level application state.
pub struct App {
    client: Client,
    /// Currently visible route.
    route: Route,
    /// Published to the data bridge so it knows which reads are observed.
    route_tx: watch::Sender<Route>,
    screens: HashMap<Route, Box<dyn Component>>,
    /// Signed-in user, shown in the header.
    user: Option<Arc<User>>,
    running: bool,
    help_visible: bool,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    /// Cancellation token for the data bridge task.
    data_cancel: CancellationToken,
    /// Pending confirmation dialog (blocks other input while active).
    pending_confirm: Option<ConfirmAction>,
    /// Active notification toast with display timestamp.
    notification: Option<(Notification, Instant)>,
}

impl App {
    pub fn new(client: Client) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let (route_tx, _) = watch::channel(Route::Landing);

        Self {
            client,
            route: Route::Landing,
            route_tx,
            screens: screens::create_screens(),
            user: None,
            running: true,
            help_visible: false,
            action_tx,
            action_rx,
            data_cancel: CancellationToken::new(),
            pending_confirm: None,
            notification: None,
        }
    }

    /// Run the main event loop until the user quits.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        let bridge = tokio::spawn(data_bridge::spawn_data_bridge(
            self.client.clone(),
            self.route_tx.subscribe(),
            self.action_tx.clone(),
            self.data_cancel.clone(),
        ));
        self.resolve_session();

        let mut events = EventReader::new(TICK_RATE, RENDER_RATE);
        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Paste(text) => {
                    if let Some(screen) = self.screens.get_mut(&self.route) {
                        screen.handle_paste(&text);
                    }
                }
                Event::Resize(..) | Event::Render => self.action_tx.send(Action::Render)?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.data_cancel.cancel();
        events.stop();
        let _ = bridge.await;
        info!("TUI event loop ended");
        Ok(())
    }

    /// Landing: read the session once and route on the outcome.
    fn resolve_session(&self) {
        let client = self.client.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let session = client.me().await;
            if let Ok(ref user) = session {
                let _ = tx.send(Action::SessionResolved(Arc::clone(user)));
            }
            let _ = tx.send(Action::Navigate(resolve_landing(&session)));
        });
    }

    /// Global keys first, then the active screen.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if self.pending_confirm.is_some() {
            return Ok(match key.code {
                KeyCode::Char('y' | 'Y') => Some(Action::ConfirmYes),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => Some(Action::ConfirmNo),
                _ => None,
            });
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        let Some(screen) = self.screens.get_mut(&self.route) else {
            return Ok(None);
        };

        let chord = key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        if !screen.captures_input() && !chord {
            match key.code {
                KeyCode::Char('q') => return Ok(Some(Action::Quit)),
                KeyCode::Char('?') => return Ok(Some(Action::ToggleHelp)),
                _ => {}
            }
        }

        screen.handle_key_event(key)
    }

    /// Process a single action: update app state and propagate to screens.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,
            Action::Render => {}

            Action::Tick => {
                let expired = self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, shown_at)| shown_at.elapsed() >= NOTIFICATION_TTL);
                if expired {
                    self.notification = None;
                }
                self.forward(self.route, action)?;
            }

            Action::Navigate(route) => self.navigate(*route),

            // ── Session ──
            Action::SessionResolved(user) => self.user = Some(Arc::clone(user)),
            Action::SessionExpired => {
                if !self.route.is_public() {
                    self.user = None;
                    self.navigate(Route::Login);
                    self.action_tx.send(Action::Notify(Notification::info(
                        "Session expired, please log in",
                    )))?;
                }
            }
            Action::SubmitLogin(credentials) => self.submit_credentials(credentials, false),
            Action::SubmitRegister(credentials) => self.submit_credentials(credentials, true),
            Action::AuthSucceeded => {
                self.forward(self.route, action)?;
                self.navigate(Route::Products);
            }
            Action::Logout => self.logout(),
            Action::LoggedOut => {
                self.user = None;
                self.navigate(Route::Login);
                self.action_tx
                    .send(Action::Notify(Notification::success("Logged out")))?;
            }

            // ── Products ──
            Action::RefreshProducts => {
                self.client.cache().invalidate(&QueryKey::products());
            }
            Action::SubmitProduct(submission) => self.save_product(submission.clone()),
            Action::ProductSaved(product) => {
                self.forward(Route::Products, action)?;
                self.action_tx.send(Action::Notify(Notification::success(format!(
                    "Saved {}",
                    product.name
                ))))?;
            }
            Action::ProductDeleted { name } => {
                self.action_tx.send(Action::Notify(Notification::success(format!(
                    "Deleted {name}"
                ))))?;
            }
            Action::ProductsLoading
            | Action::ProductsLoaded(_)
            | Action::ProductsFailed(_)
            | Action::CacheCleared
            | Action::ProductSaveFailed(_) => self.forward(Route::Products, action)?,

            // ── Confirmation ──
            Action::ShowConfirm(confirm) => self.pending_confirm = Some(confirm.clone()),
            Action::ConfirmYes => {
                if let Some(confirm) = self.pending_confirm.take() {
                    self.execute_confirm(confirm);
                }
            }
            Action::ConfirmNo => self.pending_confirm = None,

            // ── Overlays ──
            Action::ToggleHelp => self.help_visible = !self.help_visible,
            Action::Notify(n) => self.notification = Some((n.clone(), Instant::now())),

            Action::AuthFailed(_) => self.forward(self.route, action)?,
        }

        Ok(())
    }

    fn forward(&mut self, route: Route, action: &Action) -> Result<()> {
        let Some(screen) = self.screens.get_mut(&route) else {
            return Ok(());
        };
        if let Some(follow_up) = screen.update(action)? {
            self.action_tx.send(follow_up)?;
        }
        Ok(())
    }

    fn navigate(&mut self, route: Route) {
        if route == self.route {
            return;
        }
        debug!("navigating: {} → {}", self.route.path(), route.path());
        self.route = route;
        self.help_visible = false;
        self.route_tx.send_replace(route);
    }

    // ── Background tasks ──────────────────────────────────────────

    /// Run `task` on the runtime and dispatch the action it yields.
    fn spawn_task<F>(&self, task: F)
    where
        F: Future<Output = Action> + Send + 'static,
    {
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(task.await);
        });
    }

    fn submit_credentials(&self, credentials: &Credentials, register: bool) {
        let client = self.client.clone();
        let credentials = credentials.clone();
        self.spawn_task(async move {
            let (result, fallback) = if register {
                (client.register(&credentials).await, "Registration failed")
            } else {
                (client.login(&credentials).await, "Login failed")
            };
            match result {
                Ok(_) => Action::AuthSucceeded,
                Err(e) => {
                    warn!(error = %e, register, "authentication failed");
                    Action::AuthFailed(FormError::from_core(&e, fallback))
                }
            }
        });
    }

    fn logout(&self) {
        let client = self.client.clone();
        self.spawn_task(async move {
            match client.logout().await {
                Ok(_) => Action::LoggedOut,
                Err(e) => {
                    warn!(error = %e, "logout failed");
                    Action::Notify(Notification::error(format!(
                        "Logout failed: {}",
                        e.message()
                    )))
                }
            }
        });
    }

    fn save_product(&self, submission: ProductSubmission) {
        let client = self.client.clone();
        self.spawn_task(async move {
            let fallback = submission.fallback_error();
            let result = match submission {
                ProductSubmission::Create(ref product) => client.create_product(product).await,
                ProductSubmission::Update { ref id, ref update } => {
                    client.update_product(id, update).await
                }
            };
            match result {
                Ok(product) => Action::ProductSaved(product),
                Err(e) => {
                    warn!(error = %e, "product write failed");
                    Action::ProductSaveFailed(FormError::from_core(&e, fallback))
                }
            }
        });
    }

    fn execute_confirm(&self, confirm: ConfirmAction) {
        match confirm {
            ConfirmAction::DeleteProduct { id, name } => {
                let client = self.client.clone();
                self.spawn_task(async move {
                    match client.delete_product(&id).await {
                        Ok(()) => Action::ProductDeleted { name },
                        Err(e) => {
                            warn!(error = %e, %id, "delete failed");
                            Action::Notify(Notification::error(format!(
                                "Failed to delete {name}: {}",
                                e.message()
                            )))
                        }
                    }
                });
            }
        }
    }

    // ── Rendering ─────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let [header, content, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(area);

        self.render_header(frame, header);
        if let Some(screen) = self.screens.get(&self.route) {
            screen.render(frame, content);
        }
        self.render_status_bar(frame, status);

        // Overlays, last = topmost
        if let Some((ref notification, _)) = self.notification {
            render_notification(frame, area, notification);
        }
        if let Some(ref confirm) = self.pending_confirm {
            render_confirm_dialog(frame, area, confirm);
        }
        if self.help_visible {
            render_help_overlay(frame, area);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(" Stockpile ", theme::title_style()),
            Span::styled(self.route.path(), theme::key_hint()),
        ];
        if let (Some(user), Route::Products) = (&self.user, self.route) {
            spans.push(Span::styled("  ·  ", theme::key_hint()));
            spans.push(Span::styled(
                user.email.clone(),
                Style::default().fg(theme::TEXT),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let Some(screen) = self.screens.get(&self.route) else {
            return;
        };
        let mut hints: Vec<(&str, &str)> = screen.hints().to_vec();
        if screen.captures_input() {
            hints.push(("Ctrl+C", "quit"));
        } else {
            hints.extend([("?", "help"), ("q", "quit")]);
        }
        frame.render_widget(Paragraph::new(widgets::key_hints(&hints)), area);
    }
}

/// Toast in the bottom-right corner, above the status bar.
fn render_notification(frame: &mut Frame, area: Rect, notification: &Notification) {
    let msg_len = u16::try_from(notification.message.chars().count()).unwrap_or(u16::MAX);
    let width = msg_len.saturating_add(6).clamp(20, 60).min(area.width);
    let height = 3u16.min(area.height);
    let x = area.width.saturating_sub(width + 1);
    let y = area.height.saturating_sub(height + 1);
    let toast = Rect::new(area.x + x, area.y + y, width, height);

    let (color, icon) = match notification.level {
        NotificationLevel::Success => (theme::SUCCESS, "✓"),
        NotificationLevel::Error => (theme::ERROR, "✗"),
        NotificationLevel::Info => (theme::HIGHLIGHT, "·"),
    };
    let inner = widgets::panel(frame, toast, "", Style::default().fg(color));
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(format!("{icon} "), Style::default().fg(color)),
            Span::styled(
                notification.message.clone(),
                Style::default().fg(theme::TEXT),
            ),
        ])),
        inner,
    );
}

fn render_confirm_dialog(frame: &mut Frame, area: Rect, confirm: &ConfirmAction) {
    let text = confirm.to_string();
    let width = u16::try_from(text.chars().count())
        .unwrap_or(u16::MAX)
        .saturating_add(6)
        .clamp(40, 72);
    let dialog = widgets::centered(area, width, 5);
    let inner = widgets::panel(
        frame,
        dialog,
        "Confirm",
        Style::default().fg(theme::WARNING),
    );
    frame.render_widget(
        Paragraph::new(vec![
            Line::from(Span::styled(
                format!(" {text}"),
                Style::default().fg(theme::TEXT),
            )),
            Line::from(""),
            widgets::key_hints(&[("y", "confirm"), ("n", "cancel")]),
        ]),
        inner,
    );
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    const SECTIONS: &[(&str, &[(&str, &str)])] = &[
        (
            "Products",
            &[
                ("j/k ↑/↓", "Move up/down"),
                ("g/G", "Top / bottom"),
                ("n", "New product"),
                ("e Enter", "Edit selected"),
                ("d Del", "Delete selected"),
                ("r", "Refresh"),
                ("L", "Log out"),
            ],
        ),
        (
            "Forms",
            &[
                ("Tab ↑/↓", "Next / previous field"),
                ("Enter", "Submit"),
                ("Esc", "Cancel / back"),
                ("Ctrl+R", "Login → register"),
            ],
        ),
        ("Global", &[("?", "This help"), ("q Ctrl+C", "Quit")]),
    ];

    let help = widgets::centered(area, 52, 24);
    let inner = widgets::panel(frame, help, "Keyboard Shortcuts", theme::border_focused());

    let mut lines = Vec::new();
    for (title, keys) in SECTIONS {
        lines.push(Line::from(Span::styled(
            format!("  {title}"),
            Style::default().fg(theme::HIGHLIGHT),
        )));
        for (key, desc) in *keys {
            lines.push(Line::from(vec![
                Span::styled(format!("  {key:<10}"), theme::key_hint_key()),
                Span::styled(*desc, theme::key_hint()),
            ]));
        }
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "  Esc or ? to close",
        theme::key_hint(),
    )));
    frame.render_widget(Paragraph::new(lines), inner);
}
