//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::fmt;
use std::sync::Arc;

use stockpile_core::{Credentials, Product, Route, User};

use crate::forms::{FormError, ProductSubmission};

/// Notification severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

/// A transient toast message.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

/// Pending confirmation action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteProduct { id: String, name: String },
}

impl fmt::Display for ConfirmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeleteProduct { name, .. } => {
                write!(f, "Delete {name}? This action cannot be undone.")
            }
        }
    }
}

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,

    // ── Navigation ────────────────────────────────────────────────
    Navigate(Route),

    // ── Session ───────────────────────────────────────────────────
    /// The current user, as last read from `/auth/me`.
    SessionResolved(Arc<User>),
    /// A read on a protected view came back 401.
    SessionExpired,
    SubmitLogin(Credentials),
    SubmitRegister(Credentials),
    AuthSucceeded,
    AuthFailed(FormError),
    Logout,
    LoggedOut,

    // ── Products data ─────────────────────────────────────────────
    ProductsLoading,
    ProductsLoaded(Arc<Vec<Product>>),
    ProductsFailed(String),
    RefreshProducts,
    /// The whole query cache was emptied.
    CacheCleared,

    // ── Product writes ────────────────────────────────────────────
    SubmitProduct(ProductSubmission),
    ProductSaved(Product),
    ProductSaveFailed(FormError),
    ProductDeleted { name: String },

    // ── Confirmation Dialog ───────────────────────────────────────
    ShowConfirm(ConfirmAction),
    ConfirmYes,
    ConfirmNo,

    // ── Help ──────────────────────────────────────────────────────
    ToggleHelp,

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
}
