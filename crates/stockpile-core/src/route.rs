// ── Routes ──
//
// The screens a front end can show, and the landing decision made from
// the current-session read.

use strum::{Display, EnumIter};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Route {
    /// Session check in progress.
    Landing,
    Login,
    Register,
    Products,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Landing => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Products => "/products",
        }
    }

    /// Routes reachable without a session.
    pub fn is_public(self) -> bool {
        !matches!(self, Self::Products)
    }
}

/// Where the landing route sends the user: the product list when the
/// session read produced a user, the login screen on any failure.
pub fn resolve_landing<T>(session: &Result<T, CoreError>) -> Route {
    match session {
        Ok(_) => Route::Products,
        Err(_) => Route::Login,
    }
}
