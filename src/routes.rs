//! Navigation and the route guard for protected views.
//!
//! [`Navigator`] is the client's history stack. [`RouteGuard`] sits in front
//! of a protected view and decides, from the current [`Session`], whether to
//! wait, show the view, or send the user to the sign-in page once.

use crate::session::{Session, SessionStatus};
use tracing::{debug, info};

/// Views the client knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Upload surface. Default view.
    Home,
    /// The user's conversions. Requires a session.
    Dashboard,
    Login,
    Register,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Dashboard => "/dashboard",
            Route::Login => "/login",
            Route::Register => "/register",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        match path.trim_end_matches('/') {
            "" => Some(Route::Home),
            "/dashboard" => Some(Route::Dashboard),
            "/login" => Some(Route::Login),
            "/register" => Some(Route::Register),
            _ => None,
        }
    }

    pub fn is_protected(self) -> bool {
        matches!(self, Route::Dashboard)
    }
}

/// History stack plus the location to return to after sign-in.
#[derive(Debug, Clone)]
pub struct Navigator {
    history: Vec<String>,
    return_to: Option<String>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            history: vec![Route::Home.path().to_string()],
            return_to: None,
        }
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &str {
        self.history.last().map(String::as_str).unwrap_or("/")
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn push(&mut self, location: impl Into<String>) {
        let location = location.into();
        debug!("Navigate: {}", location);
        self.history.push(location);
    }

    /// Replace the current entry instead of adding one.
    pub fn replace(&mut self, location: impl Into<String>) {
        let location = location.into();
        debug!("Navigate (replace): {}", location);
        match self.history.last_mut() {
            Some(last) => *last = location,
            None => self.history.push(location),
        }
    }

    pub fn back(&mut self) -> Option<String> {
        if self.history.len() > 1 {
            self.history.pop()
        } else {
            None
        }
    }

    pub fn record_return_target(&mut self, location: impl Into<String>) {
        self.return_to = Some(location.into());
    }

    pub fn return_target(&self) -> Option<&str> {
        self.return_to.as_deref()
    }

    /// Navigate after a successful sign-in: to the recorded target if there
    /// is one (consuming it), otherwise to the default view.
    pub fn complete_sign_in(&mut self) -> String {
        let target = self
            .return_to
            .take()
            .unwrap_or_else(|| Route::Home.path().to_string());
        info!("Signed in, returning to {}", target);
        self.replace(target.clone());
        target
    }
}

/// What the guarded view should do for this render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session unresolved: show a neutral waiting indicator.
    Waiting,
    /// Show the protected view.
    Admit,
    /// Sent to the sign-in page; `from` is where the user wanted to go.
    Redirected { from: String },
}

/// Admits or redirects navigation to one protected view.
#[derive(Debug, Default)]
pub struct RouteGuard {
    redirected: bool,
}

impl RouteGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide for one render. Redirects at most once while the session stays
    /// anonymous; later renders report `Redirected` without touching history.
    pub fn evaluate(
        &mut self,
        session: &Session,
        requested: &str,
        navigator: &mut Navigator,
    ) -> GuardDecision {
        match session.status() {
            SessionStatus::Unresolved => GuardDecision::Waiting,
            SessionStatus::Authenticated => {
                self.redirected = false;
                GuardDecision::Admit
            }
            SessionStatus::Anonymous => {
                if !self.redirected {
                    self.redirected = true;
                    navigator.record_return_target(requested);
                    navigator.push(Route::Login.path());
                    info!("Not signed in, redirecting {} to sign-in", requested);
                }
                GuardDecision::Redirected {
                    from: requested.to_string(),
                }
            }
        }
    }
}
