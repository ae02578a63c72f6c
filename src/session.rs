// 🔐 Session Controller - authentication + prompt visibility + route gating
//
// Owns the only session state in the portal:
// - authenticated (never reverts; there is no logout)
// - login_prompt_visible
// - current route
//
// The credential check is a fixed-pair placeholder, not a security mechanism.
// No rate limiting and no lockout.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// ============================================================================
// CREDENTIALS
// ============================================================================

/// One identifier/secret pair (EB number + password)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub identifier: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Credentials {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    pub fn matches(&self, identifier: &str, secret: &str) -> bool {
        self.identifier == identifier && self.secret == secret
    }
}

// ============================================================================
// ROUTES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// `/` - public landing page
    Landing,

    /// `/dashboard` - billing, authenticated only
    Billing,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Billing => "/dashboard",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "" => Some(Route::Landing),
            "/dashboard" | "dashboard" => Some(Route::Billing),
            _ => None,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Route::Landing => "Home",
            Route::Billing => "Dashboard",
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Billing)
    }
}

/// What the navigation bar offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavItem {
    Login,
    Dashboard,
}

impl NavItem {
    pub fn label(&self) -> &str {
        match self {
            NavItem::Login => "Login",
            NavItem::Dashboard => "Dashboard",
        }
    }
}

// ============================================================================
// SESSION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub authenticated: bool,
    pub login_prompt_visible: bool,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            authenticated: false,
            login_prompt_visible: false,
        }
    }
}

/// Serializable view of the session for front ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub authenticated: bool,
    pub login_prompt_visible: bool,
    pub current_path: &'static str,
    pub nav: NavItem,
}

#[derive(Debug, Clone)]
pub struct SessionController {
    session: Session,
    accepted: Credentials,
    current: Route,
}

impl SessionController {
    pub fn new(accepted: Credentials) -> Self {
        SessionController {
            session: Session::default(),
            accepted,
            current: Route::Landing,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.authenticated
    }

    pub fn is_login_prompt_visible(&self) -> bool {
        self.session.login_prompt_visible
    }

    /// Compare against the accepted pair. A mismatch leaves the session untouched.
    pub fn request_login(&mut self, identifier: &str, secret: &str) -> bool {
        if self.accepted.matches(identifier, secret) {
            self.session.authenticated = true;
            info!(identifier, "login accepted");
            true
        } else {
            warn!(identifier, "login rejected");
            false
        }
    }

    pub fn open_login_prompt(&mut self) {
        self.session.login_prompt_visible = true;
        debug!("login prompt opened");
    }

    pub fn close_login_prompt(&mut self) {
        self.session.login_prompt_visible = false;
        debug!("login prompt closed");
    }

    /// Where a request for `route` actually lands
    pub fn resolve(&self, route: Route) -> Route {
        if route.requires_auth() && !self.session.authenticated {
            Route::Landing
        } else {
            route
        }
    }

    /// Move to `route`, silently redirected to landing when not allowed
    pub fn navigate(&mut self, route: Route) -> Route {
        let resolved = self.resolve(route);
        if resolved != route {
            debug!(requested = route.path(), resolved = resolved.path(), "redirected");
        }
        self.current = resolved;
        resolved
    }

    /// Successful login: close the prompt and go to billing in one step
    pub fn complete_login(&mut self) -> Route {
        self.close_login_prompt();
        self.navigate(Route::Billing)
    }

    pub fn current_route(&self) -> Route {
        self.current
    }

    pub fn current_path(&self) -> &'static str {
        self.current.path()
    }

    pub fn nav_item(&self) -> NavItem {
        if self.session.authenticated {
            NavItem::Dashboard
        } else {
            NavItem::Login
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            authenticated: self.session.authenticated,
            login_prompt_visible: self.session.login_prompt_visible,
            current_path: self.current_path(),
            nav: self.nav_item(),
        }
    }
}
