// 🔑 Credential Gate - login overlay
//
// Collects an EB number + password and hands them to the Session Controller.
// The gate keeps its field buffers across open/close cycles; the inline
// error only lives while the prompt is open.

use crate::session::{Route, SessionController};
use serde::Serialize;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateField {
    Identifier,
    Secret,
}

impl GateField {
    pub fn label(&self) -> &str {
        match self {
            GateField::Identifier => "EB Number",
            GateField::Secret => "Password",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            GateField::Identifier => GateField::Secret,
            GateField::Secret => GateField::Identifier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum GateOutcome {
    /// Login succeeded; the session is now on `route`
    Accepted { route: Route },

    /// Login failed; the prompt stays open with `message`
    Rejected { message: String },
}

impl GateOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateOutcome::Accepted { .. })
    }
}

#[derive(Debug, Clone)]
pub struct CredentialGate {
    pub identifier: String,
    pub secret: String,
    pub focus: GateField,
    error: Option<String>,
}

impl Default for CredentialGate {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialGate {
    pub fn new() -> Self {
        CredentialGate {
            identifier: String::new(),
            secret: String::new(),
            focus: GateField::Identifier,
            error: None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Both fields are required; the front end blocks submission until then
    pub fn can_submit(&self) -> bool {
        !self.identifier.is_empty() && !self.secret.is_empty()
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn push_char(&mut self, c: char) {
        self.focused_mut().push(c);
    }

    pub fn pop_char(&mut self) {
        self.focused_mut().pop();
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            GateField::Identifier => &mut self.identifier,
            GateField::Secret => &mut self.secret,
        }
    }

    /// Secret rendered as bullets
    pub fn masked_secret(&self) -> String {
        "•".repeat(self.secret.chars().count())
    }

    pub fn submit(&mut self, session: &mut SessionController) -> GateOutcome {
        if session.request_login(&self.identifier, &self.secret) {
            self.error = None;
            let route = session.complete_login();
            GateOutcome::Accepted { route }
        } else {
            self.error = Some(INVALID_CREDENTIALS_MESSAGE.to_string());
            GateOutcome::Rejected {
                message: INVALID_CREDENTIALS_MESSAGE.to_string(),
            }
        }
    }

    /// Close without validating. Field contents survive, the error does not.
    pub fn dismiss(&mut self, session: &mut SessionController) {
        self.error = None;
        session.close_login_prompt();
    }
}
