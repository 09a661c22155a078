use thiserror::Error;
use uuid::Uuid;

/// Action needs a signed-in user; surfaced verbatim in the UI banner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("This service requires login.")]
pub struct AuthRequired;

/// Token pair snapshot handed to worker threads for authenticated calls.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub token: String,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone)]
struct AuthState {
    username: String,
    token: String,
    refresh_token: Option<String>,
}

/// Per-process identity: the authenticated username while a session token
/// exists, otherwise an anonymous id generated once and stable until exit.
/// Mutated only by login, logout and the explicit token-refresh path.
pub struct Session {
    auth: Option<AuthState>,
    anonymous_id: String,
}

impl Session {
    pub fn new() -> Self {
        Self {
            auth: None,
            anonymous_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.auth.as_ref().map(|auth| auth.username.as_str())
    }

    /// Actor id used for like membership: username when signed in, the
    /// session-stable anonymous id otherwise.
    pub fn actor_id(&self) -> &str {
        match &self.auth {
            Some(auth) => &auth.username,
            None => &self.anonymous_id,
        }
    }

    /// Login gate for every mutation that requires authorship. Aborts the
    /// action before any network call when no session exists.
    pub fn require_auth(&self) -> Result<Credentials, AuthRequired> {
        self.credentials().ok_or(AuthRequired)
    }

    pub fn credentials(&self) -> Option<Credentials> {
        self.auth.as_ref().map(|auth| Credentials {
            token: auth.token.clone(),
            refresh_token: auth.refresh_token.clone(),
        })
    }

    /// Edit/delete affordances: anonymous actors never own anything.
    pub fn owns(&self, author: &str) -> bool {
        self.username().is_some_and(|name| name == author)
    }

    pub fn has_liked(&self, likes: &[String]) -> bool {
        let actor = self.actor_id();
        likes.iter().any(|id| id == actor)
    }

    pub fn login(&mut self, username: String, token: String, refresh_token: Option<String>) {
        self.auth = Some(AuthState {
            username,
            token,
            refresh_token,
        });
    }

    /// Installs the token obtained from a 401 refresh round trip.
    pub fn set_token(&mut self, token: String) {
        if let Some(auth) = &mut self.auth {
            auth.token = token;
        }
    }

    pub fn logout(&mut self) {
        self.auth = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn anonymous_actor_id_is_stable_and_uuid_shaped() {
        let session = Session::new();
        let first = session.actor_id().to_string();
        assert_eq!(session.actor_id(), first);
        assert!(Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn login_switches_actor_to_username_and_logout_restores() {
        let mut session = Session::new();
        let anon = session.actor_id().to_string();
        session.login("alice".into(), "jwt".into(), None);
        assert_eq!(session.actor_id(), "alice");
        session.logout();
        assert_eq!(session.actor_id(), anon);
    }

    #[test]
    fn require_auth_gates_anonymous_actors() {
        let mut session = Session::new();
        assert!(session.require_auth().is_err());
        session.login("alice".into(), "jwt".into(), Some("refresh".into()));
        let creds = session.require_auth().unwrap();
        assert_eq!(creds.token, "jwt");
        assert_eq!(creds.refresh_token.as_deref(), Some("refresh"));
    }

    #[test]
    fn ownership_requires_authenticated_name_match() {
        let mut session = Session::new();
        assert!(!session.owns("alice"));
        session.login("alice".into(), "jwt".into(), None);
        assert!(session.owns("alice"));
        assert!(!session.owns("bob"));
    }

    #[test]
    fn like_membership_follows_actor_identity() {
        let mut session = Session::new();
        let anon = session.actor_id().to_string();
        assert!(session.has_liked(&[anon]));
        session.login("alice".into(), "jwt".into(), None);
        assert!(session.has_liked(&["alice".into()]));
        assert!(!session.has_liked(&["bob".into()]));
    }
}
