//! Session management: login, logout and the session encoding.
//!
//! The session is either fully present (id + encoding) or absent. Reads go
//! through a `parking_lot` lock and never wait on the network; login and
//! logout are serialised by an async mutex so two concurrent logins cannot
//! interleave their logout/login pairs.

use std::fmt;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use engage_transport::Transport;

use super::core::EngageClient;
use crate::error::{EngageError, Result};
use crate::payload;

/// An authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    id: String,
    encoding: String,
}

impl Session {
    /// Build a session from the login response fields.
    pub fn new(id: impl Into<String>, encoding: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            encoding: encoding.into(),
        }
    }

    /// `SESSIONID` returned at login.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// `SESSION_ENCODING` returned at login, attached to every later call.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &"<redacted>")
            .field("encoding_len", &self.encoding.len())
            .finish()
    }
}

/// API login credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Login name.
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Session slot plus the lock serialising login/logout.
#[derive(Debug, Default)]
pub(super) struct SessionState {
    current: RwLock<Option<Session>>,
    auth: Mutex<()>,
}

impl SessionState {
    pub(super) fn snapshot(&self) -> Option<Session> {
        self.current.read().clone()
    }

    pub(super) fn encoding(&self) -> Option<String> {
        self.current.read().as_ref().map(|s| s.encoding.clone())
    }

    pub(super) fn is_active(&self) -> bool {
        self.current.read().is_some()
    }

    fn replace(&self, session: Option<Session>) {
        *self.current.write() = session;
    }
}

impl<T: Transport + 'static> EngageClient<T> {
    /// Whether a session is held.
    pub fn is_logged_in(&self) -> bool {
        self.inner.session.is_active()
    }

    /// Current session, if any.
    pub fn session(&self) -> Option<Session> {
        self.inner.session.snapshot()
    }

    /// Log in with the credentials supplied at construction.
    pub async fn login(&self) -> Result<()> {
        let credentials = self
            .inner
            .credentials
            .clone()
            .ok_or_else(|| EngageError::Authentication("no credentials configured".to_string()))?;
        self.login_with(&credentials).await
    }

    /// Log in with explicit credentials.
    ///
    /// An existing session is logged out first. If that logout fails the
    /// failure is logged and the login is attempted anyway.
    #[instrument(skip_all, fields(username = %credentials.username()))]
    pub async fn login_with(&self, credentials: &Credentials) -> Result<()> {
        let _guard = self.inner.session.auth.lock().await;

        if self.inner.session.is_active() {
            match self.logout_locked().await {
                Ok(true) => {}
                Ok(false) => warn!("logout before login was rejected; logging in anyway"),
                Err(e) => warn!(error = %e, "logout before login failed; logging in anyway"),
            }
        }

        let response = self
            .inner
            .protocol
            .send(payload::login(&credentials.username, &credentials.password), None)
            .await?;

        if !response.is_success() {
            let reason = response
                .error_message()
                .unwrap_or_else(|| "login rejected".to_string());
            warn!(reason = %reason, "login failed");
            return Err(EngageError::Authentication(reason));
        }

        let id = response.field("SESSIONID").filter(|v| !v.is_empty());
        let encoding = response.field("SESSION_ENCODING").filter(|v| !v.is_empty());
        match (id, encoding) {
            (Some(id), Some(encoding)) => {
                self.inner.session.replace(Some(Session::new(id, encoding)));
                info!("logged in");
                Ok(())
            }
            _ => Err(EngageError::Authentication(
                "login response is missing SESSIONID or SESSION_ENCODING".to_string(),
            )),
        }
    }

    /// End the session.
    ///
    /// Returns `Ok(false)` without contacting the server when no session is
    /// held, and `Ok(false)` when the server rejects the logout; in that case
    /// the session is kept. Only a confirmed logout clears it.
    pub async fn logout(&self) -> Result<bool> {
        let _guard = self.inner.session.auth.lock().await;
        self.logout_locked().await
    }

    async fn logout_locked(&self) -> Result<bool> {
        let Some(session) = self.inner.session.snapshot() else {
            return Ok(false);
        };

        let response = self
            .inner
            .protocol
            .send(payload::logout(), Some(session.encoding))
            .await?;

        if response.is_success() {
            self.inner.session.replace(None);
            info!("logged out");
            Ok(true)
        } else {
            warn!(
                reason = %response.error_message().unwrap_or_default(),
                "logout rejected; keeping session"
            );
            Ok(false)
        }
    }
}
