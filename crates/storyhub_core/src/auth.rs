//! crates/storyhub_core/src/auth.rs
//!
//! Login, registration and logout. These are the only paths that mutate the
//! session, and they keep "logged in" equal to "a token is persisted".

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::Credentials;
use crate::error::{SyncError, SyncResult};
use crate::ports::{CredentialStore, PortError, RemoteGateway};
use crate::session::{SessionSnapshot, SessionState};

pub struct AuthService {
    gateway: Arc<dyn RemoteGateway>,
    credentials: Arc<dyn CredentialStore>,
    session: Arc<SessionState>,
}

impl AuthService {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        credentials: Arc<dyn CredentialStore>,
        session: Arc<SessionState>,
    ) -> Self {
        Self {
            gateway,
            credentials,
            session,
        }
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    /// Syncs the session with whatever credentials were persisted earlier.
    pub async fn restore(&self) -> SyncResult<Option<Credentials>> {
        let stored = self.credentials.load().await?.filter(|c| c.has_token());
        let snapshot = match &stored {
            Some(c) => SessionSnapshot::logged_in(c.name.clone()),
            None => SessionSnapshot::logged_out(),
        };
        if self.session.get_state() != snapshot {
            self.session.set_state(snapshot);
        }
        Ok(stored)
    }

    pub async fn login(&self, email: &str, password: &str) -> SyncResult<Credentials> {
        require("email", email)?;
        require("password", password)?;

        let outcome = self.gateway.login(email, password).await?;
        let credentials = Credentials::from(outcome);
        if !credentials.has_token() {
            return Err(PortError::Decode("login response carried no token".to_string()).into());
        }
        self.credentials.save(&credentials).await?;
        self.session
            .set_state(SessionSnapshot::logged_in(credentials.name.clone()));
        info!(user = %credentials.name, "Logged in");
        Ok(credentials)
    }

    /// Creates the account, then logs in with the same credentials.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> SyncResult<Credentials> {
        require("name", name)?;
        require("email", email)?;
        require("password", password)?;

        let message = self.gateway.register(name, email, password).await?;
        info!(user = name, "Registered: {}", message);
        self.login(email, password).await
    }

    pub async fn logout(&self) -> SyncResult<()> {
        if let Err(e) = self.credentials.clear().await {
            warn!("Could not clear stored credentials: {}", e);
            return Err(e.into());
        }
        self.session.set_state(SessionSnapshot::logged_out());
        info!("Logged out");
        Ok(())
    }
}

fn require(field: &str, value: &str) -> SyncResult<()> {
    if value.trim().is_empty() {
        return Err(SyncError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}
