//! Session manager
//!
//! Owns the single logged-in identity and the credential port. The shell
//! constructs one at startup and asks it before opening the marker workspace.

use super::password::{hash_password, verify_password};
use geomark_core::{
    validation_error, CredentialRecord, CredentialStore, ErrorContext, GeomarkError,
    GeomarkResult, Session,
};
use tracing::{debug, info, warn};

pub struct SessionManager<C> {
    credentials: C,
    session: Option<Session>,
}

impl<C: CredentialStore> SessionManager<C> {
    /// Start logged out
    pub fn new(credentials: C) -> Self {
        Self {
            credentials,
            session: None,
        }
    }

    /// Store a new credential record, replacing any existing one.
    ///
    /// Does not log in.
    pub fn register(&self, username: &str, password: &str) -> GeomarkResult<()> {
        if username.trim().is_empty() {
            return Err(validation_error!(
                "Username must not be empty",
                "username",
                "session"
            ));
        }
        if password.is_empty() {
            return Err(validation_error!(
                "Password must not be empty",
                "password",
                "session"
            ));
        }

        let record = CredentialRecord {
            username: username.to_string(),
            hashed_password: hash_password(password)?,
        };

        match self.credentials.load_credentials() {
            Ok(Some(previous)) if previous.username != record.username => {
                warn!(
                    previous = %previous.username,
                    "Replacing credentials of previously registered user"
                );
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Could not read existing credentials, overwriting them"),
        }

        self.credentials.save_credentials(&record)?;
        info!(username = %record.username, "Registered user");
        Ok(())
    }

    /// Check credentials and establish the session
    pub fn login(&mut self, username: &str, password: &str) -> GeomarkResult<&Session> {
        let record = self
            .credentials
            .load_credentials()?
            .ok_or_else(|| GeomarkError::NotFound {
                resource: "registered user".to_string(),
                context: ErrorContext::new("session")
                    .with_operation("login")
                    .with_suggestion("Register first with 'register <username> <password>'"),
            })?;

        if record.username != username {
            debug!(attempted = %username, "Login rejected: unknown username");
            return Err(invalid_credentials());
        }

        let verified = match verify_password(password, &record.hashed_password) {
            Ok(verified) => verified,
            Err(e) => {
                e.log();
                false
            }
        };
        if !verified {
            warn!(username = %username, "Login rejected: wrong password");
            return Err(invalid_credentials());
        }

        info!(username = %username, "User logged in");
        Ok(&*self.session.insert(Session::new(username)))
    }

    /// End the session. Stored credentials are kept so the user can log back in.
    ///
    /// Returns the session that was closed, if any.
    pub fn logout(&mut self) -> Option<Session> {
        let ended = self.session.take();
        if let Some(session) = &ended {
            info!(username = %session.username, "User logged out");
        }
        ended
    }

    /// Delete the stored credential record and end any session
    pub fn forget_credentials(&mut self) -> GeomarkResult<()> {
        self.credentials.clear_credentials()?;
        self.session = None;
        info!("Cleared stored credentials");
        Ok(())
    }

    pub fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Gate for the marker workspace
    pub fn require_session(&self) -> GeomarkResult<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| GeomarkError::Authentication {
                message: "log in to work with markers".to_string(),
                context: ErrorContext::new("session")
                    .with_operation("require_session")
                    .with_suggestion("Run 'login <username> <password>'"),
            })
    }

    /// Username of the registered user, if one exists
    pub fn registered_username(&self) -> GeomarkResult<Option<String>> {
        Ok(self
            .credentials
            .load_credentials()?
            .map(|record| record.username))
    }
}

fn invalid_credentials() -> GeomarkError {
    GeomarkError::InvalidCredentials {
        message: "invalid login or password".to_string(),
        context: ErrorContext::new("session").with_operation("login"),
    }
}
