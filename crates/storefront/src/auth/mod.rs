//! Authentication session.
//!
//! Owns the bearer token lifecycle and the current [`Session`]:
//!
//! ```text
//! Anonymous --login ok--> Authenticated --logout / token rejected--> Anonymous
//! ```
//!
//! There are no other states and no retries. A failed profile fetch during
//! [`AuthSession::restore`] quietly degrades to anonymous; during
//! [`AuthSession::login`] it is reported as [`AuthError::ProfileUnavailable`].

mod error;
mod token;

pub use error::AuthError;
pub use token::TokenStore;

use boutique_core::{Email, Session, UserProfile};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::IgnoredAny;
use tracing::{info, instrument, warn};

use crate::api::{ApiClient, ApiError, LoginRequest, LoginResponse, ProfileUpdate, RegisterRequest};
use crate::error::{Error, Result};

/// Minimum password length accepted by the backend at registration.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Login form input.
#[derive(Debug, Clone)]
pub struct Credentials {
    email: Email,
    password: SecretString,
}

impl Credentials {
    /// Validate login input before it is sent anywhere.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed address and
    /// `AuthError::MissingPassword` for an empty password.
    pub fn new(email: &str, password: impl Into<String>) -> std::result::Result<Self, AuthError> {
        let email = Email::parse(email)?;
        let password: String = password.into();
        if password.is_empty() {
            return Err(AuthError::MissingPassword);
        }
        Ok(Self {
            email,
            password: SecretString::from(password),
        })
    }

    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }
}

/// Account creation input.
#[derive(Debug, Clone)]
pub struct Registration {
    email: Email,
    password: SecretString,
    first_name: String,
    last_name: String,
    address: Option<String>,
}

impl Registration {
    /// Validate registration input.
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth(InvalidEmail)` for a malformed address and
    /// `Error::InvalidInput` for a short password or blank names.
    pub fn new(
        email: &str,
        password: impl Into<String>,
        first_name: &str,
        last_name: &str,
    ) -> Result<Self> {
        let email = Email::parse(email).map_err(AuthError::from)?;
        let password: String = password.into();
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::InvalidInput(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        let (first_name, last_name) = (first_name.trim(), last_name.trim());
        if first_name.is_empty() || last_name.is_empty() {
            return Err(Error::InvalidInput(
                "first and last name are required".to_string(),
            ));
        }
        Ok(Self {
            email,
            password: SecretString::from(password),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            address: None,
        })
    }

    /// Attach a postal address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        let address = address.into();
        self.address = Some(address.trim().to_string()).filter(|a| !a.is_empty());
        self
    }

    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }
}

/// The authenticated-identity state of this device.
pub struct AuthSession {
    api: ApiClient,
    profile_path: String,
    session: Option<Session>,
}

impl AuthSession {
    /// Create an anonymous auth session. Call [`AuthSession::restore`] to
    /// pick up a token persisted by an earlier run.
    #[must_use]
    pub fn new(api: ApiClient, profile_path: impl Into<String>) -> Self {
        Self {
            api,
            profile_path: profile_path.into(),
            session: None,
        }
    }

    /// Exchange credentials for a token, then load the profile behind it.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidCredentials` if the backend rejects the login
    /// - `AuthError::ProfileUnavailable` if the token was issued but the
    ///   profile fetch failed; the token is cleared again
    /// - `Error::Storage` if the token cannot be persisted
    /// - `Error::Api` for any other backend or network failure
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&mut self, credentials: &Credentials) -> Result<Session> {
        self.session = None;

        let request = LoginRequest {
            email: credentials.email.as_str(),
            password: credentials.password.expose_secret(),
        };
        let response: LoginResponse = match self.api.post("/auth/login", &request).await {
            Ok(response) => response,
            Err(ApiError::Status { status, message }) if is_rejection(status) => {
                info!(status = %status, "Login rejected");
                return Err(AuthError::InvalidCredentials(message).into());
            }
            Err(e) => return Err(Error::Api(e)),
        };

        self.api.tokens().set(Some(&response.access_token))?;

        match self.fetch_profile().await {
            Ok(profile) => {
                let session = Session::new(profile);
                info!(user_id = %session.user_id(), admin = session.is_admin(), "Logged in");
                self.session = Some(session.clone());
                Ok(session)
            }
            Err(e) => {
                warn!(error = %e, "Profile fetch failed after login, discarding token");
                self.api.tokens().clear();
                Err(AuthError::ProfileUnavailable(e).into())
            }
        }
    }

    /// Re-establish a session from a persisted token.
    ///
    /// Never fails: with no token, or a token the backend no longer honours,
    /// the token is cleared and the session stays anonymous.
    #[instrument(skip(self))]
    pub async fn restore(&mut self) -> Option<Session> {
        self.session = None;
        if !self.api.tokens().is_present() {
            return None;
        }

        match self.fetch_profile().await {
            Ok(profile) => {
                let session = Session::new(profile);
                info!(user_id = %session.user_id(), "Session restored");
                self.session = Some(session.clone());
                Some(session)
            }
            Err(e) => {
                warn!(error = %e, "Stored token rejected, continuing anonymously");
                self.api.tokens().clear();
                None
            }
        }
    }

    /// Forget the token and the session. Never fails.
    pub fn logout(&mut self) {
        self.api.tokens().clear();
        if let Some(session) = self.session.take() {
            info!(user_id = %session.user_id(), "Logged out");
        }
    }

    /// True iff a session exists and the token store still holds a token.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some() && self.api.tokens().is_present()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_admin)
    }

    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn profile(&self) -> Option<&UserProfile> {
        self.session.as_ref().map(|session| &session.profile)
    }

    /// Create an account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns `Error::Api` if the backend refuses the registration (for
    /// example, an email already in use), with the backend's message.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<()> {
        let request = RegisterRequest {
            email: registration.email.as_str(),
            password: registration.password.expose_secret(),
            first_name: &registration.first_name,
            last_name: &registration.last_name,
            address: registration.address.as_deref(),
        };
        let _: IgnoredAny = self.api.post("/auth/register", &request).await?;
        info!("Account registered");
        Ok(())
    }

    /// Update the current user's profile and refresh the session copy.
    ///
    /// # Errors
    ///
    /// - `AuthError::Unauthenticated` without a session
    /// - `Error::InvalidInput` for an update with no fields
    /// - `Error::Api` if the backend rejects the update
    #[instrument(skip(self, update))]
    pub async fn update_profile(&mut self, update: &ProfileUpdate) -> Result<UserProfile> {
        if !self.is_authenticated() {
            return Err(AuthError::Unauthenticated.into());
        }
        if update.is_empty() {
            return Err(Error::InvalidInput("nothing to update".to_string()));
        }

        let _: IgnoredAny = self.api.put("/auth/profile", update).await?;
        let profile = self.fetch_profile().await?;
        if let Some(session) = self.session.as_mut() {
            session.profile = profile.clone();
        }
        Ok(profile)
    }

    async fn fetch_profile(&self) -> std::result::Result<UserProfile, ApiError> {
        self.api.get(&self.profile_path).await
    }
}

/// Statuses with which the login endpoint rejects credentials.
fn is_rejection(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST
            | StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN
            | StatusCode::UNPROCESSABLE_ENTITY
    )
}
