//! Account use-cases: sign-up, sign-in, sign-out and display name.
//!
//! # Invariants
//! - Usernames are unique in `profiles`; the check runs before the auth user
//!   is created.
//! - Passwords never reach the logs.
//! - `display_username` never fails; it falls back to `"User"`.

use crate::backend::{
    AuthBackend, AuthFailure, Backend, BackendError, Filter, JsonMap, SelectQuery, Table,
};
use crate::model::account::{Profile, UserIdentity, FALLBACK_USERNAME};
use log::{error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub type AccountResult<T> = Result<T, AccountError>;

#[derive(Debug)]
pub enum AccountError {
    /// A required field is blank.
    MissingFields,
    InvalidEmail,
    UsernameTaken,
    EmailTaken,
    InvalidCredentials,
    Backend(BackendError),
}

impl Display for AccountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFields => write!(f, "please fill in all fields"),
            Self::InvalidEmail => write!(f, "email address is not valid"),
            Self::UsernameTaken => write!(f, "username is already taken"),
            Self::EmailTaken => write!(f, "email is already registered"),
            Self::InvalidCredentials => write!(f, "invalid login credentials"),
            Self::Backend(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BackendError> for AccountError {
    fn from(value: BackendError) -> Self {
        match value {
            BackendError::Auth(AuthFailure::InvalidCredentials) => Self::InvalidCredentials,
            BackendError::Auth(AuthFailure::EmailTaken) => Self::EmailTaken,
            other => Self::Backend(other),
        }
    }
}

/// Account service over an injected backend.
pub struct AccountService<B: Backend + AuthBackend> {
    backend: B,
}

impl<B: Backend + AuthBackend> AccountService<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Registers a user and stores their username profile.
    ///
    /// Does not sign the new user in.
    pub fn sign_up(&self, email: &str, password: &str, username: &str) -> AccountResult<Profile> {
        let email = email.trim();
        let username = username.trim();
        if email.is_empty() || password.is_empty() || username.is_empty() {
            return Err(AccountError::MissingFields);
        }
        if !EMAIL_RE.is_match(email) {
            return Err(AccountError::InvalidEmail);
        }

        let taken = self.backend.select(
            &SelectQuery::new(Table::Profiles)
                .columns(&["id"])
                .filter(Filter::eq("username", username))
                .limit(1),
        )?;
        if matches!(&taken, Value::Array(rows) if !rows.is_empty()) {
            return Err(AccountError::UsernameTaken);
        }

        let user = self.backend.sign_up(email, password).map_err(|err| {
            warn!("event=account_sign_up module=service status=error error={err}");
            AccountError::from(err)
        })?;

        let mut row = JsonMap::new();
        row.insert("id".to_string(), json!(user.id.to_string()));
        row.insert("username".to_string(), json!(username));
        self.backend.insert(Table::Profiles, &[row]).map_err(|err| {
            error!("event=account_sign_up module=service status=error step=profile error={err}");
            AccountError::from(err)
        })?;

        info!("event=account_sign_up module=service status=ok");
        Ok(Profile {
            id: user.id,
            username: username.to_string(),
        })
    }

    /// Verifies credentials and starts a session.
    pub fn sign_in(&self, email: &str, password: &str) -> AccountResult<UserIdentity> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AccountError::MissingFields);
        }
        let user = self.backend.sign_in(email.trim(), password)?;
        info!("event=account_sign_in module=service status=ok");
        Ok(user)
    }

    pub fn sign_out(&self) -> AccountResult<()> {
        self.backend.sign_out()?;
        info!("event=account_sign_out module=service status=ok");
        Ok(())
    }

    pub fn current_user(&self) -> AccountResult<Option<UserIdentity>> {
        Ok(self.backend.current_user()?)
    }

    /// Username of the signed-in user, or `"User"` when it cannot be resolved.
    pub fn display_username(&self) -> String {
        match self.lookup_username() {
            Ok(Some(username)) => username,
            Ok(None) => FALLBACK_USERNAME.to_string(),
            Err(err) => {
                error!("event=account_username module=service status=error error={err}");
                FALLBACK_USERNAME.to_string()
            }
        }
    }

    fn lookup_username(&self) -> Result<Option<String>, BackendError> {
        let Some(user) = self.backend.current_user()? else {
            return Ok(None);
        };
        let payload = self.backend.select(
            &SelectQuery::new(Table::Profiles)
                .columns(&["username"])
                .filter(Filter::eq("id", user.id.to_string()))
                .limit(1),
        )?;

        Ok(payload
            .get(0)
            .and_then(|row| row.get("username"))
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string))
    }
}
