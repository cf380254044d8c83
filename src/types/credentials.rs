//! Credential Types
//!
//! Client credentials and the grant used to obtain the first access token.

use secrecy::{ExposeSecret, SecretString};

use crate::builders::CredentialsBuilder;
use crate::error::{ApiError, ApiResult};
use crate::types::config::env_var;

/// Scope requested when none is configured: every read and write scope.
pub const DEFAULT_SCOPE: &str = "read_station read_thermostat write_thermostat read_camera write_camera access_camera read_presence access_presence read_smokedetector read_homecoach";

/// How the first access token is obtained.
#[derive(Clone, Debug)]
pub enum Grant {
    /// Resource owner password grant.
    Password {
        username: String,
        password: SecretString,
    },
    /// Authorization code grant.
    AuthorizationCode {
        code: SecretString,
        redirect_uri: Option<String>,
    },
    /// Token issued out of band. No token request is made.
    PreissuedToken { token: SecretString },
}

impl Grant {
    /// `grant_type` form value, `None` for pre-issued tokens.
    pub fn grant_type(&self) -> Option<&'static str> {
        match self {
            Self::Password { .. } => Some("password"),
            Self::AuthorizationCode { .. } => Some("authorization_code"),
            Self::PreissuedToken { .. } => None,
        }
    }
}

/// Credentials supplied by the caller. Immutable once built.
#[derive(Clone, Debug)]
pub struct Credentials {
    /// OAuth2 client ID. Optional only for pre-issued tokens.
    pub client_id: Option<String>,
    /// OAuth2 client secret. Optional only for pre-issued tokens.
    pub client_secret: Option<SecretString>,
    /// Space separated scopes.
    pub scope: String,
    /// Grant used by `authenticate`.
    pub grant: Grant,
}

impl Credentials {
    /// Start a credentials builder.
    pub fn builder() -> CredentialsBuilder {
        CredentialsBuilder::new()
    }

    /// Credentials for an already issued access token.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            client_id: None,
            client_secret: None,
            scope: DEFAULT_SCOPE.to_string(),
            grant: Grant::PreissuedToken {
                token: SecretString::new(token.into()),
            },
        }
    }

    /// Read credentials from `NETATMO_*` environment variables.
    pub fn from_env() -> ApiResult<Self> {
        let mut builder = CredentialsBuilder::new();
        if let Some(v) = env_var("NETATMO_CLIENT_ID") {
            builder = builder.client_id(v);
        }
        if let Some(v) = env_var("NETATMO_CLIENT_SECRET") {
            builder = builder.client_secret(v);
        }
        if let Some(v) = env_var("NETATMO_SCOPE") {
            builder = builder.scope(v);
        }
        if let Some(v) = env_var("NETATMO_ACCESS_TOKEN") {
            builder = builder.access_token(v);
        }
        if let Some(v) = env_var("NETATMO_USERNAME") {
            builder = builder.username(v);
        }
        if let Some(v) = env_var("NETATMO_PASSWORD") {
            builder = builder.password(v);
        }
        if let Some(v) = env_var("NETATMO_CODE") {
            builder = builder.code(v);
        }
        if let Some(v) = env_var("NETATMO_REDIRECT_URI") {
            builder = builder.redirect_uri(v);
        }
        builder.build()
    }

    /// Client ID and secret, or a validation error naming the missing one.
    pub(crate) fn client_pair(&self) -> ApiResult<(&str, &str)> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| ApiError::validation("Authenticate 'client_id' not set."))?;
        let client_secret = self
            .client_secret
            .as_ref()
            .map(|s| s.expose_secret().as_str())
            .ok_or_else(|| ApiError::validation("Authenticate 'client_secret' not set."))?;
        Ok((client_id, client_secret))
    }

    /// Form for the initial token request.
    pub(crate) fn token_form(&self) -> ApiResult<Vec<(String, String)>> {
        let (client_id, client_secret) = self.client_pair()?;

        let mut form = vec![
            ("client_id".to_string(), client_id.to_string()),
            ("client_secret".to_string(), client_secret.to_string()),
            ("scope".to_string(), self.scope.clone()),
        ];

        match &self.grant {
            Grant::Password { username, password } => {
                form.push(("grant_type".to_string(), "password".to_string()));
                form.push(("username".to_string(), username.clone()));
                form.push(("password".to_string(), password.expose_secret().clone()));
            }
            Grant::AuthorizationCode { code, redirect_uri } => {
                form.push(("grant_type".to_string(), "authorization_code".to_string()));
                form.push(("code".to_string(), code.expose_secret().clone()));
                if let Some(redirect_uri) = redirect_uri {
                    form.push(("redirect_uri".to_string(), redirect_uri.clone()));
                }
            }
            Grant::PreissuedToken { .. } => {
                return Err(ApiError::validation("No valid authentication parameters set."));
            }
        }

        Ok(form)
    }

    /// Form for a refresh token request.
    pub(crate) fn refresh_form(&self, refresh_token: &str) -> ApiResult<Vec<(String, String)>> {
        let (client_id, client_secret) = self.client_pair()?;
        Ok(vec![
            ("grant_type".to_string(), "refresh_token".to_string()),
            ("refresh_token".to_string(), refresh_token.to_string()),
            ("client_id".to_string(), client_id.to_string()),
            ("client_secret".to_string(), client_secret.to_string()),
        ])
    }
}
