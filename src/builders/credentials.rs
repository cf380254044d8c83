//! Credentials Builder
//!
//! Collects loose authentication inputs and selects the grant.

use secrecy::SecretString;

use crate::error::{ApiError, ApiResult};
use crate::types::{Credentials, Grant, DEFAULT_SCOPE};

/// Credentials builder.
///
/// Grant precedence: access token, then username and password, then
/// authorization code.
#[derive(Default)]
pub struct CredentialsBuilder {
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    scope: Option<String>,
    access_token: Option<SecretString>,
    username: Option<String>,
    password: Option<SecretString>,
    code: Option<SecretString>,
    redirect_uri: Option<String>,
}

impl CredentialsBuilder {
    /// Create new credentials builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set client ID.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set client secret.
    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::new(client_secret.into()));
        self
    }

    /// Set requested scopes (space separated).
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Use an already issued access token.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(SecretString::new(token.into()));
        self
    }

    /// Set username for the password grant.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password for the password grant.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::new(password.into()));
        self
    }

    /// Set authorization code.
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(SecretString::new(code.into()));
        self
    }

    /// Set redirect URI sent with the code grant.
    pub fn redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Build the credentials.
    pub fn build(self) -> ApiResult<Credentials> {
        let scope = self
            .scope
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SCOPE.to_string());

        if let Some(token) = self.access_token {
            return Ok(Credentials {
                client_id: self.client_id,
                client_secret: self.client_secret,
                scope,
                grant: Grant::PreissuedToken { token },
            });
        }

        if self.client_id.is_none() {
            return Err(ApiError::validation("Authenticate 'client_id' not set."));
        }
        if self.client_secret.is_none() {
            return Err(ApiError::validation("Authenticate 'client_secret' not set."));
        }

        let grant = match (self.username, self.password, self.code) {
            (Some(username), Some(password), _) => Grant::Password { username, password },
            (_, _, Some(code)) => Grant::AuthorizationCode {
                code,
                redirect_uri: self.redirect_uri,
            },
            _ => return Err(ApiError::validation("No valid authentication parameters set.")),
        };

        Ok(Credentials {
            client_id: self.client_id,
            client_secret: self.client_secret,
            scope,
            grant,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_token_takes_precedence() {
        let credentials = CredentialsBuilder::new()
            .access_token("T")
            .username("u")
            .password("p")
            .build()
            .unwrap();

        assert!(matches!(credentials.grant, Grant::PreissuedToken { .. }));
    }

    #[test]
    fn test_password_before_code() {
        let credentials = CredentialsBuilder::new()
            .client_id("id")
            .client_secret("secret")
            .username("u")
            .password("p")
            .code("c")
            .build()
            .unwrap();

        assert_eq!(credentials.grant.grant_type(), Some("password"));
    }

    #[test]
    fn test_username_without_password_falls_back_to_code() {
        let credentials = CredentialsBuilder::new()
            .client_id("id")
            .client_secret("secret")
            .username("u")
            .code("c")
            .build()
            .unwrap();

        assert_eq!(credentials.grant.grant_type(), Some("authorization_code"));
    }

    #[test]
    fn test_missing_client_id() {
        let error = CredentialsBuilder::new()
            .client_secret("secret")
            .code("c")
            .build()
            .unwrap_err();

        assert_eq!(error.kind, ErrorKind::Validation);
        assert_eq!(error.message, "Authenticate 'client_id' not set.");
    }

    #[test]
    fn test_missing_client_secret() {
        let error = CredentialsBuilder::new()
            .client_id("id")
            .code("c")
            .build()
            .unwrap_err();

        assert_eq!(error.message, "Authenticate 'client_secret' not set.");
    }

    #[test]
    fn test_no_grant_inputs() {
        let error = CredentialsBuilder::new()
            .client_id("id")
            .client_secret("secret")
            .username("u")
            .build()
            .unwrap_err();

        assert_eq!(error.message, "No valid authentication parameters set.");
    }

    #[test]
    fn test_blank_scope_uses_default() {
        let credentials = CredentialsBuilder::new().access_token("T").scope("  ").build().unwrap();
        assert_eq!(credentials.scope, DEFAULT_SCOPE);
    }
}
