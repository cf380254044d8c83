//! Request Executor
//!
//! Sends authenticated API requests. GET requests carry the token in an
//! `Authorization: Bearer` header; POST requests carry it as an
//! `access_token` form field, which is what the API expects for writes.

use std::sync::Arc;
use tracing::{debug, trace};

use crate::core::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::error::{ConfigurationError, TransportError};
use crate::services::RequestDescriptor;
use crate::session::SessionManager;
use crate::types::NetatmoConfig;

/// Build a request for `path`.
///
/// GET params become the query string, POST params the form body. A token is
/// sent as a bearer header on GET and as an `access_token` field on POST,
/// replacing any caller-supplied one.
pub(crate) fn build_request(
    config: &NetatmoConfig,
    method: HttpMethod,
    path: &str,
    params: &[(String, String)],
    token: Option<&str>,
) -> Result<HttpRequest, ConfigurationError> {
    let mut url = config.endpoint_url(path)?;

    let request = match method {
        HttpMethod::Get => {
            if !params.is_empty() {
                url.query_pairs_mut().extend_pairs(params);
            }
            let request = HttpRequest::get(url.as_str());
            match token {
                Some(token) => request.header("authorization", format!("Bearer {}", token)),
                None => request,
            }
        }
        HttpMethod::Post => match token {
            Some(token) => {
                let mut fields: Vec<(String, String)> = params
                    .iter()
                    .filter(|(k, _)| k != "access_token")
                    .cloned()
                    .collect();
                fields.push(("access_token".to_string(), token.to_string()));
                HttpRequest::post_form(url.as_str(), &fields)
            }
            None => HttpRequest::post_form(url.as_str(), params),
        },
    };

    Ok(request
        .header("accept", "application/json")
        .timeout(config.timeout))
}

/// Executes requests on behalf of the current session.
#[derive(Clone)]
pub struct RequestExecutor {
    session: SessionManager,
    transport: Arc<dyn HttpTransport>,
}

impl RequestExecutor {
    /// Create an executor reading tokens from `session`.
    pub fn new(session: SessionManager, transport: Arc<dyn HttpTransport>) -> Self {
        Self { session, transport }
    }

    /// Send a described request, attaching the token when it requires auth.
    pub async fn execute(
        &self,
        descriptor: &RequestDescriptor,
    ) -> Result<HttpResponse, TransportError> {
        let token = if descriptor.requires_auth {
            Some(self.token()?)
        } else {
            None
        };
        self.send(
            descriptor.method,
            descriptor.path,
            &descriptor.params,
            token.as_deref(),
        )
        .await
    }

    /// GET `path` with `query` appended verbatim.
    pub async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<HttpResponse, TransportError> {
        let token = self.token()?;
        self.send(HttpMethod::Get, path, query, Some(&token)).await
    }

    /// POST `form` to `path`, adding the access token to the form.
    pub async fn post(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<HttpResponse, TransportError> {
        let token = self.token()?;
        self.send(HttpMethod::Post, path, form, Some(&token)).await
    }

    async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        params: &[(String, String)],
        token: Option<&str>,
    ) -> Result<HttpResponse, TransportError> {
        let request = build_request(self.session.config(), method, path, params, token)
            .map_err(|e| TransportError::InvalidRequest {
                message: e.to_string(),
            })?;

        debug!(path, method = method.as_str(), params = params.len(), "Sending request");

        let response = self.transport.send(request).await?;
        trace!(path, status = response.status, "Request completed");
        Ok(response)
    }

    fn token(&self) -> Result<String, TransportError> {
        self.session
            .access_token()
            .ok_or(TransportError::NotAuthenticated)
    }
}
