//! Session login.
//!
//! One POST with the fixed identity headers and a JSON body of user id and
//! secret. The access token from a success envelope is used as the bearer
//! token for every page request of the run. There is no retry: a rejected
//! credential does not become valid by sending it again.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info};

use scrip_core::{SyncError, SyncResult};

use super::UpstreamClient;
use super::envelope::{Envelope, LoginData};
use crate::Authenticator;

/// Login request body.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub userid: &'a str,
    pub passorpin: &'a str,
}

/// Exchanges configured credentials for a bearer token.
pub struct SessionAuthenticator<'a> {
    client: &'a UpstreamClient,
}

impl<'a> SessionAuthenticator<'a> {
    pub fn new(client: &'a UpstreamClient) -> Self {
        Self { client }
    }

    /// Log in once and return the access token.
    pub async fn authenticate(&self) -> SyncResult<String> {
        let cfg = self.client.config();
        let body = LoginRequest { userid: &cfg.user_id, passorpin: &cfg.password };

        let mut req = self.client.http().post(&cfg.login_url).json(&body);
        for (name, value) in cfg.identity.headers() {
            req = req.header(name, value);
        }

        let resp = req.send().await.map_err(|e| {
            error!(url = %cfg.login_url, "[auth] login request failed: {e}");
            SyncError::Auth { code: String::new(), message: e.to_string() }
        })?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| auth_err(format!("reading login response: {e}")))?;

        let token = parse_login_response(&bytes)?;
        info!(user = %cfg.user_id, "[auth] login succeeded");
        Ok(token)
    }
}

#[async_trait]
impl Authenticator for UpstreamClient {
    async fn authenticate(&self) -> SyncResult<String> {
        SessionAuthenticator::new(self).authenticate().await
    }
}

/// Extract the access token from a login response body.
pub fn parse_login_response(body: &[u8]) -> SyncResult<String> {
    let env: Envelope<LoginData> =
        Envelope::parse(body).map_err(|e| auth_err(format!("malformed login response: {e}")))?;

    if !env.is_success() {
        return Err(SyncError::Auth { code: env.error_code(), message: env.message });
    }

    match env.data {
        Some(LoginData { accesstoken }) if !accesstoken.is_empty() => Ok(accesstoken),
        _ => Err(auth_err("success envelope without access token".into())),
    }
}

fn auth_err(message: String) -> SyncError {
    SyncError::Auth { code: String::new(), message }
}
