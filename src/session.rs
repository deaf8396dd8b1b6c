use std::fmt;

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_smithy_types::date_time::Format;

/// Temporary credentials returned by STS GetSessionToken.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    /// Expiry in RFC 3339 format.
    pub expiration: String,
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &"** redacted **")
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Exchanges an MFA device and code for temporary credentials.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RequestSessionToken {
    async fn session_token(
        &self,
        device: &str,
        code: &str,
        duration: Option<i32>,
    ) -> Result<SessionCredentials>;
}

#[async_trait]
impl RequestSessionToken for aws_sdk_sts::Client {
    async fn session_token(
        &self,
        device: &str,
        code: &str,
        duration: Option<i32>,
    ) -> Result<SessionCredentials> {
        let output = self
            .get_session_token()
            .set_duration_seconds(duration)
            .serial_number(device)
            .token_code(code)
            .send()
            .await
            .context("GetSessionToken request failed")?;
        let credentials = output.credentials().context("No credentials returned")?;

        Ok(SessionCredentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expiration: credentials.expiration().fmt(Format::DateTime)?,
        })
    }
}
