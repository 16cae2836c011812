//! Client for one ImageKit-compatible storage account.
//!
//! Uploads are signed multipart POSTs against the provider's upload
//! endpoint; deletion is a private-key authenticated call against the
//! management API. Every call is a single attempt — no retry, no backoff.
//! This module is the only place that performs network I/O against the
//! storage providers.

use crate::models::provider::ProviderTag;
use bytes::Bytes;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::{Rng, distributions::Alphanumeric};
use serde::Deserialize;
use sha1::Sha1;
use thiserror::Error;

type HmacSha1 = Hmac<Sha1>;

/// Signed requests are valid for 40 minutes.
const SIGNATURE_TTL_SECS: i64 = 2400;
const TOKEN_LEN: usize = 24;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} upload failed: {status}: {message}")]
    Rejected {
        provider: ProviderTag,
        status: u16,
        message: String,
    },
    #[error("{provider} reported an error: {message}")]
    Api {
        provider: ProviderTag,
        message: String,
    },
    #[error("storage account `{0}` is not configured")]
    NotConfigured(ProviderTag),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Credentials and naming rules for one storage account.
#[derive(Clone, Debug)]
pub struct AccountConfig {
    pub tag: ProviderTag,
    pub public_key: String,
    pub private_key: String,
    /// Remote folder uploads land in, e.g. `/pdf-library/small-pdfs`.
    pub folder: String,
    /// Prefix stamped onto remote file names, e.g. `small`.
    pub file_prefix: String,
}

/// Result of a successful upload call, as reported by the provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUpload {
    pub file_id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub file_path: Option<String>,
    pub size: i64,
}

struct AuthParams {
    token: String,
    expire: String,
    signature: String,
}

#[derive(Clone)]
pub struct ImageKitClient {
    account: AccountConfig,
    upload_url: String,
    api_url: String,
    http: reqwest::Client,
}

impl ImageKitClient {
    pub fn new(account: AccountConfig, upload_url: String, api_url: String) -> Self {
        Self {
            account,
            upload_url,
            api_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn tag(&self) -> ProviderTag {
        self.account.tag
    }

    pub fn is_configured(&self) -> bool {
        !self.account.public_key.is_empty() && !self.account.private_key.is_empty()
    }

    /// Generate one-shot auth parameters for an upload request.
    ///
    /// The signature is a lowercase hex HMAC-SHA1 of `token + expire` keyed
    /// with the account's private key, which is what the upload endpoint
    /// verifies.
    fn auth_params(&self) -> Result<AuthParams, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured(self.account.tag));
        }
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        let expire = (Utc::now().timestamp() + SIGNATURE_TTL_SECS).to_string();
        let signature = sign(&self.account.private_key, &token, &expire);
        Ok(AuthParams {
            token,
            expire,
            signature,
        })
    }

    /// Upload a PDF payload to this account.
    ///
    /// Issues one authenticated multipart POST. Any non-success status or an
    /// error-shaped response body surfaces as a `ProviderError` carrying the
    /// provider's message.
    #[tracing::instrument(skip(self, payload), fields(account = %self.account.tag))]
    pub async fn upload(
        &self,
        file_name: &str,
        payload: Bytes,
    ) -> Result<ProviderUpload, ProviderError> {
        let auth = self.auth_params()?;
        let remote_name = format!(
            "{}_{}_{}",
            self.account.file_prefix,
            Utc::now().timestamp_millis(),
            sanitize_file_name(file_name)
        );

        let part = reqwest::multipart::Part::stream(payload)
            .file_name(remote_name.clone())
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("fileName", remote_name)
            .text("folder", self.account.folder.clone())
            .text("publicKey", self.account.public_key.clone())
            .text("signature", auth.signature)
            .text("expire", auth.expire)
            .text("token", auth.token)
            .text("useUniqueFileName", "true");

        let response = self.http.post(&self.upload_url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".into());
            return Err(ProviderError::Rejected {
                provider: self.account.tag,
                status: status.as_u16(),
                message,
            });
        }

        // The provider can return 200 with an error payload; check for the
        // error shape before treating the body as an upload result.
        let body: serde_json::Value = response.json().await?;
        if let Some(message) = body
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return Err(ProviderError::Api {
                provider: self.account.tag,
                message: message.to_string(),
            });
        }

        let uploaded: ProviderUpload =
            serde_json::from_value(body).map_err(|err| ProviderError::Api {
                provider: self.account.tag,
                message: format!("unable to parse upload response: {err}"),
            })?;

        tracing::info!(url = %uploaded.url, "payload uploaded");
        Ok(uploaded)
    }

    /// Delete a previously uploaded file from this account.
    ///
    /// A missing remote file counts as success so deletion stays idempotent.
    #[tracing::instrument(skip(self), fields(account = %self.account.tag))]
    pub async fn delete_file(&self, file_id: &str) -> Result<(), ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured(self.account.tag));
        }
        let url = format!("{}/files/{}", self.api_url, file_id);
        let response = self
            .http
            .delete(&url)
            .basic_auth(&self.account.private_key, Some(""))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(file_id, "remote file already missing");
            return Ok(());
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".into());
            return Err(ProviderError::Rejected {
                provider: self.account.tag,
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

/// Replace anything outside `[A-Za-z0-9.-]` with `_` so the remote name
/// survives the provider's file name rules.
pub(crate) fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn sign(private_key: &str, token: &str, expire: &str) -> String {
    let mut mac =
        HmacSha1::new_from_slice(private_key.as_bytes()).expect("hmac accepts keys of any length");
    mac.update(token.as_bytes());
    mac.update(expire.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_account(public_key: &str, private_key: &str) -> AccountConfig {
        AccountConfig {
            tag: ProviderTag::ImagekitSmall,
            public_key: public_key.into(),
            private_key: private_key.into(),
            folder: "/pdf-library/small-pdfs".into(),
            file_prefix: "small".into(),
        }
    }

    #[test]
    fn signature_matches_known_hmac_sha1_vector() {
        // RFC 2202-style vector: HMAC-SHA1("key", "The quick brown fox
        // jumps over the lazy dog"), split across token and expire since
        // the signature covers their concatenation.
        let signature = sign("key", "The quick brown fox jumps over", " the lazy dog");
        assert_eq!(signature, "de7c9b85b8b78aa6bc8a7a36f70a90701c9db4d9");
    }

    #[test]
    fn sanitize_replaces_disallowed_characters() {
        assert_eq!(
            sanitize_file_name("my report (final).pdf"),
            "my_report__final_.pdf"
        );
        assert_eq!(sanitize_file_name("already-safe.1.pdf"), "already-safe.1.pdf");
    }

    #[test]
    fn auth_params_require_credentials() {
        let client = ImageKitClient::new(
            test_account("", ""),
            "http://127.0.0.1:1/upload".into(),
            "http://127.0.0.1:1/api".into(),
        );
        assert!(!client.is_configured());
        assert!(matches!(
            client.auth_params(),
            Err(ProviderError::NotConfigured(ProviderTag::ImagekitSmall))
        ));
    }

    #[test]
    fn auth_params_are_fresh_per_call() {
        let client = ImageKitClient::new(
            test_account("pk", "sk"),
            "http://127.0.0.1:1/upload".into(),
            "http://127.0.0.1:1/api".into(),
        );
        let a = client.auth_params().unwrap();
        let b = client.auth_params().unwrap();
        assert_eq!(a.token.len(), TOKEN_LEN);
        assert_ne!(a.token, b.token);
        assert_eq!(a.signature, sign("sk", &a.token, &a.expire));
    }
}
