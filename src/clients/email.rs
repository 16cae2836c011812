//! Transactional email relay for out-of-band access and category requests.
//!
//! Speaks the EmailJS-style REST contract: one templated send call with
//! service, template, and public-key identifiers plus free-text template
//! parameters. Nothing else in the service depends on the relay; when it is
//! left unconfigured only the request endpoints fail.

use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email relay is not configured")]
    NotConfigured,
    #[error("email relay rejected the request: {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Clone, Debug)]
pub struct EmailRelayConfig {
    /// Relay base URL, e.g. `https://api.emailjs.com`.
    pub endpoint: String,
    pub service_id: String,
    pub template_id: String,
    /// The relay's public ("user") key.
    pub public_key: String,
    /// Destination address for relayed requests.
    pub admin_email: String,
}

/// An access request submitted by a visitor.
#[derive(Debug, Clone)]
pub struct AccessRequest {
    pub name: String,
    pub email: String,
    pub reason: String,
}

/// A request for a new browsing category.
#[derive(Debug, Clone)]
pub struct CategoryRequest {
    pub name: String,
    pub email: String,
    pub category_name: String,
    pub description: String,
    pub examples: Option<String>,
}

#[derive(Clone)]
pub struct EmailRelayClient {
    config: EmailRelayConfig,
    http: reqwest::Client,
}

impl EmailRelayClient {
    pub fn new(config: EmailRelayConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.service_id.is_empty()
            && !self.config.template_id.is_empty()
            && !self.config.public_key.is_empty()
            && !self.config.admin_email.is_empty()
    }

    pub async fn send_access_request(&self, request: &AccessRequest) -> Result<(), EmailError> {
        self.send(self.access_template_params(request)).await
    }

    pub async fn send_category_request(&self, request: &CategoryRequest) -> Result<(), EmailError> {
        self.send(self.category_template_params(request)).await
    }

    fn access_template_params(&self, request: &AccessRequest) -> Value {
        json!({
            "to_email": self.config.admin_email,
            "from_name": request.name,
            "from_email": request.email,
            "subject": format!("New Access Request from {}", request.name),
            "message": format!(
                "New access request received:\n\nName: {}\nEmail: {}\nReason: {}\n",
                request.name, request.email, request.reason
            ),
        })
    }

    fn category_template_params(&self, request: &CategoryRequest) -> Value {
        let examples = request
            .examples
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or("No examples provided");
        json!({
            "to_email": self.config.admin_email,
            "from_name": request.name,
            "from_email": request.email,
            "category_name": request.category_name,
            "category_description": request.description,
            "category_examples": examples,
            "subject": format!("New Category Request: {}", request.category_name),
            "message": format!(
                "New category request received:\n\nName: {}\nEmail: {}\nCategory Name: {}\nDescription: {}\nExamples: {}\n",
                request.name, request.email, request.category_name, request.description, examples
            ),
        })
    }

    /// Issue one templated send call. Single attempt, no retry.
    #[tracing::instrument(skip(self, template_params))]
    async fn send(&self, template_params: Value) -> Result<(), EmailError> {
        if !self.is_configured() {
            return Err(EmailError::NotConfigured);
        }
        let url = format!("{}/api/v1.0/email/send", self.config.endpoint);
        let payload = json!({
            "service_id": self.config.service_id,
            "template_id": self.config.template_id,
            "user_id": self.config.public_key,
            "template_params": template_params,
        });

        let response = self.http.post(&url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".into());
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!("relay accepted the email");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay(admin_email: &str) -> EmailRelayClient {
        EmailRelayClient::new(EmailRelayConfig {
            endpoint: "http://127.0.0.1:1".into(),
            service_id: "service_test".into(),
            template_id: "template_test".into(),
            public_key: "public_test".into(),
            admin_email: admin_email.into(),
        })
    }

    #[test]
    fn unconfigured_relay_is_detected() {
        assert!(!relay("").is_configured());
        assert!(relay("admin@example.com").is_configured());
    }

    #[test]
    fn access_params_carry_requester_and_destination() {
        let client = relay("admin@example.com");
        let params = client.access_template_params(&AccessRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            reason: "research".into(),
        });
        assert_eq!(params["to_email"], "admin@example.com");
        assert_eq!(params["from_email"], "ada@example.com");
        assert_eq!(params["subject"], "New Access Request from Ada");
        assert!(params["message"].as_str().unwrap().contains("research"));
    }

    #[test]
    fn category_params_default_missing_examples() {
        let client = relay("admin@example.com");
        let params = client.category_template_params(&CategoryRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            category_name: "Compilers".into(),
            description: "Lowering and codegen papers".into(),
            examples: None,
        });
        assert_eq!(params["category_examples"], "No examples provided");
        assert_eq!(params["subject"], "New Category Request: Compilers");
    }
}
