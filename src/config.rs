use crate::clients::{email::EmailRelayConfig, imagekit::AccountConfig};
use crate::models::provider::ProviderTag;
use anyhow::{Context, Result};
use clap::Parser;
use std::env;

pub const DEFAULT_UPLOAD_URL: &str = "https://upload.imagekit.io/api/v1/files/upload";
pub const DEFAULT_API_URL: &str = "https://api.imagekit.io/v1";
pub const DEFAULT_EMAIL_ENDPOINT: &str = "https://api.emailjs.com";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments; provider and relay
/// credentials come from the environment only.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub small_account: AccountConfig,
    pub large_account: AccountConfig,
    pub upload_url: String,
    pub api_url: String,
    pub email: EmailRelayConfig,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "PDF document library API")]
pub struct Args {
    /// Host to bind to (overrides PDF_LIBRARY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PDF_LIBRARY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides PDF_LIBRARY_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("PDF_LIBRARY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("PDF_LIBRARY_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing PDF_LIBRARY_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading PDF_LIBRARY_PORT"),
        };
        let env_db = env::var("PDF_LIBRARY_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/pdf_library.db".into());

        // --- Storage accounts (env-only; empty keys mean "not configured") ---
        let small_account = AccountConfig {
            tag: ProviderTag::ImagekitSmall,
            public_key: env::var("IMAGEKIT_SMALL_PUBLIC_KEY").unwrap_or_default(),
            private_key: env::var("IMAGEKIT_SMALL_PRIVATE_KEY").unwrap_or_default(),
            folder: "/pdf-library/small-pdfs".into(),
            file_prefix: "small".into(),
        };
        let large_account = AccountConfig {
            tag: ProviderTag::ImagekitLarge,
            public_key: env::var("IMAGEKIT_PUBLIC_KEY").unwrap_or_default(),
            private_key: env::var("IMAGEKIT_PRIVATE_KEY").unwrap_or_default(),
            folder: "/pdf-library/large-pdfs".into(),
            file_prefix: "large".into(),
        };

        let email = EmailRelayConfig {
            endpoint: env::var("EMAILJS_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_EMAIL_ENDPOINT.into()),
            service_id: env::var("EMAILJS_SERVICE_ID").unwrap_or_default(),
            template_id: env::var("EMAILJS_TEMPLATE_ID").unwrap_or_default(),
            public_key: env::var("EMAILJS_PUBLIC_KEY").unwrap_or_default(),
            admin_email: env::var("PDF_LIBRARY_ADMIN_EMAIL").unwrap_or_default(),
        };

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            small_account,
            large_account,
            upload_url: env::var("IMAGEKIT_UPLOAD_URL")
                .unwrap_or_else(|_| DEFAULT_UPLOAD_URL.into()),
            api_url: env::var("IMAGEKIT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into()),
            email,
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
