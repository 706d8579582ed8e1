use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{Result, StockError};

/// Scope requested for spreadsheet reads.
pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens expiring sooner than this are refreshed before use.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Authorized-user token cache as stored in `token.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedToken {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl CachedToken {
    /// Whether the access token can be used at `now` without a refresh.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match (&self.token, self.expiry) {
            (Some(token), Some(expiry)) if !token.is_empty() => {
                expiry - now > Duration::seconds(EXPIRY_MARGIN_SECS)
            }
            _ => false,
        }
    }
}

/// OAuth client section of a downloaded client-secrets file.
#[derive(Debug, Clone, Deserialize)]
struct ClientSecrets {
    #[serde(alias = "web")]
    installed: ClientSecret,
}

#[derive(Debug, Clone, Deserialize)]
struct ClientSecret {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Produces bearer tokens from the on-disk cache, refreshing and rewriting
/// it when the cached token has expired.
///
/// The interactive consent flow is not provided: the cache must be seeded
/// with a refresh token beforehand.
#[derive(Debug, Clone)]
pub struct TokenCache {
    token_file: PathBuf,
    credentials_file: Option<PathBuf>,
    client: Client,
}

impl TokenCache {
    pub fn new(token_file: PathBuf, credentials_file: Option<PathBuf>, client: Client) -> Self {
        Self {
            token_file,
            credentials_file,
            client,
        }
    }

    /// Returns a usable access token.
    #[instrument(level = "debug", skip(self), fields(token_file = %self.token_file.display()))]
    pub fn access_token(&self) -> Result<String> {
        let mut cached = self.load()?;
        let now = Utc::now();
        if let (true, Some(token)) = (cached.is_valid_at(now), &cached.token) {
            debug!("using cached access token");
            return Ok(token.clone());
        }

        self.refresh(&mut cached, now)?;
        self.store(&cached)?;
        info!("access token refreshed");
        cached
            .token
            .ok_or_else(|| StockError::Credentials("refresh returned no token".into()))
    }

    fn load(&self) -> Result<CachedToken> {
        if !self.token_file.exists() {
            return Err(StockError::Credentials(format!(
                "token cache {} not found; authorize the application once to create it",
                self.token_file.display()
            )));
        }
        let data = fs::read_to_string(&self.token_file)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn store(&self, token: &CachedToken) -> Result<()> {
        let data = serde_json::to_string_pretty(token)?;
        fs::write(&self.token_file, data)?;
        Ok(())
    }

    fn refresh(&self, cached: &mut CachedToken, now: DateTime<Utc>) -> Result<()> {
        let refresh_token = cached.refresh_token.clone().ok_or_else(|| {
            StockError::Credentials("token expired and no refresh token is cached".into())
        })?;

        if cached.client_id.is_none() || cached.client_secret.is_none() {
            let secret = self.client_secret()?;
            cached.client_id = Some(secret.client_id);
            cached.client_secret = Some(secret.client_secret);
            if let Some(token_uri) = secret.token_uri {
                cached.token_uri = token_uri;
            }
        }

        let client_id = cached.client_id.clone().unwrap_or_default();
        let client_secret = cached.client_secret.clone().unwrap_or_default();
        let response = self
            .client
            .post(&cached.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StockError::Transport {
                operation: "token refresh",
                message: format!("{status}: {body}"),
            });
        }

        let refreshed: RefreshResponse = response.json()?;
        cached.token = Some(refreshed.access_token);
        cached.expiry = refreshed
            .expires_in
            .map(|seconds| now + Duration::seconds(seconds));
        if cached.scopes.is_empty() {
            cached.scopes = vec![SHEETS_READONLY_SCOPE.to_string()];
        }
        Ok(())
    }

    fn client_secret(&self) -> Result<ClientSecret> {
        let path = self.credentials_file.as_deref().ok_or_else(|| {
            StockError::Credentials(
                "token cache has no client id and no credentials_file is configured".into(),
            )
        })?;
        read_client_secret(path)
    }
}

fn read_client_secret(path: &Path) -> Result<ClientSecret> {
    let data = fs::read_to_string(path)?;
    let secrets: ClientSecrets = serde_json::from_str(&data)?;
    Ok(secrets.installed)
}
