use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid bot url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Raw outcome of a bot call. Non-2xx statuses and unparseable bodies are data here,
/// the caller decides what they mean.
#[derive(Debug, Clone)]
pub struct BotResponse {
    pub status: StatusCode,
    pub body: String,
}

impl BotResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// Best-effort parse of the body.
    pub fn json<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_str(&self.body).ok()
    }

    async fn read(resp: reqwest::Response) -> Result<Self, BotError> {
        let status = resp.status();
        let body = resp.text().await?;
        Ok(Self { status, body })
    }
}

/// Remote bot REST surface. `base_url` is passed per call because the host can change it
/// at any time through global settings.
pub trait BotApi: Send + Sync + 'static {
    fn post(
        &self,
        base_url: &str,
        path: &str,
        auth: &str,
        body: &Value,
    ) -> impl Future<Output = Result<BotResponse, BotError>> + Send;

    fn get(
        &self,
        base_url: &str,
        path: &str,
    ) -> impl Future<Output = Result<BotResponse, BotError>> + Send;
}

/// Trims the configured URL and strips trailing slashes; `None` when nothing is left.
pub fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

pub fn endpoint_url(base_url: &str, path: &str) -> Result<Url, BotError> {
    let base = base_url.trim().trim_end_matches('/');
    let raw = format!("{base}{}", normalize_path(path));
    Url::parse(&raw).map_err(|source| BotError::InvalidUrl { url: raw, source })
}

pub struct BotClient {
    http: reqwest::Client,
}

impl BotClient {
    /// No request timeout beyond the transport default.
    pub fn new() -> Result<Self, BotError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http })
    }
}

impl BotApi for BotClient {
    async fn post(
        &self,
        base_url: &str,
        path: &str,
        auth: &str,
        body: &Value,
    ) -> Result<BotResponse, BotError> {
        let url = endpoint_url(base_url, path)?;
        let resp = self
            .http
            .post(url)
            .header(AUTHORIZATION, auth)
            .json(body)
            .send()
            .await?;
        BotResponse::read(resp).await
    }

    async fn get(&self, base_url: &str, path: &str) -> Result<BotResponse, BotError> {
        let url = endpoint_url(base_url, path)?;
        let resp = self.http.get(url).send().await?;
        BotResponse::read(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasagent_protocol::LockdownStatus;

    #[test]
    fn base_url_is_trimmed_and_unslashed() {
        assert_eq!(
            normalize_base_url("  http://localhost:5000/ ").as_deref(),
            Some("http://localhost:5000")
        );
        assert_eq!(normalize_base_url("   "), None);
        assert_eq!(normalize_base_url("/"), None);
    }

    #[test]
    fn endpoint_joins_base_and_path() {
        let url = endpoint_url("http://localhost:5000/", "skip").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/skip");

        let url = endpoint_url("http://bot.local:8080", "/TASagentBotAPI/Mic/Effect").unwrap();
        assert_eq!(url.path(), "/TASagentBotAPI/Mic/Effect");
    }

    #[test]
    fn garbage_base_url_is_rejected() {
        let err = endpoint_url("not a url", "/x").unwrap_err();
        assert!(matches!(err, BotError::InvalidUrl { .. }));
    }

    #[test]
    fn json_is_best_effort() {
        let ok = BotResponse::new(StatusCode::OK, r#"{"locked":true}"#);
        assert_eq!(ok.json::<LockdownStatus>(), Some(LockdownStatus { locked: true }));

        let bad = BotResponse::new(StatusCode::OK, "<html>");
        assert_eq!(bad.json::<LockdownStatus>(), None);
        assert!(!BotResponse::new(StatusCode::NOT_FOUND, "").is_ok());
    }
}
