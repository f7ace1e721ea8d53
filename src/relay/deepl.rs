use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Url;
use reqwest::header::AUTHORIZATION;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics::{self, outcome};
use crate::models::{DeepLResponse, TranslateParams, TranslateResponse};

pub const PROVIDER: &str = "deepl";

/// Thin DeepL translate client.
///
/// One form-encoded POST per call, authenticated with
/// `Authorization: DeepL-Auth-Key <key>`. The key never leaves the server.
#[derive(Clone)]
pub struct DeepLClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: Option<Arc<str>>,
    timeout: Duration,
}

impl fmt::Debug for DeepLClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepLClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("configured", &self.api_key.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DeepLClient {
    /// # Errors
    ///
    /// `AppError::ConfigError` if the endpoint does not parse or the HTTP
    /// client cannot be built.
    pub fn new(config: &Config) -> AppResult<Self> {
        let endpoint = Url::parse(&config.deepl_api_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid DEEPL_API_URL: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint,
            api_key: config.deepl_api_key.as_deref().map(Arc::from),
            timeout: config.upstream_timeout,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fail fast before the request body is even parsed.
    ///
    /// # Errors
    ///
    /// `AppError::ConfigError` when `DEEPL_API_KEY` is unset.
    pub fn ensure_configured(&self) -> AppResult<()> {
        self.api_key().map(|_| ())
    }

    fn api_key(&self) -> AppResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::ConfigError("DEEPL_API_KEY not configured".into()))
    }

    /// Forward a validated translation request.
    ///
    /// # Errors
    ///
    /// - `AppError::ConfigError` when no key is configured
    /// - `AppError::Upstream` when DeepL answers with a non-success status
    /// - `AppError::OperationTimeout` when DeepL does not answer in time
    /// - `AppError::UpstreamUnavailable` for transport or decode failures
    pub async fn translate(&self, params: &TranslateParams) -> AppResult<TranslateResponse> {
        let api_key = self.api_key()?;

        let mut form = vec![
            ("text", params.text.as_str()),
            ("target_lang", params.target_lang.as_str()),
        ];
        if let Some(source) = params.source_lang.as_deref() {
            form.push(("source_lang", source));
        }

        let started = Instant::now();
        let result = self
            .http
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, format!("DeepL-Auth-Key {api_key}"))
            .form(&form)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => return Err(self.transport_error(e, started)),
        };

        let status = response.status();
        if !status.is_success() {
            metrics::record_upstream_call(
                PROVIDER,
                outcome::UPSTREAM_ERROR,
                started.elapsed().as_secs_f64(),
            );
            warn!(status = status.as_u16(), "DeepL API error");
            return Err(AppError::Upstream {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }

        let body: DeepLResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => return Err(self.transport_error(e, started)),
        };

        let elapsed = started.elapsed();
        metrics::record_upstream_call(PROVIDER, outcome::SUCCESS, elapsed.as_secs_f64());
        debug!(
            segments = body.translations.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "DeepL translation complete"
        );

        let source_lang = body
            .translations
            .first()
            .and_then(|t| t.detected_source_language.clone());

        Ok(TranslateResponse {
            translations: body.translations,
            source_lang,
            provider: PROVIDER,
        })
    }

    fn transport_error(&self, e: reqwest::Error, started: Instant) -> AppError {
        let elapsed = started.elapsed().as_secs_f64();
        if e.is_timeout() {
            metrics::record_upstream_call(PROVIDER, outcome::TIMEOUT, elapsed);
            AppError::OperationTimeout(format!(
                "{PROVIDER} did not respond within {:?}",
                self.timeout
            ))
        } else {
            metrics::record_upstream_call(PROVIDER, outcome::UNAVAILABLE, elapsed);
            AppError::UpstreamUnavailable {
                provider: PROVIDER,
                reason: e.without_url().to_string(),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(url: &str, key: Option<&str>) -> DeepLClient {
        DeepLClient::new(&Config {
            deepl_api_url: url.to_string(),
            deepl_api_key: key.map(str::to_string),
            upstream_timeout: Duration::from_secs(5),
            ..Config::default()
        })
        .unwrap()
    }

    fn params(source: Option<&str>) -> TranslateParams {
        TranslateParams {
            text: "Hallo Welt".to_string(),
            target_lang: "EN".to_string(),
            source_lang: source.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_translate_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/translate")
            .match_header("authorization", "DeepL-Auth-Key test-key")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("text".into(), "Hallo Welt".into()),
                Matcher::UrlEncoded("target_lang".into(), "EN".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"translations":[{"detected_source_language":"DE","text":"Hello world"}]}"#,
            )
            .create_async()
            .await;

        let url = format!("{}/v2/translate", server.url());
        let response = client(&url, Some("test-key"))
            .translate(&params(None))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.provider, "deepl");
        assert_eq!(response.source_lang.as_deref(), Some("DE"));
        assert_eq!(response.translations[0].text, "Hello world");
    }

    #[tokio::test]
    async fn test_source_lang_forwarded() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/translate")
            .match_body(Matcher::UrlEncoded("source_lang".into(), "DE".into()))
            .with_status(200)
            .with_body(r#"{"translations":[{"text":"Hello world"}]}"#)
            .create_async()
            .await;

        let url = format!("{}/v2/translate", server.url());
        let response = client(&url, Some("k"))
            .translate(&params(Some("DE")))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(response.source_lang.is_none());
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v2/translate")
            .with_status(456)
            .with_body(r#"{"message":"Quota exceeded"}"#)
            .create_async()
            .await;

        let url = format!("{}/v2/translate", server.url());
        let err = client(&url, Some("k"))
            .translate(&params(None))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Upstream {
                provider: "deepl",
                status: 456
            }
        ));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v2/translate")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let url = format!("{}/v2/translate", server.url());
        let err = client(&url, Some("k"))
            .translate(&params(None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UpstreamUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let client = client("https://api-free.deepl.com/v2/translate", None);
        assert!(!client.is_configured());
        assert!(matches!(
            client.ensure_configured(),
            Err(AppError::ConfigError(_))
        ));
        assert!(matches!(
            client.translate(&params(None)).await,
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn test_debug_hides_key() {
        let rendered = format!(
            "{:?}",
            client("https://api-free.deepl.com/v2/translate", Some("top-secret"))
        );
        assert!(!rendered.contains("top-secret"));
    }
}
