use crate::config::TranslationConfig;
use crate::error::{PencilTextError, Result};
use reqwest::blocking::Client;
use serde_json::Value;
use std::fmt::Debug;
use url::Url;

/// A service that turns text in one language into another.
///
/// Implementations are called sequentially, one request per unique text,
/// and may fail on any single call with [`PencilTextError::ProviderError`].
pub trait Translator: Debug {
    fn translate(&self, text: &str, source_language: &str, target_language: &str) -> Result<String>;
}

/// Client for the public `translate_a/single` endpoint.
#[derive(Debug)]
pub struct HttpTranslator {
    client: Client,
    endpoint: Url,
}

impl HttpTranslator {
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("pencil-text/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PencilTextError::Config {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Translator for HttpTranslator {
    fn translate(&self, text: &str, source_language: &str, target_language: &str) -> Result<String> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("client", "gtx"),
                ("sl", source_language),
                ("tl", target_language),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(provider_error)?;

        let body: Value = response.json().map_err(provider_error)?;
        parse_gtx_response(&body)
    }
}

fn provider_error(error: reqwest::Error) -> PencilTextError {
    PencilTextError::ProviderError {
        message: error.to_string(),
    }
}

/// The endpoint answers with nested arrays; the first element lists the
/// translated segments, each starting with the translated fragment.
pub fn parse_gtx_response(body: &Value) -> Result<String> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| PencilTextError::ProviderError {
            message: "unexpected response shape".to_string(),
        })?;

    Ok(segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect())
}
