//! Machine translation clients.

use async_trait::async_trait;
use ecow::{EcoString, eco_format};
use serde::Deserialize;
use unic_langid::LanguageIdentifier;

/// The outcome of one translation call. Failures carry a diagnostic.
pub type TranslateResult = Result<String, EcoString>;

/// Translates text from the configured source language.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translates `text` into `target`.
    async fn translate(&self, text: &str, target: &LanguageIdentifier) -> TranslateResult;
}

/// The MyMemory translation endpoint.
#[derive(Debug, Clone)]
pub struct MyMemoryTranslator {
    client: reqwest::Client,
    endpoint: String,
    email: String,
    source: LanguageIdentifier,
}

impl MyMemoryTranslator {
    /// Creates a client for `endpoint`, identifying with `email`.
    pub fn new(endpoint: &str, email: &str, source: LanguageIdentifier) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_owned(),
            email: email.to_owned(),
            source,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryResponse {
    response_data: Option<ResponseData>,
    response_status: Option<serde_json::Value>,
    response_details: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseData {
    translated_text: Option<String>,
}

impl MyMemoryResponse {
    /// The status code, which the endpoint sends as a number or a string.
    fn status(&self) -> Option<u64> {
        match self.response_status.as_ref()? {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn into_result(self) -> TranslateResult {
        let status = self.status();
        if status != Some(200) {
            let details = self.response_details.unwrap_or_default();
            return Err(match status {
                Some(status) => eco_format!("status {status}: {details}"),
                None => eco_format!("no status: {details}"),
            });
        }
        match self.response_data.and_then(|data| data.translated_text) {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err("empty translation".into()),
        }
    }
}

/// Parses a MyMemory response body.
fn parse_response(body: &str) -> TranslateResult {
    let response: MyMemoryResponse =
        serde_json::from_str(body).map_err(|err| eco_format!("invalid response: {err}"))?;
    response.into_result()
}

#[async_trait]
impl Translator for MyMemoryTranslator {
    async fn translate(&self, text: &str, target: &LanguageIdentifier) -> TranslateResult {
        let langpair = format!("{}|{target}", self.source);
        log::debug!("translating {text:?} ({langpair})");
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", text),
                ("langpair", langpair.as_str()),
                ("de", self.email.as_str()),
            ])
            .send()
            .await
            .map_err(|err| eco_format!("request failed: {err}"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| eco_format!("read response: {err}"))?;
        if !status.is_success() {
            return Err(eco_format!("http {status}: {body}"));
        }
        parse_response(&body)
    }
}
