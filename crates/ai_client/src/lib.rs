use futures_util::StreamExt;
use models::ContextSnapshot;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use stream_decoder::StreamDecoder;
use thiserror::Error;

/// Configuration for talking to the hosted completion service.
#[derive(Debug, Clone)]
pub struct AssistantClientConfig {
    pub base_url: String,
    pub model: String,
}

impl AssistantClientConfig {
    /// Loads config from env vars:
    /// - `ASSISTANT_BASE_URL` (default: `http://localhost:8787`)
    /// - `ASSISTANT_MODEL`    (default: `gpt-4o-mini`)
    pub fn from_env() -> Self {
        let base_url = std::env::var("ASSISTANT_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8787".to_string());
        let model =
            std::env::var("ASSISTANT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        Self { base_url, model }
    }
}

/// Transport conditions a caller must tell apart. None of these is retried
/// automatically; the user re-invokes the action if they want another try.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("invalid assistant base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("the assistant is receiving too many requests, try again in a moment")]
    RateLimited,

    #[error("the assistant quota is exhausted")]
    QuotaExhausted,

    #[error("assistant request failed with status {0}")]
    Http(StatusCode),

    #[error("network error talking to the assistant: {0}")]
    Network(#[from] reqwest::Error),
}

/// Streaming chat client for the assistant feature.
#[derive(Debug, Clone)]
pub struct AssistantClient {
    http: Client,
    base_url: Url,
    model: String,
}

impl AssistantClient {
    pub fn new(config: AssistantClientConfig) -> Result<Self, AssistantError> {
        let base_url = validate_base_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            base_url,
            model: config.model,
        })
    }

    /// Asks one question about the user's data, streaming the reply.
    ///
    /// The snapshot is embedded in the system prompt so the model can quote
    /// exact figures. `on_delta` runs once per completed content unit; the
    /// accumulated reply is returned when the stream ends. At most one decode
    /// loop runs per call, chunks are processed strictly in order, and
    /// dropping the future stops the loop and releases the connection.
    pub async fn ask_stream<F>(
        &self,
        snapshot: &ContextSnapshot,
        question: &str,
        mut on_delta: F,
    ) -> Result<String, AssistantError>
    where
        F: FnMut(&str),
    {
        let endpoint = self
            .base_url
            .join("v1/chat/completions")
            .map_err(|_| AssistantError::InvalidBaseUrl(self.base_url.to_string()))?;

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            stream: true,
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: build_system_prompt(snapshot),
                },
                Message {
                    role: "user".to_string(),
                    content: question.to_string(),
                },
            ],
        };

        let response = self.http.post(endpoint).json(&request).send().await?;

        // Quota conditions arrive as JSON error bodies, not as a content
        // stream. Short-circuit before any decoding starts.
        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => return Err(AssistantError::RateLimited),
            StatusCode::PAYMENT_REQUIRED => return Err(AssistantError::QuotaExhausted),
            status if !status.is_success() => return Err(AssistantError::Http(status)),
            _ => {}
        }

        let mut decoder = StreamDecoder::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let bytes = chunk?;
            for delta in decoder.feed(&bytes) {
                on_delta(&delta);
            }
            if decoder.is_done() {
                break;
            }
        }

        Ok(decoder.finish())
    }
}

fn build_system_prompt(snapshot: &ContextSnapshot) -> String {
    let data = serde_json::to_string(snapshot).unwrap_or_else(|_| "{}".to_string());
    format!(
        "Você é o assistente financeiro do planejador de viagem. Responda em \
         português, com base apenas nos dados do usuário a seguir. Dados: {data}"
    )
}

fn validate_base_url(base_url: &str) -> Result<Url, AssistantError> {
    let url = Url::parse(base_url)
        .map_err(|_| AssistantError::InvalidBaseUrl(base_url.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(AssistantError::InvalidBaseUrl(base_url.to_string())),
    }

    if url.host_str().is_none() {
        return Err(AssistantError::InvalidBaseUrl(base_url.to_string()));
    }

    Ok(url)
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::FinancialSummary;

    #[test]
    fn test_validate_base_url_accepts_http_and_https() {
        assert!(validate_base_url("http://localhost:8787").is_ok());
        assert!(validate_base_url("https://functions.example.com/ai").is_ok());
    }

    #[test]
    fn test_validate_base_url_rejects_other_schemes() {
        assert!(validate_base_url("ftp://example.com").is_err());
        assert!(validate_base_url("not a url").is_err());
    }

    #[test]
    fn test_system_prompt_embeds_snapshot_figures() {
        let snapshot = ContextSnapshot {
            entradas: vec![],
            saidas: vec![],
            investimentos: vec![],
            resumo: FinancialSummary {
                total_entradas: 1234.5,
                ..Default::default()
            },
            meta_entradas: 9000.0,
        };
        let prompt = build_system_prompt(&snapshot);
        assert!(prompt.contains("1234.5"));
        assert!(prompt.contains("9000"));
    }
}
