use async_trait::async_trait;
use serde::Deserialize;

/// Supplies the EUR→BRL exchange rate on demand.
///
/// `None` means no conversion is available (provider unreachable, malformed
/// payload, or a non-positive quote); the summary then reports unconverted
/// BRL values instead of treating zero as a real rate.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn eur_brl_rate(&self) -> Option<f64>;
}

/// Fetches the EUR→BRL bid from the AwesomeAPI quote endpoint.
pub struct AwesomeApiRateProvider {
    http: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct QuotePayload {
    #[serde(rename = "EURBRL")]
    eur_brl: Option<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    bid: String,
}

impl AwesomeApiRateProvider {
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    async fn fetch(&self) -> anyhow::Result<f64> {
        let payload: QuotePayload = self
            .http
            .get(&self.endpoint)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let quote = payload
            .eur_brl
            .ok_or_else(|| anyhow::anyhow!("quote payload missing EURBRL"))?;
        Ok(quote.bid.parse::<f64>()?)
    }
}

#[async_trait]
impl RateProvider for AwesomeApiRateProvider {
    async fn eur_brl_rate(&self) -> Option<f64> {
        match self.fetch().await {
            Ok(rate) if rate > 0.0 && rate.is_finite() => Some(rate),
            Ok(rate) => {
                tracing::warn!(rate, "discarding non-positive exchange rate");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "exchange rate fetch failed");
                None
            }
        }
    }
}

/// Fixed-rate provider for tests and offline runs.
pub struct FixedRateProvider(pub Option<f64>);

#[async_trait]
impl RateProvider for FixedRateProvider {
    async fn eur_brl_rate(&self) -> Option<f64> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_payload_parsing() {
        let payload: QuotePayload =
            serde_json::from_str(r#"{"EURBRL": {"bid": "6.1234"}}"#).unwrap();
        assert_eq!(payload.eur_brl.unwrap().bid, "6.1234");
    }

    #[test]
    fn test_quote_payload_missing_pair() {
        let payload: QuotePayload = serde_json::from_str(r#"{}"#).unwrap();
        assert!(payload.eur_brl.is_none());
    }

    #[tokio::test]
    async fn test_fixed_provider_passthrough() {
        assert_eq!(FixedRateProvider(Some(6.0)).eur_brl_rate().await, Some(6.0));
        assert_eq!(FixedRateProvider(None).eur_brl_rate().await, None);
    }
}
