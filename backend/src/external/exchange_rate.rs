//! USD to INR exchange rate client
//!
//! Fetches a live rate from a configurable endpoint returning
//! `{"rates": {"INR": <rate>}}`. Any failure falls back to the fixed rate
//! used for the seed catalog.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ExchangeRateConfig;
use crate::error::{AppError, AppResult};
use shared::USD_TO_INR_RATE;

/// Exchange rate API client
#[derive(Clone)]
pub struct ExchangeRateClient {
    client: Client,
    endpoint: String,
}

/// Where a rate came from
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    Live,
    Fixed,
}

/// USD to INR conversion rate
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExchangeRate {
    pub base: &'static str,
    pub target: &'static str,
    pub rate: f64,
    pub source: RateSource,
}

impl ExchangeRate {
    fn fixed() -> Self {
        Self::new(USD_TO_INR_RATE, RateSource::Fixed)
    }

    fn new(rate: f64, source: RateSource) -> Self {
        Self {
            base: "USD",
            target: "INR",
            rate,
            source,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

impl ExchangeRateClient {
    pub fn new(config: &ExchangeRateConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: config.api_endpoint.clone(),
        }
    }

    /// Create a client against a custom endpoint (for testing)
    pub fn with_base_url(endpoint: String) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    /// Fetch the live USD to INR rate
    pub async fn fetch_usd_inr(&self) -> AppResult<f64> {
        if self.endpoint.is_empty() {
            return Err(AppError::ExternalService(
                "Exchange rate endpoint is not configured".to_string(),
            ));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Exchange rate request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Exchange rate API error: {}",
                response.status()
            )));
        }

        let body: RatesResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse exchange rate response: {}", e))
        })?;

        parse_inr_rate(&body)
    }

    /// The live rate, or the fixed rate when the API is unavailable
    pub async fn current_rate(&self) -> ExchangeRate {
        match self.fetch_usd_inr().await {
            Ok(rate) => ExchangeRate::new(rate, RateSource::Live),
            Err(e) => {
                if !self.endpoint.is_empty() {
                    tracing::warn!("Using fixed USD/INR rate: {}", e);
                }
                ExchangeRate::fixed()
            }
        }
    }
}

fn parse_inr_rate(body: &RatesResponse) -> AppResult<f64> {
    match body.rates.get("INR") {
        Some(&rate) if rate.is_finite() && rate > 0.0 => Ok(rate),
        Some(&rate) => Err(AppError::ExternalService(format!(
            "Exchange rate API returned an invalid INR rate: {}",
            rate
        ))),
        None => Err(AppError::ExternalService(
            "Exchange rate API response has no INR rate".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> AppResult<f64> {
        let body: RatesResponse = serde_json::from_str(json).unwrap();
        parse_inr_rate(&body)
    }

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse(r#"{"rates":{"INR":83.42,"EUR":0.92}}"#).unwrap(), 83.42);
        assert!(parse(r#"{"rates":{"EUR":0.92}}"#).is_err());
        assert!(parse(r#"{"rates":{"INR":0}}"#).is_err());
    }

    #[test]
    fn test_unconfigured_endpoint_uses_fixed_rate() {
        let client = ExchangeRateClient::with_base_url(String::new());
        let rate = tokio_test::block_on(client.current_rate());

        assert_eq!(rate.rate, USD_TO_INR_RATE);
        assert_eq!(rate.source, RateSource::Fixed);
    }
}
