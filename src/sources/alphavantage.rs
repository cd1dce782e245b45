//! Alpha Vantage API client for live stock quotes.
//!
//! Wraps the GLOBAL_QUOTE endpoint. The free tier is heavily rate limited
//! (25 requests/day); limit notices come back as 200 responses carrying a
//! "Note" or "Information" field instead of quote data, so those are mapped
//! to errors here and the caller falls back to synthetic prices.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage global quote response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    pub global_quote: Option<GlobalQuote>,
    /// Rate limit notice (newer API responses)
    #[serde(rename = "Information")]
    pub information: Option<String>,
    /// Rate limit notice (older API responses)
    #[serde(rename = "Note")]
    pub note: Option<String>,
    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,
}

/// Global quote data. Only the fields the game reads; everything arrives as
/// strings and is parsed downstream.
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalQuote {
    #[serde(rename = "01. symbol")]
    pub symbol: String,
    #[serde(rename = "05. price")]
    pub price: String,
    #[serde(rename = "09. change")]
    pub change: String,
    #[serde(rename = "10. change percent")]
    pub change_percent: String,
}

/// Alpha Vantage API client.
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
}

impl AlphaVantageClient {
    /// Create a new Alpha Vantage client with a bounded request timeout.
    pub fn new(api_key: String, timeout: Duration) -> Self {
        // Builder failure here would mean a broken TLS backend; fall back to
        // the default client rather than refusing to start.
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, api_key }
    }

    /// Get the global quote for a symbol. Rate limit notices, missing quote
    /// payloads, HTTP failures, and timeouts all surface as Err.
    pub async fn get_quote(&self, symbol: &str) -> Result<GlobalQuote, String> {
        let url = format!(
            "{}?function=GLOBAL_QUOTE&symbol={}&apikey={}",
            ALPHA_VANTAGE_URL, symbol, self.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("API error: {}", response.status()));
        }

        let data: GlobalQuoteResponse = response
            .json()
            .await
            .map_err(|e| format!("Parse error: {}", e))?;

        if let Some(info) = data.information {
            return Err(format!("Rate limited: {}", info));
        }
        if let Some(note) = data.note {
            return Err(format!("Rate limited: {}", note));
        }
        if let Some(msg) = data.error_message {
            return Err(format!("API error: {}", msg));
        }

        match data.global_quote {
            Some(quote) if !quote.price.is_empty() => Ok(quote),
            _ => Err("No quote data available".to_string()),
        }
    }

    /// Parse change percent string (e.g., "1.23%" -> 1.23).
    pub fn parse_change_percent(s: &str) -> f64 {
        s.trim_end_matches('%').parse().unwrap_or(0.0)
    }
}
