// src/domain/provider/alphavantage.rs

// 📦 External crates
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use url::Url;

// 🧠 Internal modules
use super::PriceDataProvider;
use crate::domain::catalog::split_legs;
use crate::domain::errors::PriceError;
use crate::model::{PriceUpdate, Symbol};

pub const ALPHAVANTAGE_BASE_URL: &str = "https://www.alphavantage.co";
const QUERY_PATH: &str = "/query";
const EXCHANGE_RATE_FUNCTION: &str = "CURRENCY_EXCHANGE_RATE";
const LAST_REFRESHED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct AlphaVantageResponse {
    #[serde(rename = "Realtime Currency Exchange Rate")]
    exchange_rate: Option<RealtimeCurrencyExchangeRate>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RealtimeCurrencyExchangeRate {
    #[serde(rename = "5. Exchange Rate")]
    exchange_rate: String,
    #[serde(rename = "6. Last Refreshed")]
    last_refreshed: String,
    #[serde(rename = "7. Time Zone")]
    time_zone: Option<String>,
}

pub struct AlphaVantageClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(base_url: Url, api_key: String) -> Self {
        info!("📡 AlphaVantageClient for '{}' created", base_url);
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    fn query_url(&self, symbol: &Symbol) -> Result<Url, PriceError> {
        let (from_currency, to_currency) = split_legs(symbol.as_str())?;
        let mut url = self.base_url.clone();
        url.set_path(QUERY_PATH);
        url.query_pairs_mut()
            .append_pair("function", EXCHANGE_RATE_FUNCTION)
            .append_pair("from_currency", from_currency)
            .append_pair("to_currency", to_currency)
            .append_pair("apikey", &self.api_key);
        Ok(url)
    }

    async fn request(&self, symbol: &Symbol, url: Url) -> Result<PriceUpdate, PriceError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            let e = e.without_url();
            error!("Request to Alpha Vantage for {symbol} failed: {e}");
            PriceError::ProviderError(format!("request failed: {e}"))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            PriceError::ProviderError(format!("reading response body failed: {}", e.without_url()))
        })?;
        trace!("Raw response from Alpha Vantage for {symbol}: {body}");

        if !status.is_success() {
            return Err(classify_status(status));
        }
        parse_exchange_rate(symbol, &body)
    }
}

#[async_trait]
impl PriceDataProvider for AlphaVantageClient {
    async fn fetch(
        &self,
        symbol: &Symbol,
        cancel: &CancellationToken,
    ) -> Result<PriceUpdate, PriceError> {
        debug!("Fetching {EXCHANGE_RATE_FUNCTION} for {symbol}");
        let url = self.query_url(symbol)?;
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(PriceError::Cancelled),
            result = self.request(symbol, url) => result,
        }
    }
}

fn classify_status(status: StatusCode) -> PriceError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        warn!("Price data provider is unavailable, status code: {status}");
        PriceError::ProviderUnavailable(format!("provider returned status code {status}"))
    } else {
        error!("Error fetching data from Alpha Vantage, status code: {status}");
        PriceError::ProviderError(format!("provider returned status code {status}"))
    }
}

fn parse_exchange_rate(symbol: &Symbol, body: &str) -> Result<PriceUpdate, PriceError> {
    let response: AlphaVantageResponse = serde_json::from_str(body).map_err(|e| {
        error!("Failed to deserialise Alpha Vantage response for {symbol}: {e}");
        PriceError::ProviderError(format!("failed to deserialise response: {e}"))
    })?;

    // Throttled requests still come back as 200 with an explanatory message.
    if let Some(message) = response.note.or(response.information) {
        warn!("Alpha Vantage throttled request for {symbol}: {message}");
        return Err(PriceError::ProviderUnavailable(message));
    }
    if let Some(message) = response.error_message {
        return Err(PriceError::ProviderError(message));
    }

    let Some(rate) = response.exchange_rate else {
        error!("Invalid response from Alpha Vantage for {symbol}: {body}");
        return Err(PriceError::ProviderError(
            "response is missing the exchange rate".into(),
        ));
    };

    let price = rate.exchange_rate.trim().parse::<f64>().map_err(|e| {
        PriceError::ProviderError(format!(
            "invalid exchange rate '{}': {e}",
            rate.exchange_rate
        ))
    })?;
    if !price.is_finite() {
        error!("Non-finite exchange rate from Alpha Vantage for {symbol}: {price}");
        return Err(PriceError::ProviderError(format!(
            "non-finite exchange rate '{}'",
            rate.exchange_rate
        )));
    }
    let refresh_time = parse_last_refreshed(&rate.last_refreshed)?;
    if let Some(zone) = rate.time_zone.as_deref().filter(|z| !z.eq_ignore_ascii_case("UTC")) {
        debug!("Alpha Vantage reported time zone {zone} for {symbol}, reading as UTC");
    }

    trace!("Parsed price update for {symbol}: {price} at {refresh_time}");
    Ok(PriceUpdate::new(symbol.clone(), price, refresh_time))
}

fn parse_last_refreshed(raw: &str) -> Result<DateTime<Utc>, PriceError> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, LAST_REFRESHED_FORMAT)
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)))
        .map_err(|e| PriceError::ProviderError(format!("invalid refresh time '{raw}': {e}")))
}
