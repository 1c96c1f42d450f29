//! Yahoo Finance chart endpoint backend.
//!
//! `GET {base_url}/v8/finance/chart/{TICKER}?interval=1d&range=1d` answers
//! with a JSON document whose `chart.result[0].meta.regularMarketPrice` is the
//! latest traded price.  Unknown symbols come back as HTTP 404 with
//! `chart.error` set.

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

use crate::config::QuoteConfig;
use crate::quote::source::{QuoteError, QuoteSource};

// ---------------------------------------------------------------------------
// YahooQuotes
// ---------------------------------------------------------------------------

/// HTTP quote source.  All connection details come from [`QuoteConfig`].
pub struct YahooQuotes {
    client: reqwest::Client,
    config: QuoteConfig,
}

impl YahooQuotes {
    /// Build a client with the configured timeout and `User-Agent`.
    ///
    /// A default client is used as a last resort if the builder fails.
    pub fn from_config(config: &QuoteConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    /// The ticker is pushed as a single path segment, so `#`, `?` and `/`
    /// are percent-encoded instead of changing the request.
    fn chart_url(&self, ticker: &str) -> Result<Url, QuoteError> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| QuoteError::Request(format!("bad base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| QuoteError::Request("base url cannot take a path".into()))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", ticker]);
        url.query_pairs_mut()
            .clear()
            .append_pair("interval", "1d")
            .append_pair("range", "1d");
        Ok(url)
    }

    async fn chart(&self, ticker: &str) -> Result<Value, QuoteError> {
        let response = self.client.get(self.chart_url(ticker)?).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(QuoteError::Status(status.as_u16()));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| QuoteError::Parse(e.to_string()))
    }
}

/// Pull `regularMarketPrice` out of a chart response.
pub(crate) fn parse_chart_price(json: &Value) -> Result<f64, QuoteError> {
    if let Some(err) = json["chart"]["error"].as_object() {
        let description = err
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(QuoteError::Parse(description.to_string()));
    }

    let price = json["chart"]["result"][0]["meta"]["regularMarketPrice"]
        .as_f64()
        .ok_or(QuoteError::MissingPrice)?;

    if !price.is_finite() || price < 0.0 {
        return Err(QuoteError::Parse(format!("implausible price {price}")));
    }
    Ok(price)
}

#[async_trait]
impl QuoteSource for YahooQuotes {
    async fn fetch_price(&self, ticker: &str) -> Result<f64, QuoteError> {
        let json = self.chart(ticker).await?;
        parse_chart_price(&json)
    }

    /// A ticker exists when the chart endpoint answers 200 with a price.
    async fn ticker_exists(&self, ticker: &str) -> Result<bool, QuoteError> {
        match self.chart(ticker).await {
            Ok(json) => Ok(parse_chart_price(&json).is_ok()),
            Err(QuoteError::Status(404)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_regular_market_price() {
        let body = json!({
            "chart": {
                "result": [{ "meta": { "symbol": "AAPL", "regularMarketPrice": 189.84 } }],
                "error": null
            }
        });
        let price = parse_chart_price(&body).unwrap();
        assert!((price - 189.84).abs() < 1e-9);
    }

    #[test]
    fn chart_error_is_parse_error() {
        let body = json!({
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        });
        let err = parse_chart_price(&body).unwrap_err();
        assert!(matches!(err, QuoteError::Parse(ref d) if d.contains("delisted")));
    }

    #[test]
    fn missing_price_field() {
        let body = json!({ "chart": { "result": [{ "meta": {} }], "error": null } });
        assert!(matches!(
            parse_chart_price(&body),
            Err(QuoteError::MissingPrice)
        ));
    }

    #[test]
    fn chart_url_has_ticker_and_no_double_slash() {
        let config = QuoteConfig {
            base_url: "http://localhost:9999/".into(),
            ..QuoteConfig::default()
        };
        let source = YahooQuotes::from_config(&config);
        assert_eq!(
            source.chart_url("MSFT").unwrap().as_str(),
            "http://localhost:9999/v8/finance/chart/MSFT?interval=1d&range=1d"
        );
    }

    #[test]
    fn url_syntax_in_ticker_stays_in_the_path() {
        let config = QuoteConfig {
            base_url: "http://localhost:9999".into(),
            ..QuoteConfig::default()
        };
        let source = YahooQuotes::from_config(&config);
        let url = source.chart_url("AAPL#x/y?z").unwrap();

        assert_eq!(url.path(), "/v8/finance/chart/AAPL%23x%2Fy%3Fz");
        assert_eq!(url.query(), Some("interval=1d&range=1d"));
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn unparseable_base_url_is_a_request_error() {
        let config = QuoteConfig {
            base_url: "not a url".into(),
            ..QuoteConfig::default()
        };
        let source = YahooQuotes::from_config(&config);
        assert!(matches!(
            source.chart_url("MSFT"),
            Err(QuoteError::Request(_))
        ));
    }

    #[test]
    fn source_is_object_safe() {
        let source: Box<dyn QuoteSource> =
            Box::new(YahooQuotes::from_config(&QuoteConfig::default()));
        drop(source);
    }
}
