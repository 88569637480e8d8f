//! Client for the third-party APIs the server proxies: random dog images,
//! HTTP status cats and current weather.
//!
//! Every failure, including timeouts and non-200 answers, surfaces as
//! [`Error::Upstream`] carrying a caller-safe message. Details go to the log.

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::config::UpstreamConfig;
use crate::error::{Error, Result};

const DOG_ERROR: &str = "API error";
const CAT_ERROR: &str = "Invalid status code or API error";
const WEATHER_ERROR: &str = "Could not fetch weather data";

#[derive(Debug, Clone, Serialize)]
pub struct CatImage {
    pub status_code: u16,
    pub image_url: String,
}

#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub async fn random_dog(&self) -> Result<Value> {
        let body = self
            .get_json(&self.config.dog_api_url, &[], DOG_ERROR)
            .await?;

        if body.get("status").and_then(Value::as_str) == Some("success") {
            Ok(body)
        } else {
            tracing::warn!("Dog API returned a non-success payload");
            Err(Error::Upstream(DOG_ERROR.to_string()))
        }
    }

    pub async fn http_cat(&self, status_code: u16) -> Result<CatImage> {
        if !(100..=599).contains(&status_code) {
            return Err(Error::Upstream(CAT_ERROR.to_string()));
        }

        let image_url = format!(
            "{}/{status_code}",
            self.config.cat_api_url.trim_end_matches('/')
        );

        let response = self.client.get(&image_url).send().await.map_err(|e| {
            tracing::warn!("Cat API request failed: {e}");
            Error::Upstream(CAT_ERROR.to_string())
        })?;

        if response.status() != StatusCode::OK {
            tracing::warn!("Cat API answered {}", response.status());
            return Err(Error::Upstream(CAT_ERROR.to_string()));
        }

        Ok(CatImage {
            status_code,
            image_url,
        })
    }

    pub async fn weather(&self, city_name: &str) -> Result<Value> {
        let Some(api_key) = self.config.weather_api_key.as_deref() else {
            tracing::warn!("Weather API key is not configured");
            return Err(Error::Upstream(WEATHER_ERROR.to_string()));
        };

        self.get_json(
            &self.config.weather_api_url,
            &[("q", city_name), ("appid", api_key), ("units", "metric")],
            WEATHER_ERROR,
        )
        .await
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)], message: &str) -> Result<Value> {
        let upstream_err = |detail: String| {
            tracing::warn!("Upstream request to {url} failed: {detail}");
            Error::Upstream(message.to_string())
        };

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| upstream_err(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(upstream_err(format!("status {}", response.status())));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| upstream_err(e.to_string()))
    }
}
