//! HTTP client for end-to-end tests
//!
//! When API routes or parameter names change, update only this file.

use super::constants::*;
use reqwest::Response;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    async fn get_with_years(
        &self,
        path: &str,
        year_from: Option<&str>,
        year_to: Option<&str>,
    ) -> Response {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(from) = year_from {
            query.push(("da_anno", from));
        }
        if let Some(to) = year_to {
            query.push(("a_anno", to));
        }
        self.client
            .get(format!("{}{}", self.base_url, path))
            .query(&query)
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn get_home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Request failed")
    }

    /// GET /tabelle_originali/{slug}
    pub async fn get_raw_table(
        &self,
        slug: &str,
        year_from: Option<&str>,
        year_to: Option<&str>,
    ) -> Response {
        self.get_with_years(&format!("/tabelle_originali/{}", slug), year_from, year_to)
            .await
    }

    /// GET /serie-calcolate/{slug}
    pub async fn get_series(
        &self,
        slug: &str,
        year_from: Option<&str>,
        year_to: Option<&str>,
    ) -> Response {
        self.get_with_years(&format!("/serie-calcolate/{}", slug), year_from, year_to)
            .await
    }
}
