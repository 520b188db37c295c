use crate::Result;
use crate::annotated::SampleReader;
use crate::error::InfluxError;
use crate::query::FluxQuery;
use common::config::InfluxConfig;
use common::types::Sample;
use logging::*;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    dialect: Dialect,
}

#[derive(Debug, Serialize)]
struct Dialect {
    header: bool,
    delimiter: &'static str,
    annotations: [&'static str; 3],
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            header: true,
            delimiter: ",",
            annotations: ["datatype", "group", "default"],
        }
    }
}

/// InfluxDB がエラー時に返す JSON
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// One connection to the store, held for the whole run.
pub struct InfluxClient {
    client: Client,
    base_url: String,
    org: String,
    token: String,
}

impl InfluxClient {
    pub fn new(config: &InfluxConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder().timeout(config.timeout()?).build()?;
        Ok(Self {
            client,
            base_url: normalize_base_url(&config.url),
            org: config.org.clone(),
            token: config.token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run `query` and decode every row of the response.
    pub async fn query(&self, query: &FluxQuery) -> Result<Vec<Sample>> {
        let log = DEFAULT.new(o!(
            "function" => "InfluxClient::query",
            "bucket" => query.bucket().to_string(),
            "measurement" => query.measurement().to_string(),
        ));
        trace!(log, "start");

        let body = self.query_csv(&query.to_flux()).await?;
        let samples = SampleReader::new(body.as_bytes()).collect::<Result<Vec<_>>>()?;

        debug!(log, "finish"; "samples" => samples.len());
        Ok(samples)
    }

    /// Raw annotated CSV for a Flux script.
    pub async fn query_csv(&self, flux: &str) -> Result<String> {
        let log = DEFAULT.new(o!("function" => "InfluxClient::query_csv"));
        debug!(log, "sending query"; "flux" => flux);

        let url = format!("{}/api/v2/query", self.base_url);
        let request = QueryRequest {
            query: flux,
            kind: "flux",
            dialect: Dialect::default(),
        };

        let response = self
            .client
            .post(&url)
            .query(&[("org", self.org.as_str())])
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .header(ACCEPT, "application/csv")
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|e| e.message)
                .unwrap_or(text);
            warn!(log, "query rejected"; "status" => status.as_u16(), "message" => &message);
            return Err(InfluxError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.text().await?)
    }
}

/// `192.168.3.140:8086` のようなスキーム無しの指定も受け付ける
fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}

#[cfg(test)]
mod tests;
