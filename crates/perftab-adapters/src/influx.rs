use crate::{AdapterError, Point, PointWriter};
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and as whom to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDetails {
    pub url: String,
    pub org: String,
    pub token: String,
}

/// Blocking InfluxDB v2 writer (`POST /api/v2/write`).
#[derive(Debug, Clone)]
pub struct InfluxWriter {
    client: Client,
    write_url: Url,
    org: String,
    token: String,
}

impl InfluxWriter {
    pub fn new(conn: &ConnectionDetails, timeout: Duration) -> Result<Self, AdapterError> {
        let base = conn.url.trim_end_matches('/');
        let write_url =
            Url::parse(&format!("{base}/api/v2/write")).map_err(|source| {
                AdapterError::InvalidUrl {
                    url: conn.url.clone(),
                    source,
                }
            })?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            write_url,
            org: conn.org.clone(),
            token: conn.token.clone(),
        })
    }

    fn url_for(&self, bucket: &str) -> Url {
        let mut url = self.write_url.clone();
        url.query_pairs_mut()
            .append_pair("org", &self.org)
            .append_pair("bucket", bucket)
            .append_pair("precision", "ns");
        url
    }
}

impl PointWriter for InfluxWriter {
    fn write(&mut self, bucket: &str, points: &[Point]) -> Result<(), AdapterError> {
        let lines = points
            .iter()
            .map(Point::to_line)
            .collect::<Result<Vec<_>, _>>()?;
        let body = lines.join("\n");

        let url = self.url_for(bucket);
        debug!(points = points.len(), %url, "writing points");

        let resp = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(body)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(AdapterError::Write {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
