use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};

use crate::config::Config;
use crate::error::{Result, SightingError};
use crate::record::{Sighting, SightingId};

/// Read-only access to the authoritative sighting catalog.
///
/// Every call is a fresh request: no retries and no caching.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Sighting>>;

    async fn fetch_by_id(&self, id: SightingId) -> Result<Sighting>;
}

pub struct HttpRemoteSource {
    client: Client,
    pub(crate) base_url: String,
}

impl HttpRemoteSource {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|source| SightingError::Network {
                url: config.base_url.clone(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/ufo/sightings", self.base_url)
    }

    fn item_url(&self, id: SightingId) -> String {
        format!("{}/ufo/sightings/{}", self.base_url, id)
    }

    /// Issues a GET and returns the status with the full body.
    async fn get(&self, url: &str) -> Result<(StatusCode, Vec<u8>)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| SightingError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| SightingError::Network {
                url: url.to_string(),
                source,
            })?;
        Ok((status, body.to_vec()))
    }
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    async fn fetch_all(&self) -> Result<Vec<Sighting>> {
        let url = self.collection_url();
        let (status, body) = self.get(&url).await?;

        if !status.is_success() {
            warn!("HTTP error {} fetching {}", status, url);
            return Err(SightingError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }

        let sightings: Vec<Sighting> =
            serde_json::from_slice(&body).map_err(|e| SightingError::parse(url.as_str(), e))?;
        info!("Fetched {} remote sightings", sightings.len());
        Ok(sightings)
    }

    async fn fetch_by_id(&self, id: SightingId) -> Result<Sighting> {
        let url = self.item_url(id);
        let (status, body) = self.get(&url).await?;

        match status {
            StatusCode::NOT_FOUND => {
                debug!("Remote catalog has no sighting {}", id);
                Err(SightingError::NotFound(id))
            }
            s if s.is_success() => {
                serde_json::from_slice(&body).map_err(|e| SightingError::parse(url.as_str(), e))
            }
            s => {
                warn!("HTTP error {} for sighting {}", s, id);
                Err(SightingError::HttpStatus {
                    url,
                    status: s.as_u16(),
                })
            }
        }
    }
}
