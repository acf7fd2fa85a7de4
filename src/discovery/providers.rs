// Outbound directory provider clients. Both are thin reqwest wrappers with
// client-level timeouts; every failure is surfaced as a DiscoveryProvider
// error and handled at per-pair granularity by the caller.

use crate::errors::{CampaignError, CampaignResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// A raw directory search hit before normalization into a BusinessContact.
#[derive(Debug, Clone)]
pub struct ProviderListing {
    pub name: String,
    pub address: Option<String>,
    pub tags: Vec<String>,
    pub rating: Option<f64>,
    pub source_id: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListingDetails {
    pub phone: Option<String>,
    pub website: Option<String>,
    pub opening_hours: Option<String>,
}

#[async_trait]
pub trait DirectoryProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, term: &str, location: &str) -> CampaignResult<Vec<ProviderListing>>;

    /// Follow-up per-result lookup for contact and opening-hours details.
    async fn details(&self, source_id: &str) -> CampaignResult<Option<ListingDetails>>;
}

fn provider_error(provider: &str, message: impl ToString) -> CampaignError {
    CampaignError::DiscoveryProvider {
        provider: provider.to_string(),
        message: message.to_string(),
    }
}

fn build_client() -> Client {
    Client::builder()
        .user_agent("Mozilla/5.0 (compatible; OutreachEngine/1.0)")
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create HTTP client")
}

// ---------------------------------------------------------------------------
// Primary provider: Google Places text search + place details.

pub struct GooglePlacesProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Deserialize)]
struct GoogleSearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<GooglePlace>,
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct GooglePlace {
    name: String,
    formatted_address: Option<String>,
    #[serde(default)]
    types: Vec<String>,
    rating: Option<f64>,
    place_id: Option<String>,
}

#[derive(Deserialize)]
struct GoogleDetailsResponse {
    status: String,
    result: Option<GoogleDetails>,
}

#[derive(Deserialize)]
struct GoogleDetails {
    formatted_phone_number: Option<String>,
    website: Option<String>,
    opening_hours: Option<GoogleOpeningHours>,
}

#[derive(Deserialize)]
struct GoogleOpeningHours {
    #[serde(default)]
    weekday_text: Vec<String>,
}

impl GooglePlacesProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: build_client(),
            api_key,
            base_url: "https://maps.googleapis.com/maps/api/place".to_string(),
        }
    }

    pub fn from_env() -> Option<Self> {
        std::env::var("GOOGLE_PLACES_API_KEY").ok().map(Self::new)
    }
}

#[async_trait]
impl DirectoryProvider for GooglePlacesProvider {
    fn name(&self) -> &str {
        "google_places"
    }

    async fn search(&self, term: &str, location: &str) -> CampaignResult<Vec<ProviderListing>> {
        let url = format!("{}/textsearch/json", self.base_url);
        let query = format!("{} in {}", term, location);
        debug!("Places text search: {}", query);

        let response = self
            .client
            .get(&url)
            .query(&[("query", query.as_str()), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| provider_error(self.name(), e))?;

        if !response.status().is_success() {
            return Err(provider_error(
                self.name(),
                format!("HTTP {}", response.status()),
            ));
        }

        let body: GoogleSearchResponse = response
            .json()
            .await
            .map_err(|e| provider_error(self.name(), e))?;

        match body.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(body
                .results
                .into_iter()
                .map(|p| ProviderListing {
                    name: p.name,
                    address: p.formatted_address,
                    tags: p.types,
                    rating: p.rating,
                    source_id: p.place_id,
                    website: None,
                    phone: None,
                })
                .collect()),
            status => Err(provider_error(
                self.name(),
                format!(
                    "status {}: {}",
                    status,
                    body.error_message.unwrap_or_default()
                ),
            )),
        }
    }

    async fn details(&self, source_id: &str) -> CampaignResult<Option<ListingDetails>> {
        let url = format!("{}/details/json", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("place_id", source_id),
                ("fields", "formatted_phone_number,website,opening_hours"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| provider_error(self.name(), e))?;

        if !response.status().is_success() {
            return Err(provider_error(
                self.name(),
                format!("HTTP {}", response.status()),
            ));
        }

        let body: GoogleDetailsResponse = response
            .json()
            .await
            .map_err(|e| provider_error(self.name(), e))?;

        if body.status != "OK" {
            return Ok(None);
        }

        Ok(body.result.map(|d| ListingDetails {
            phone: d.formatted_phone_number,
            website: d.website,
            opening_hours: d
                .opening_hours
                .map(|h| h.weekday_text.join("; "))
                .filter(|s| !s.is_empty()),
        }))
    }
}

// ---------------------------------------------------------------------------
// Secondary provider: Foursquare Places, used when the primary is down or
// not configured.

pub struct FoursquareProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Deserialize)]
struct FsqSearchResponse {
    #[serde(default)]
    results: Vec<FsqPlace>,
}

#[derive(Deserialize)]
struct FsqPlace {
    fsq_id: String,
    name: String,
    #[serde(default)]
    categories: Vec<FsqCategory>,
    location: Option<FsqLocation>,
    rating: Option<f64>,
    website: Option<String>,
    tel: Option<String>,
}

#[derive(Deserialize)]
struct FsqCategory {
    name: String,
}

#[derive(Deserialize)]
struct FsqLocation {
    formatted_address: Option<String>,
}

#[derive(Deserialize)]
struct FsqDetails {
    tel: Option<String>,
    website: Option<String>,
    hours: Option<FsqHours>,
}

#[derive(Deserialize)]
struct FsqHours {
    display: Option<String>,
}

impl FoursquareProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: build_client(),
            api_key,
            base_url: "https://api.foursquare.com/v3/places".to_string(),
        }
    }

    pub fn from_env() -> Option<Self> {
        std::env::var("FOURSQUARE_API_KEY").ok().map(Self::new)
    }

    // Foursquare category names are human-readable ("Hardware Store");
    // normalize to the snake_case tags the relevance lists use.
    fn normalize_tag(name: &str) -> String {
        name.trim().to_lowercase().replace([' ', '-', '/'], "_")
    }
}

#[async_trait]
impl DirectoryProvider for FoursquareProvider {
    fn name(&self) -> &str {
        "foursquare"
    }

    async fn search(&self, term: &str, location: &str) -> CampaignResult<Vec<ProviderListing>> {
        let url = format!("{}/search", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.api_key)
            .query(&[("query", term), ("near", location), ("limit", "20")])
            .send()
            .await
            .map_err(|e| provider_error(self.name(), e))?;

        if !response.status().is_success() {
            return Err(provider_error(
                self.name(),
                format!("HTTP {}", response.status()),
            ));
        }

        let body: FsqSearchResponse = response
            .json()
            .await
            .map_err(|e| provider_error(self.name(), e))?;

        Ok(body
            .results
            .into_iter()
            .map(|p| ProviderListing {
                name: p.name,
                address: p.location.and_then(|l| l.formatted_address),
                tags: p
                    .categories
                    .iter()
                    .map(|c| Self::normalize_tag(&c.name))
                    .collect(),
                rating: p.rating,
                source_id: Some(p.fsq_id),
                website: p.website,
                phone: p.tel,
            })
            .collect())
    }

    async fn details(&self, source_id: &str) -> CampaignResult<Option<ListingDetails>> {
        let url = format!("{}/{}", self.base_url, source_id);

        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.api_key)
            .query(&[("fields", "tel,website,hours")])
            .send()
            .await
            .map_err(|e| provider_error(self.name(), e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(provider_error(
                self.name(),
                format!("HTTP {}", response.status()),
            ));
        }

        let body: FsqDetails = response
            .json()
            .await
            .map_err(|e| provider_error(self.name(), e))?;

        Ok(Some(ListingDetails {
            phone: body.tel,
            website: body.website,
            opening_hours: body.hours.and_then(|h| h.display),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foursquare_tags_normalize_to_snake_case() {
        assert_eq!(
            FoursquareProvider::normalize_tag("Hardware Store"),
            "hardware_store"
        );
        assert_eq!(
            FoursquareProvider::normalize_tag("Grocery / Supermarket"),
            "grocery___supermarket"
        );
    }
}
