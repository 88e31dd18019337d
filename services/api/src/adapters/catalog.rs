//! services/api/src/adapters/catalog.rs
//!
//! Catalog adapters: the flat-file `db.json` the storefront ships with and the
//! backend's `GET /api/models` listing. Both speak the same camelCase record
//! shape, which is validated and converted into core types here.

use async_trait::async_trait;
use aura_core::domain::{CatalogItem, ItemStatus, Offering, Review, ReviewStatus};
use aura_core::ports::{CatalogService, PortError, PortResult};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

//=========================================================================================
// "Impure" Catalog Record Structs
//=========================================================================================

#[derive(Deserialize, Debug, Clone, Copy)]
enum StatusRecord {
    #[serde(alias = "online")]
    Online,
    #[serde(alias = "offline")]
    Offline,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ProductRecord {
    id: u32,
    duration: u32,
    price: f64,
    #[serde(default)]
    product_hash: String,
    #[serde(default)]
    offer_hash: String,
}
impl ProductRecord {
    fn to_domain(self) -> Offering {
        Offering {
            id: self.id,
            duration_minutes: self.duration,
            price: self.price,
            product_hash: self.product_hash,
            offer_hash: self.offer_hash,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ReviewRecord {
    id: String,
    username: String,
    rating: u8,
    #[serde(default)]
    comment: String,
    status: ReviewStatus,
    #[serde(default)]
    profile_pic: Option<String>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    is_lead_comment: bool,
}
impl ReviewRecord {
    fn to_domain(self) -> Review {
        Review {
            id: self.id,
            author: self.username,
            rating: self.rating.min(5),
            comment: self.comment,
            status: self.status,
            avatar: self.profile_pic.filter(|p| !p.is_empty()),
            response: self.response,
            hidden: self.is_lead_comment,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ModelRecord {
    id: String,
    name: String,
    #[serde(default)]
    age: u32,
    #[serde(default)]
    bio: String,
    #[serde(default)]
    profile_image: String,
    #[serde(default)]
    gallery_images: Vec<String>,
    #[serde(default)]
    video_url: String,
    status: StatusRecord,
    #[serde(default)]
    products: Vec<ProductRecord>,
    #[serde(default)]
    reviews: Vec<ReviewRecord>,
}
impl ModelRecord {
    fn to_domain(self) -> CatalogItem {
        CatalogItem {
            id: self.id,
            name: self.name,
            age: self.age,
            bio: self.bio,
            profile_image: self.profile_image,
            gallery_images: self.gallery_images,
            video_url: self.video_url,
            status: match self.status {
                StatusRecord::Online => ItemStatus::Online,
                StatusRecord::Offline => ItemStatus::Offline,
            },
            offerings: self.products.into_iter().map(|p| p.to_domain()).collect(),
            reviews: self.reviews.into_iter().map(|r| r.to_domain()).collect(),
        }
    }
}

fn parse_catalog(raw: &str) -> PortResult<Vec<CatalogItem>> {
    let records: Vec<ModelRecord> = serde_json::from_str(raw)
        .map_err(|e| PortError::Unexpected(format!("Malformed catalog records: {}", e)))?;
    Ok(records.into_iter().map(|r| r.to_domain()).collect())
}

//=========================================================================================
// Flat-file Adapter
//=========================================================================================

/// Reads the catalog from a JSON array on disk.
#[derive(Clone, Debug)]
pub struct FileCatalogAdapter {
    path: PathBuf,
}

impl FileCatalogAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogService for FileCatalogAdapter {
    async fn list_items(&self) -> PortResult<Vec<CatalogItem>> {
        debug!("Reading catalog from {}", self.path.display());
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            PortError::NotFound(format!("Catalog file {}: {}", self.path.display(), e))
        })?;
        parse_catalog(&raw)
    }
}

//=========================================================================================
// HTTP Adapter
//=========================================================================================

/// Fetches the catalog from the storefront backend.
#[derive(Clone)]
pub struct HttpCatalogAdapter {
    client: reqwest::Client,
    models_url: String,
}

impl HttpCatalogAdapter {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            models_url: format!("{}/api/models", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl CatalogService for HttpCatalogAdapter {
    async fn list_items(&self) -> PortResult<Vec<CatalogItem>> {
        debug!("Fetching catalog from {}", self.models_url);
        let response = self
            .client
            .get(&self.models_url)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if !response.status().is_success() {
            return Err(PortError::Unexpected(format!(
                "Catalog backend returned HTTP {}",
                response.status().as_u16()
            )));
        }
        let raw = response
            .text()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        parse_catalog(&raw)
    }
}
