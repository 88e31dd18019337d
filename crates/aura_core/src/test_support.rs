//! In-memory stand-ins for the ports, shared by the unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::domain::{
    CatalogItem, ItemStatus, Offering, PaymentReceipt, PaymentRequest, Review, ReviewStatus,
};
use crate::ports::{CatalogService, Clock, DurableSlot, PaymentService, PortError, PortResult};

pub fn at(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).expect("timestamp in range")
}

pub fn sample_item(id: &str) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        name: format!("Model {id}"),
        age: 25,
        bio: String::new(),
        profile_image: format!("{id}.jpg"),
        gallery_images: Vec::new(),
        video_url: format!("{id}.mp4"),
        status: ItemStatus::Online,
        offerings: vec![
            Offering {
                id: 1,
                duration_minutes: 5,
                price: 19.9,
                product_hash: "prod-5".to_string(),
                offer_hash: "offer-5".to_string(),
            },
            Offering {
                id: 2,
                duration_minutes: 15,
                price: 49.9,
                product_hash: "prod-15".to_string(),
                offer_hash: "offer-15".to_string(),
            },
        ],
        reviews: Vec::new(),
    }
}

pub fn review(id: &str, rating: u8, status: ReviewStatus) -> Review {
    Review {
        id: id.to_string(),
        author: "someone".to_string(),
        rating,
        comment: "ok".to_string(),
        status,
        avatar: None,
        response: None,
        hidden: false,
    }
}

#[derive(Default)]
pub struct MemorySlot {
    values: Mutex<HashMap<String, String>>,
    pub fail_writes: AtomicBool,
}

impl MemorySlot {
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl DurableSlot for MemorySlot {
    async fn read(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.get(key))
    }

    async fn write(&self, key: &str, value: &str) -> PortResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("disk full".to_string()));
        }
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub struct StaticCatalog(pub Option<Vec<CatalogItem>>);

#[async_trait]
impl CatalogService for StaticCatalog {
    async fn list_items(&self) -> PortResult<Vec<CatalogItem>> {
        self.0
            .clone()
            .ok_or_else(|| PortError::Unexpected("catalog offline".to_string()))
    }
}

/// Approves every charge unless a rejection reason is set.
#[derive(Default)]
pub struct StubPayments {
    pub reject_with: Mutex<Option<PortError>>,
    pub charges: AtomicUsize,
}

impl StubPayments {
    pub fn rejecting(err: PortError) -> Self {
        Self {
            reject_with: Mutex::new(Some(err)),
            charges: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PaymentService for StubPayments {
    async fn charge(&self, _request: &PaymentRequest) -> PortResult<PaymentReceipt> {
        self.charges.fetch_add(1, Ordering::SeqCst);
        match self.reject_with.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(PaymentReceipt {
                transaction_id: Some("tx-1".to_string()),
            }),
        }
    }
}
