//! Shared fixtures for core integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use propstore_core::{
    AggregateBatch, DocumentStore, InMemoryStore, Pipeline, QueryLimits,
    QueryService, StoreError, StoreResult,
};
use serde_json::{Value, json};

pub const LISTINGS: &str = "Properties";
pub const OWNERS: &str = "Owners";
pub const IMAGES: &str = "PropertyImages";
pub const TRACES: &str = "PropertyTraces";

/// Listings in the default catalog.
pub const CATALOG_SIZE: u32 = 25;

/// Listing whose owner key resolves to nothing.
pub const DANGLING_OWNER_LISTING: u32 = 25;

/// Store identity of fixture record `n`.
pub fn oid(n: u32) -> String {
    format!("65f1c0ffee{n:014x}")
}

pub fn listing_key(n: u32) -> String {
    format!("PROP{n:02}")
}

pub fn listing_doc(n: u32) -> Value {
    let (name, address) = if n % 2 == 1 {
        (format!("Casa Azul {n:02}"), format!("Calle {n} Norte"))
    } else {
        (format!("Apartamento Verde {n:02}"), format!("Avenida {n} Sur"))
    };
    let owner = if n == DANGLING_OWNER_LISTING {
        "OWN404".to_string()
    } else {
        format!("OWN{}", n % 3)
    };

    json!({
        "_id": oid(n),
        "idProperty": listing_key(n),
        "Name": name,
        "Address": address,
        "Price": (u64::from(n) * 10_000).to_string(),
        "CodeInternal": format!("C-{n:03}"),
        "Year": 1990 + n as i32,
        "IdOwner": owner,
    })
}

fn owner_doc(n: u32) -> Value {
    json!({
        "_id": oid(1_000 + n),
        "IdOwner": format!("OWN{n}"),
        "Name": format!("Owner {n}"),
        "Address": format!("Calle {n}"),
        "Photo": format!("/owners/{n}.jpg"),
        "Birthday": "1980-02-14",
    })
}

pub fn image_doc(listing: u32, n: u32, enabled: bool) -> Value {
    json!({
        "idPropertyImage": format!("IMG{listing:02}-{n}"),
        "idProperty": listing_key(listing),
        "FilePath": format!("/img/{listing}/{n}.jpg"),
        "Enabled": enabled,
    })
}

pub fn trace_doc(listing: u32, n: u32) -> Value {
    json!({
        "idPropertyTrace": format!("TR{listing:02}-{n}"),
        "idProperty": listing_key(listing),
        "DateSale": format!("2020-0{}-01T00:00:00Z", n % 9 + 1),
        "Name": format!("Buyer {n}"),
        "Value": "100000.00",
        "Tax": "1500.25",
    })
}

/// 25 listings, three owners (`OWN0`..`OWN2`), listing 25 pointing at a
/// missing owner. PROP01 has three enabled and two disabled images and two
/// traces; PROP02 has one enabled image.
pub async fn seed_catalog(store: &InMemoryStore) {
    store
        .insert_many(LISTINGS, (1..=CATALOG_SIZE).map(listing_doc))
        .await;
    store.insert_many(OWNERS, (0..3).map(owner_doc)).await;
    store
        .insert_many(
            IMAGES,
            [
                image_doc(1, 1, true),
                image_doc(1, 2, false),
                image_doc(1, 3, true),
                image_doc(1, 4, false),
                image_doc(1, 5, true),
                image_doc(2, 1, true),
            ],
        )
        .await;
    store
        .insert_many(TRACES, [trace_doc(1, 1), trace_doc(1, 2)])
        .await;
}

pub async fn catalog() -> InMemoryStore {
    let store = InMemoryStore::new();
    seed_catalog(&store).await;
    store
}

pub fn service(store: &InMemoryStore) -> QueryService {
    service_with(store, QueryLimits::default())
}

pub fn service_with(store: &InMemoryStore, limits: QueryLimits) -> QueryService {
    QueryService::new(Arc::new(store.clone()), limits)
}

/// Store that cannot be reached.
#[derive(Debug, Default)]
pub struct UnreachableStore {
    pub calls: AtomicUsize,
}

#[async_trait]
impl DocumentStore for UnreachableStore {
    async fn aggregate(&self, _pipeline: &Pipeline) -> StoreResult<AggregateBatch> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// Delegates to an [`InMemoryStore`], failing data or count runs on demand
/// and counting every call.
#[derive(Debug, Default)]
pub struct ScriptedStore {
    pub inner: InMemoryStore,
    pub fail_data: Option<StoreError>,
    pub fail_count: Option<StoreError>,
    pub delay: Option<Duration>,
    pub data_calls: AtomicUsize,
    pub count_calls: AtomicUsize,
}

impl ScriptedStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }
}

#[async_trait]
impl DocumentStore for ScriptedStore {
    async fn aggregate(&self, pipeline: &Pipeline) -> StoreResult<AggregateBatch> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failure = if pipeline.count_stage().is_some() {
            self.count_calls.fetch_add(1, Ordering::SeqCst);
            &self.fail_count
        } else {
            self.data_calls.fetch_add(1, Ordering::SeqCst);
            &self.fail_data
        };

        match failure {
            Some(err) => Err(err.clone()),
            None => self.inner.aggregate(pipeline).await,
        }
    }
}

/// Route core logs to the test writer; `RUST_LOG=debug` shows pipelines.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
