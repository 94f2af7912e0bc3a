//! Storage ports and the `Store` bundle handed to every handler.
//!
//! Adapters return `anyhow::Result`; handlers turn failures into `ApiError::Internal`.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    CartEntry, MenuItem, MenuPatch, NewCartEntry, NewMenuItem, NewPayment, NewUser, Payment,
    Registration, Review, SettlementRecord, UpdateOutcome, User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Inserts with role `standard` unless the email is already registered.
    async fn insert_if_absent(&self, user: NewUser) -> Result<Registration>;
    async fn list(&self) -> Result<Vec<User>>;
    async fn promote(&self, id: Uuid) -> Result<UpdateOutcome>;
    async fn delete(&self, id: Uuid) -> Result<u64>;
    async fn count(&self) -> Result<u64>;
}

#[async_trait]
pub trait MenuRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<MenuItem>>;
    async fn get(&self, id: Uuid) -> Result<Option<MenuItem>>;
    async fn insert(&self, item: NewMenuItem) -> Result<MenuItem>;
    async fn update(&self, id: Uuid, patch: MenuPatch) -> Result<UpdateOutcome>;
    async fn delete(&self, id: Uuid) -> Result<u64>;
    async fn count(&self) -> Result<u64>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Review>>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn insert(&self, entry: NewCartEntry) -> Result<CartEntry>;
    async fn list_for(&self, email: &str) -> Result<Vec<CartEntry>>;
    async fn delete(&self, id: Uuid) -> Result<u64>;
}

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Records the payment and removes the owner's listed cart entries as one unit.
    /// Ids that are missing or owned by someone else are skipped.
    async fn settle(&self, payment: NewPayment) -> Result<SettlementRecord>;
    async fn list_for(&self, email: &str) -> Result<Vec<Payment>>;
    async fn count(&self) -> Result<u64>;
    fn stream_payments(&self) -> BoxStream<'_, Result<Payment>>;
}

#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserRepository>,
    pub menu: Arc<dyn MenuRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub ledger: Arc<dyn LedgerRepository>,
    pool: Option<PgPool>,
}

impl Store {
    pub fn postgres(pool: PgPool) -> Self {
        let adapter = Arc::new(PgStore::new(pool.clone()));
        Self {
            users: adapter.clone(),
            menu: adapter.clone(),
            reviews: adapter.clone(),
            carts: adapter.clone(),
            ledger: adapter,
            pool: Some(pool),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::default()))
    }

    pub fn from_memory(adapter: Arc<MemoryStore>) -> Self {
        Self {
            users: adapter.clone(),
            menu: adapter.clone(),
            reviews: adapter.clone(),
            carts: adapter.clone(),
            ledger: adapter,
            pool: None,
        }
    }

    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
