use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use common_auth::Role;
use futures_util::stream::{self, BoxStream, StreamExt};
use uuid::Uuid;

use super::{CartRepository, LedgerRepository, MenuRepository, ReviewRepository, UserRepository};
use crate::models::{
    CartEntry, MenuItem, MenuPatch, NewCartEntry, NewMenuItem, NewPayment, NewUser, Payment,
    Registration, Review, SettlementRecord, UpdateOutcome, User,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    menu: Vec<MenuItem>,
    reviews: Vec<Review>,
    carts: Vec<CartEntry>,
    payments: Vec<Payment>,
}

/// Process-local store used when no `DATABASE_URL` is configured and by the test suites.
/// Every operation runs under a single lock, so settlement is atomic here as well.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    /// Reviews are read-only through the API; this seeds them.
    pub fn insert_review(&self, review: Review) -> Result<()> {
        self.tables()?.reviews.push(review);
        Ok(())
    }

    /// Sets a stored role directly, bypassing the admin promotion path.
    pub fn set_role(&self, email: &str, role: Role) -> Result<bool> {
        let mut tables = self.tables()?;
        match tables.users.iter_mut().find(|u| u.email == email) {
            Some(user) => {
                user.role = role;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.tables()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_if_absent(&self, user: NewUser) -> Result<Registration> {
        let mut tables = self.tables()?;
        if let Some(existing) = tables.users.iter().find(|u| u.email == user.email) {
            return Ok(Registration::Existing(existing.clone()));
        }
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            name: user.name,
            role: Role::Standard,
            created_at: Utc::now(),
        };
        tables.users.push(created.clone());
        Ok(Registration::Created(created))
    }

    async fn list(&self) -> Result<Vec<User>> {
        Ok(self.tables()?.users.clone())
    }

    async fn promote(&self, id: Uuid) -> Result<UpdateOutcome> {
        let mut tables = self.tables()?;
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(UpdateOutcome::default());
        };
        let modified = !user.role.is_admin();
        user.role = Role::Admin;
        Ok(UpdateOutcome { matched_count: 1, modified_count: u64::from(modified) })
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        let mut tables = self.tables()?;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        Ok((before - tables.users.len()) as u64)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.tables()?.users.len() as u64)
    }
}

#[async_trait]
impl MenuRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<MenuItem>> {
        Ok(self.tables()?.menu.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<MenuItem>> {
        Ok(self.tables()?.menu.iter().find(|m| m.id == id).cloned())
    }

    async fn insert(&self, item: NewMenuItem) -> Result<MenuItem> {
        let created = MenuItem {
            id: Uuid::new_v4(),
            name: item.name,
            category: item.category,
            price: item.price,
            recipe: item.recipe,
            image: item.image,
        };
        self.tables()?.menu.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: MenuPatch) -> Result<UpdateOutcome> {
        let mut tables = self.tables()?;
        let Some(item) = tables.menu.iter_mut().find(|m| m.id == id) else {
            return Ok(UpdateOutcome::default());
        };
        let modified = patch.apply(item);
        Ok(UpdateOutcome { matched_count: 1, modified_count: u64::from(modified) })
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        let mut tables = self.tables()?;
        let before = tables.menu.len();
        tables.menu.retain(|m| m.id != id);
        Ok((before - tables.menu.len()) as u64)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.tables()?.menu.len() as u64)
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Review>> {
        Ok(self.tables()?.reviews.clone())
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn insert(&self, entry: NewCartEntry) -> Result<CartEntry> {
        let created = CartEntry {
            id: Uuid::new_v4(),
            email: entry.email,
            menu_item_id: entry.menu_item_id,
            name: entry.name,
            image: entry.image,
            price: entry.price,
            quantity: entry.quantity,
            created_at: Utc::now(),
        };
        self.tables()?.carts.push(created.clone());
        Ok(created)
    }

    async fn list_for(&self, email: &str) -> Result<Vec<CartEntry>> {
        Ok(self
            .tables()?
            .carts
            .iter()
            .filter(|c| c.email == email)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        let mut tables = self.tables()?;
        let before = tables.carts.len();
        tables.carts.retain(|c| c.id != id);
        Ok((before - tables.carts.len()) as u64)
    }
}

#[async_trait]
impl LedgerRepository for MemoryStore {
    async fn settle(&self, payment: NewPayment) -> Result<SettlementRecord> {
        let mut tables = self.tables()?;
        let payment = payment.into_payment(Uuid::new_v4(), Utc::now());
        let settled: HashSet<Uuid> = payment.cart_ids.iter().copied().collect();
        let before = tables.carts.len();
        tables
            .carts
            .retain(|c| !(settled.contains(&c.id) && c.email == payment.email));
        let deleted = (before - tables.carts.len()) as u64;
        tables.payments.push(payment.clone());
        Ok(SettlementRecord { payment, deleted })
    }

    async fn list_for(&self, email: &str) -> Result<Vec<Payment>> {
        Ok(self
            .tables()?
            .payments
            .iter()
            .filter(|p| p.email == email)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.tables()?.payments.len() as u64)
    }

    fn stream_payments(&self) -> BoxStream<'_, Result<Payment>> {
        match self.tables() {
            Ok(tables) => stream::iter(tables.payments.clone().into_iter().map(Ok)).boxed(),
            Err(err) => stream::once(async move { Err(err) }).boxed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use futures_util::TryStreamExt;
    use std::str::FromStr;

    fn cart_line(email: &str) -> NewCartEntry {
        NewCartEntry {
            email: email.into(),
            menu_item_id: Uuid::new_v4(),
            name: "Soup".into(),
            image: None,
            price: BigDecimal::from_str("7.50").unwrap(),
            quantity: 1,
        }
    }

    fn payment_for(email: &str, cart_ids: Vec<Uuid>) -> NewPayment {
        NewPayment {
            email: email.into(),
            amount: BigDecimal::from_str("42.50").unwrap(),
            amount_minor: 4250,
            menu_item_ids: vec![],
            cart_ids,
            transaction_id: "pi_test".into(),
            status: "pending".into(),
        }
    }

    #[tokio::test]
    async fn registration_is_idempotent() {
        let store = MemoryStore::default();
        let first = store
            .insert_if_absent(NewUser { email: "a@x.io".into(), name: None })
            .await
            .unwrap();
        let second = store
            .insert_if_absent(NewUser { email: "a@x.io".into(), name: Some("A".into()) })
            .await
            .unwrap();
        assert!(matches!(first, Registration::Created(_)));
        assert!(matches!(second, Registration::Existing(ref u) if u.name.is_none()));
        assert_eq!(UserRepository::count(&store).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn promote_reports_matched_and_modified() {
        let store = MemoryStore::default();
        let Registration::Created(user) = store
            .insert_if_absent(NewUser { email: "a@x.io".into(), name: None })
            .await
            .unwrap()
        else {
            panic!("expected a new user");
        };
        let first = store.promote(user.id).await.unwrap();
        assert_eq!(first, UpdateOutcome { matched_count: 1, modified_count: 1 });
        let again = store.promote(user.id).await.unwrap();
        assert_eq!(again, UpdateOutcome { matched_count: 1, modified_count: 0 });
        let missing = store.promote(Uuid::new_v4()).await.unwrap();
        assert_eq!(missing, UpdateOutcome::default());
    }

    #[tokio::test]
    async fn settle_only_removes_the_owners_lines() {
        let store = MemoryStore::default();
        let mine = CartRepository::insert(&store, cart_line("a@x.io")).await.unwrap();
        let theirs = CartRepository::insert(&store, cart_line("b@x.io")).await.unwrap();

        let record = store
            .settle(payment_for("a@x.io", vec![mine.id, theirs.id, Uuid::new_v4()]))
            .await
            .unwrap();

        assert_eq!(record.deleted, 1);
        assert!(CartRepository::list_for(&store, "a@x.io").await.unwrap().is_empty());
        assert_eq!(CartRepository::list_for(&store, "b@x.io").await.unwrap().len(), 1);
        assert_eq!(LedgerRepository::count(&store).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn stream_yields_every_payment() {
        let store = MemoryStore::default();
        store.settle(payment_for("a@x.io", vec![])).await.unwrap();
        store.settle(payment_for("b@x.io", vec![])).await.unwrap();
        let all: Vec<Payment> = store.stream_payments().try_collect().await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
