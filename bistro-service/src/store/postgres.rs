use anyhow::{Context, Result};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use common_auth::{Role, ROLE_ADMIN, ROLE_STANDARD};
use futures_util::stream::{BoxStream, StreamExt};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{CartRepository, LedgerRepository, MenuRepository, ReviewRepository, UserRepository};
use crate::models::{
    CartEntry, MenuItem, MenuPatch, NewCartEntry, NewMenuItem, NewPayment, NewUser, Payment,
    Registration, Review, SettlementRecord, UpdateOutcome, User,
};

const USER_COLUMNS: &str = "id, email, name, role, created_at";
const PAYMENT_COLUMNS: &str =
    "id, email, amount, amount_minor, menu_item_ids, cart_ids, transaction_id, status, created_at";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            name: row.name,
            role: Role::parse(&row.role),
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct MenuRow {
    id: Uuid,
    name: String,
    category: String,
    price: BigDecimal,
    recipe: String,
    image: Option<String>,
}

impl From<MenuRow> for MenuItem {
    fn from(row: MenuRow) -> Self {
        MenuItem {
            id: row.id,
            name: row.name,
            category: row.category,
            price: row.price,
            recipe: row.recipe,
            image: row.image,
        }
    }
}

#[derive(FromRow)]
struct CartRow {
    id: Uuid,
    email: String,
    menu_item_id: Uuid,
    name: String,
    image: Option<String>,
    price: BigDecimal,
    quantity: i32,
    created_at: DateTime<Utc>,
}

impl From<CartRow> for CartEntry {
    fn from(row: CartRow) -> Self {
        CartEntry {
            id: row.id,
            email: row.email,
            menu_item_id: row.menu_item_id,
            name: row.name,
            image: row.image,
            price: row.price,
            quantity: row.quantity,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct PaymentRow {
    id: Uuid,
    email: String,
    amount: BigDecimal,
    amount_minor: i64,
    menu_item_ids: Vec<Uuid>,
    cart_ids: Vec<Uuid>,
    transaction_id: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Payment {
            id: row.id,
            email: row.email,
            amount: row.amount,
            amount_minor: row.amount_minor,
            menu_item_ids: row.menu_item_ids,
            cart_ids: row.cart_ids,
            transaction_id: row.transaction_id,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn insert_if_absent(&self, user: NewUser) -> Result<Registration> {
        let inserted = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (id, email, name, role) VALUES ($1, $2, $3, $4)
             ON CONFLICT (email) DO NOTHING
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(user.name.as_deref())
        .bind(ROLE_STANDARD)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(Registration::Created(row.into()));
        }
        let existing = self
            .find_by_email(&user.email)
            .await?
            .context("user vanished between conflict and lookup")?;
        Ok(Registration::Existing(existing))
    }

    async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn promote(&self, id: Uuid) -> Result<UpdateOutcome> {
        let previous: Option<String> = sqlx::query_scalar(
            "WITH prev AS (SELECT role FROM users WHERE id = $1 FOR UPDATE)
             UPDATE users SET role = $2 FROM prev WHERE users.id = $1
             RETURNING prev.role",
        )
        .bind(id)
        .bind(ROLE_ADMIN)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match previous {
            None => UpdateOutcome::default(),
            Some(role) => UpdateOutcome {
                matched_count: 1,
                modified_count: u64::from(role != ROLE_ADMIN),
            },
        })
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

#[async_trait]
impl MenuRepository for PgStore {
    async fn list(&self) -> Result<Vec<MenuItem>> {
        let rows = sqlx::query_as::<_, MenuRow>(
            "SELECT id, name, category, price, recipe, image FROM menu ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(MenuItem::from).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<MenuItem>> {
        let row = sqlx::query_as::<_, MenuRow>(
            "SELECT id, name, category, price, recipe, image FROM menu WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(MenuItem::from))
    }

    async fn insert(&self, item: NewMenuItem) -> Result<MenuItem> {
        let row = sqlx::query_as::<_, MenuRow>(
            "INSERT INTO menu (id, name, category, price, recipe, image)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, name, category, price, recipe, image",
        )
        .bind(Uuid::new_v4())
        .bind(&item.name)
        .bind(&item.category)
        .bind(&item.price)
        .bind(&item.recipe)
        .bind(item.image.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update(&self, id: Uuid, patch: MenuPatch) -> Result<UpdateOutcome> {
        let mut tx = self.pool.begin().await?;
        let current = sqlx::query_as::<_, MenuRow>(
            "SELECT id, name, category, price, recipe, image FROM menu WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = current else {
            return Ok(UpdateOutcome::default());
        };
        let mut item = MenuItem::from(row);
        if !patch.apply(&mut item) {
            return Ok(UpdateOutcome { matched_count: 1, modified_count: 0 });
        }

        sqlx::query(
            "UPDATE menu SET name = $2, category = $3, price = $4, recipe = $5, image = $6
             WHERE id = $1",
        )
        .bind(id)
        .bind(&item.name)
        .bind(&item.category)
        .bind(&item.price)
        .bind(&item.recipe)
        .bind(item.image.as_deref())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(UpdateOutcome { matched_count: 1, modified_count: 1 })
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM menu WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menu")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

#[async_trait]
impl ReviewRepository for PgStore {
    async fn list(&self) -> Result<Vec<Review>> {
        let rows = sqlx::query_as::<_, (Uuid, String, String, i16)>(
            "SELECT id, name, details, rating FROM reviews",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name, details, rating)| Review { id, name, details, rating })
            .collect())
    }
}

#[async_trait]
impl CartRepository for PgStore {
    async fn insert(&self, entry: NewCartEntry) -> Result<CartEntry> {
        let row = sqlx::query_as::<_, CartRow>(
            "INSERT INTO carts (id, email, menu_item_id, name, image, price, quantity)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id, email, menu_item_id, name, image, price, quantity, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&entry.email)
        .bind(entry.menu_item_id)
        .bind(&entry.name)
        .bind(entry.image.as_deref())
        .bind(&entry.price)
        .bind(entry.quantity)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn list_for(&self, email: &str) -> Result<Vec<CartEntry>> {
        let rows = sqlx::query_as::<_, CartRow>(
            "SELECT id, email, menu_item_id, name, image, price, quantity, created_at
             FROM carts WHERE email = $1 ORDER BY created_at",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(CartEntry::from).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl LedgerRepository for PgStore {
    async fn settle(&self, payment: NewPayment) -> Result<SettlementRecord> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "INSERT INTO payments
                (id, email, amount, amount_minor, menu_item_ids, cart_ids, transaction_id, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&payment.email)
        .bind(&payment.amount)
        .bind(payment.amount_minor)
        .bind(&payment.menu_item_ids)
        .bind(&payment.cart_ids)
        .bind(&payment.transaction_id)
        .bind(&payment.status)
        .fetch_one(&mut *tx)
        .await
        .context("insert payment")?;

        let deleted = sqlx::query("DELETE FROM carts WHERE id = ANY($1) AND email = $2")
            .bind(&payment.cart_ids)
            .bind(&payment.email)
            .execute(&mut *tx)
            .await
            .context("delete settled cart entries")?
            .rows_affected();

        tx.commit().await.context("commit settlement")?;
        Ok(SettlementRecord { payment: row.into(), deleted })
    }

    async fn list_for(&self, email: &str) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE email = $1 ORDER BY created_at"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Payment::from).collect())
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    fn stream_payments(&self) -> BoxStream<'_, Result<Payment>> {
        sqlx::query_as::<_, PaymentRow>(
            "SELECT id, email, amount, amount_minor, menu_item_ids, cart_ids, transaction_id, status, created_at
             FROM payments ORDER BY created_at",
        )
        .fetch(&self.pool)
        .map(|row| row.map(Payment::from).map_err(anyhow::Error::from))
        .boxed()
    }
}
