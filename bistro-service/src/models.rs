use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use common_auth::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Self-registration payload. Any `role` field the client sends is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Registration {
    Created(User),
    Existing(User),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub price: BigDecimal,
    pub recipe: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMenuItem {
    pub name: String,
    pub category: String,
    pub price: BigDecimal,
    #[serde(default)]
    pub recipe: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Partial catalog update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<BigDecimal>,
    pub recipe: Option<String>,
    pub image: Option<String>,
}

impl MenuPatch {
    pub fn apply(&self, item: &mut MenuItem) -> bool {
        let before = item.clone();
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(category) = &self.category {
            item.category = category.clone();
        }
        if let Some(price) = &self.price {
            item.price = price.clone();
        }
        if let Some(recipe) = &self.recipe {
            item.recipe = recipe.clone();
        }
        if let Some(image) = &self.image {
            item.image = Some(image.clone());
        }
        *item != before
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub name: String,
    pub details: String,
    pub rating: i16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub id: Uuid,
    pub email: String,
    pub menu_item_id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub price: BigDecimal,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartEntry {
    pub email: String,
    pub menu_item_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub price: BigDecimal,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

/// Immutable ledger record written once per settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub email: String,
    pub amount: BigDecimal,
    pub amount_minor: i64,
    pub menu_item_ids: Vec<Uuid>,
    pub cart_ids: Vec<Uuid>,
    pub transaction_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub email: String,
    pub amount: BigDecimal,
    pub amount_minor: i64,
    pub menu_item_ids: Vec<Uuid>,
    pub cart_ids: Vec<Uuid>,
    pub transaction_id: String,
    pub status: String,
}

impl NewPayment {
    pub fn into_payment(self, id: Uuid, created_at: DateTime<Utc>) -> Payment {
        Payment {
            id,
            email: self.email,
            amount: self.amount,
            amount_minor: self.amount_minor,
            menu_item_ids: self.menu_item_ids,
            cart_ids: self.cart_ids,
            transaction_id: self.transaction_id,
            status: self.status,
            created_at,
        }
    }
}

/// What the ledger reports after a settlement committed.
#[derive(Debug, Clone)]
pub struct SettlementRecord {
    pub payment: Payment,
    pub deleted: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub deleted_count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    pub inserted_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl InsertOutcome {
    pub fn created(id: Uuid) -> Self {
        Self { inserted_id: Some(id), message: None }
    }
}
