use std::collections::HashMap;

use anyhow::{Context, Result};
use bigdecimal::BigDecimal;
use common_money::{from_minor_units, MoneyError};
use futures_util::{try_join, TryStreamExt};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{MenuItem, Payment};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub users: u64,
    pub menu_items: u64,
    pub payment_items: u64,
    pub revenue: BigDecimal,
}

/// One ledger line per referenced menu item, joined against the catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCatalogRow {
    #[serde(flatten)]
    pub payment: Payment,
    pub menu_item_id: Uuid,
    pub menu_items: Vec<MenuItem>,
}

#[derive(Clone)]
pub struct AnalyticsAggregator {
    store: Store,
}

impl AnalyticsAggregator {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn summary(&self) -> Result<AdminStats> {
        let (users, menu_items, payment_items, revenue_minor) = try_join!(
            self.store.users.count(),
            self.store.menu.count(),
            self.store.ledger.count(),
            self.revenue_minor(),
        )?;
        Ok(AdminStats {
            users,
            menu_items,
            payment_items,
            revenue: from_minor_units(revenue_minor),
        })
    }

    async fn revenue_minor(&self) -> Result<i64> {
        self.store
            .ledger
            .stream_payments()
            .try_fold(0i64, |total, payment| async move {
                total
                    .checked_add(payment.amount_minor)
                    .ok_or(MoneyError::SumOverflow)
                    .with_context(|| format!("revenue overflow at payment {}", payment.id))
            })
            .await
    }

    pub async fn order_catalog(&self) -> Result<Vec<OrderCatalogRow>> {
        let catalog: HashMap<Uuid, MenuItem> = self
            .store
            .menu
            .list()
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        self.store
            .ledger
            .stream_payments()
            .try_fold(Vec::new(), |mut rows, payment| {
                for menu_item_id in &payment.menu_item_ids {
                    rows.push(OrderCatalogRow {
                        payment: payment.clone(),
                        menu_item_id: *menu_item_id,
                        menu_items: catalog.get(menu_item_id).cloned().into_iter().collect(),
                    });
                }
                async move { Ok::<_, anyhow::Error>(rows) }
            })
            .await
    }
}
