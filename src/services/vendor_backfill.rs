//! One-shot migration that turns the vendor columns embedded in purchase
//! orders into `vendors` rows and links each order to its vendor.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseTransaction,
    EntityTrait, NotSet, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::{
    db::DbPool,
    entities::{purchase_order, vendor},
    errors::ServiceError,
    events::{Event, EventSender},
    services::vendors,
};

/// Outcome of a backfill run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackfillReport {
    /// Unlinked orders examined
    pub scanned: u64,
    pub vendors_created: u64,
    pub vendors_reused: u64,
    pub orders_linked: u64,
    /// Unlinked orders with a blank or missing legacy ruc
    pub skipped_without_ruc: u64,
    /// Unlinked orders whose legacy ruc is not 11 digits
    pub skipped_invalid_ruc: u64,
    /// True when the run was rolled back
    pub dry_run: bool,
}

/// Unlinked orders sharing one legacy ruc
#[derive(Debug)]
struct RucGroup {
    ruc: String,
    name: Option<String>,
    order_ids: Vec<i32>,
}

/// Groups orders by trimmed ruc in first-seen order. The group name is the
/// first non-blank legacy name among its orders. Orders whose ruc could not
/// be a vendor ruc stay unlinked.
fn group_by_ruc(orders: &[purchase_order::Model], report: &mut BackfillReport) -> Vec<RucGroup> {
    let mut groups: Vec<RucGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for order in orders {
        report.scanned += 1;

        let ruc = match order.ruc.as_deref().map(str::trim) {
            Some(ruc) if !ruc.is_empty() => ruc.to_string(),
            _ => {
                report.skipped_without_ruc += 1;
                continue;
            }
        };
        if !vendors::is_valid_ruc(&ruc) {
            report.skipped_invalid_ruc += 1;
            continue;
        }
        let name = order
            .proveedor
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        match index.get(&ruc) {
            Some(&i) => {
                let group = &mut groups[i];
                if group.name.is_none() {
                    group.name = name;
                }
                group.order_ids.push(order.id);
            }
            None => {
                index.insert(ruc.clone(), groups.len());
                groups.push(RucGroup {
                    ruc,
                    name,
                    order_ids: vec![order.id],
                });
            }
        }
    }

    groups
}

#[derive(Clone)]
pub struct VendorBackfillService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl VendorBackfillService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Runs the backfill in a single transaction. A dry run computes the
    /// same report and rolls back. Running it again after a commit creates
    /// and links nothing.
    #[instrument(skip(self))]
    pub async fn run(&self, dry_run: bool) -> Result<BackfillReport, ServiceError> {
        let txn = self.db.begin().await?;

        let report = match backfill(&txn, dry_run).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Vendor backfill failed; rolling back");
                txn.rollback().await?;
                return Err(e);
            }
        };

        if dry_run {
            txn.rollback().await?;
            info!(?report, "Vendor backfill dry run rolled back");
            return Ok(report);
        }

        txn.commit().await?;
        info!(
            scanned = report.scanned,
            vendors_created = report.vendors_created,
            vendors_reused = report.vendors_reused,
            orders_linked = report.orders_linked,
            skipped_without_ruc = report.skipped_without_ruc,
            skipped_invalid_ruc = report.skipped_invalid_ruc,
            "Vendor backfill committed"
        );

        self.event_sender
            .publish(Event::VendorsBackfilled {
                vendors_created: report.vendors_created,
                orders_linked: report.orders_linked,
            })
            .await;

        Ok(report)
    }
}

async fn backfill(txn: &DatabaseTransaction, dry_run: bool) -> Result<BackfillReport, ServiceError> {
    let mut report = BackfillReport {
        dry_run,
        ..Default::default()
    };

    let orders = purchase_order::Entity::find()
        .filter(purchase_order::Column::ProveedorId.is_null())
        .order_by_asc(purchase_order::Column::Id)
        .all(txn)
        .await?;

    for group in group_by_ruc(&orders, &mut report) {
        let existing = vendor::Entity::find()
            .filter(vendor::Column::Ruc.eq(group.ruc.as_str()))
            .one(txn)
            .await?;

        let vendor_id = match existing {
            Some(v) => {
                report.vendors_reused += 1;
                v.id
            }
            None => {
                let now = Utc::now();
                let created = vendor::ActiveModel {
                    id: NotSet,
                    razon_social: Set(group.name.clone().unwrap_or_else(|| group.ruc.clone())),
                    ruc: Set(group.ruc.clone()),
                    active: Set(true),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(txn)
                .await
                .map_err(|e| ServiceError::from_db("Vendor", e))?;
                report.vendors_created += 1;
                created.id
            }
        };

        let linked = purchase_order::Entity::update_many()
            .col_expr(purchase_order::Column::ProveedorId, Expr::value(vendor_id))
            .col_expr(purchase_order::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(purchase_order::Column::Id.is_in(group.order_ids))
            .filter(purchase_order::Column::ProveedorId.is_null())
            .exec(txn)
            .await?;
        report.orders_linked += linked.rows_affected;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Currency, OcStatus};
    use rust_decimal::Decimal;

    fn order(id: i32, proveedor: Option<&str>, ruc: Option<&str>) -> purchase_order::Model {
        let now = Utc::now();
        purchase_order::Model {
            id,
            number: format!("OC-{}", id),
            description: None,
            proveedor_id: None,
            proveedor: proveedor.map(str::to_string),
            ruc: ruc.map(str::to_string),
            currency: Currency::Pen,
            amount: Decimal::ZERO,
            estado: OcStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn groups_by_trimmed_ruc_in_first_seen_order() {
        let orders = vec![
            order(1, None, Some(" 20100000002 ")),
            order(2, Some("Acme SAC"), Some("20100000001")),
            order(3, Some("Late Name"), Some("20100000002")),
            order(4, Some("Other"), Some("   ")),
            order(5, Some("Acme Renamed"), Some("20100000001")),
            order(6, Some("No Ruc"), None),
        ];
        let mut report = BackfillReport::default();
        let groups = group_by_ruc(&orders, &mut report);

        assert_eq!(report.scanned, 6);
        assert_eq!(report.skipped_without_ruc, 2);

        let rucs: Vec<&str> = groups.iter().map(|g| g.ruc.as_str()).collect();
        assert_eq!(rucs, ["20100000002", "20100000001"]);

        assert_eq!(groups[0].name.as_deref(), Some("Late Name"));
        assert_eq!(groups[0].order_ids, [1, 3]);
        assert_eq!(groups[1].name.as_deref(), Some("Acme SAC"));
        assert_eq!(groups[1].order_ids, [2, 5]);
    }

    #[test]
    fn invalid_rucs_are_counted_and_left_out() {
        let orders = vec![
            order(1, Some("Letras"), Some("ABC")),
            order(2, Some("Corto"), Some("2010000000")),
            order(3, Some("Acme SAC"), Some("20100000001")),
            order(4, Some("Con guion"), Some("20100000-01")),
        ];
        let mut report = BackfillReport::default();
        let groups = group_by_ruc(&orders, &mut report);

        assert_eq!(report.scanned, 4);
        assert_eq!(report.skipped_invalid_ruc, 3);
        assert_eq!(report.skipped_without_ruc, 0);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].ruc, "20100000001");
        assert_eq!(groups[0].order_ids, [3]);
    }
}
