use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    IntoActiveModel, NotSet, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{
    non_blank,
    status_workflow::{check_transition, LifecycleStatus},
    validate_decimal_non_negative,
};
use crate::{
    db::DbPool,
    entities::{
        oc_status_history::{self, Entity as HistoryEntity, Model as HistoryModel},
        purchase_order::{self, Entity as PurchaseOrderEntity, Model as PurchaseOrderModel},
        vendor, Currency, OcStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Read view of an OC with its vendor resolved.
///
/// For linked rows `proveedor` and `ruc` come from the referenced vendor; the
/// legacy columns are only reported while `proveedorId` is null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderView {
    pub id: i32,
    pub number: String,
    pub description: Option<String>,
    pub proveedor_id: Option<i32>,
    pub proveedor: Option<String>,
    pub ruc: Option<String>,
    pub vendor_linked: bool,
    pub currency: Currency,
    #[schema(value_type = String, example = "2500.00")]
    pub amount: Decimal,
    pub estado: OcStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseOrderView {
    pub fn from_parts(order: PurchaseOrderModel, vendor: Option<vendor::Model>) -> Self {
        let (proveedor, ruc, vendor_linked) = match vendor {
            Some(v) if order.proveedor_id == Some(v.id) => (Some(v.razon_social), Some(v.ruc), true),
            _ => (order.proveedor, order.ruc, false),
        };
        Self {
            id: order.id,
            number: order.number,
            description: order.description,
            proveedor_id: order.proveedor_id,
            proveedor,
            ruc,
            vendor_linked,
            currency: order.currency,
            amount: order.amount,
            estado: order.estado,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderInput {
    #[validate(length(min = 1, max = 64, message = "number must be 1 to 64 characters"))]
    #[schema(example = "OC-2025-0001")]
    pub number: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: Option<String>,
    /// Vendor reference; takes precedence over `proveedor`/`ruc`
    #[serde(default)]
    pub proveedor_id: Option<i32>,
    /// Legacy vendor name, kept only while the OC is unlinked
    #[validate(length(max = 255))]
    #[serde(default)]
    pub proveedor: Option<String>,
    /// Legacy vendor tax id, kept only while the OC is unlinked
    #[validate(length(max = 32))]
    #[serde(default)]
    pub ruc: Option<String>,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[validate(custom = "validate_decimal_non_negative")]
    #[schema(value_type = String, example = "2500.00")]
    pub amount: Decimal,
}

impl PurchaseOrderInput {
    fn normalized(self) -> Self {
        Self {
            number: self.number.trim().to_string(),
            description: non_blank(self.description),
            proveedor: non_blank(self.proveedor),
            ruc: non_blank(self.ruc),
            ..self
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderStatusChange {
    pub status: OcStatus,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PurchaseOrderFilter {
    pub estado: Option<OcStatus>,
    pub proveedor_id: Option<i32>,
}

#[derive(Clone)]
pub struct PurchaseOrderService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    strict_transitions: bool,
}

impl PurchaseOrderService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, strict_transitions: bool) -> Self {
        Self {
            db,
            event_sender,
            strict_transitions,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: PurchaseOrderFilter,
    ) -> Result<Vec<PurchaseOrderView>, ServiceError> {
        let mut condition = Condition::all();
        if let Some(estado) = filter.estado {
            condition = condition.add(purchase_order::Column::Estado.eq(estado));
        }
        if let Some(proveedor_id) = filter.proveedor_id {
            condition = condition.add(purchase_order::Column::ProveedorId.eq(proveedor_id));
        }

        let rows = PurchaseOrderEntity::find()
            .find_also_related(vendor::Entity)
            .filter(condition)
            .order_by_asc(purchase_order::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(order, vendor)| PurchaseOrderView::from_parts(order, vendor))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<PurchaseOrderView, ServiceError> {
        view(&*self.db, id).await
    }

    /// Creates an OC in `PENDING` with its first history row
    #[instrument(skip(self))]
    pub async fn create(&self, input: PurchaseOrderInput) -> Result<PurchaseOrderView, ServiceError> {
        let input = input.normalized();
        input.validate()?;

        let txn = self.db.begin().await?;
        let linked = match input.proveedor_id {
            Some(vendor_id) => Some(require_vendor(&txn, vendor_id).await?),
            None => None,
        };
        let (proveedor, ruc) = if linked.is_some() {
            (None, None)
        } else {
            (input.proveedor, input.ruc)
        };

        let now = Utc::now();
        let status = OcStatus::initial();
        let created = purchase_order::ActiveModel {
            id: NotSet,
            number: Set(input.number),
            description: Set(input.description),
            proveedor_id: Set(input.proveedor_id),
            proveedor: Set(proveedor),
            ruc: Set(ruc),
            currency: Set(input.currency.unwrap_or_default()),
            amount: Set(input.amount),
            estado: Set(status),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| ServiceError::from_db("Purchase order", e))?;

        oc_status_history::ActiveModel {
            id: NotSet,
            oc_id: Set(created.id),
            status: Set(status),
            previous_status: Set(None),
            note: Set(None),
            changed_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(id = created.id, number = %created.number, "Purchase order created");
        Ok(PurchaseOrderView::from_parts(created, linked))
    }

    /// Updates the non-status fields. Legacy vendor columns of a linked OC
    /// are left untouched.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: i32,
        input: PurchaseOrderInput,
    ) -> Result<PurchaseOrderView, ServiceError> {
        let input = input.normalized();
        input.validate()?;

        let txn = self.db.begin().await?;
        let existing = PurchaseOrderEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {} not found", id)))?;

        // A linked OC stays linked unless a different vendor is named
        let proveedor_id = input.proveedor_id.or(existing.proveedor_id);
        let linked = match proveedor_id {
            Some(vendor_id) => Some(require_vendor(&txn, vendor_id).await?),
            None => None,
        };

        let currency = input.currency.unwrap_or(existing.currency);
        let mut active = existing.into_active_model();
        active.number = Set(input.number);
        active.description = Set(input.description);
        active.proveedor_id = Set(proveedor_id);
        if linked.is_none() {
            active.proveedor = Set(input.proveedor);
            active.ruc = Set(input.ruc);
        }
        active.currency = Set(currency);
        active.amount = Set(input.amount);
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| ServiceError::from_db("Purchase order", e))?;
        txn.commit().await?;

        info!(id, "Purchase order updated");
        Ok(PurchaseOrderView::from_parts(updated, linked))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        HistoryEntity::delete_many()
            .filter(oc_status_history::Column::OcId.eq(id))
            .exec(&txn)
            .await?;
        let result = PurchaseOrderEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| ServiceError::from_db("Purchase order", e))?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Purchase order {} not found",
                id
            )));
        }
        txn.commit().await?;

        info!(id, "Purchase order deleted");
        Ok(())
    }

    /// Moves the OC to `change.status` and appends one history row in the
    /// same transaction. Subscribers are notified after commit.
    #[instrument(skip(self), fields(oc_id = %id, new_status = %change.status))]
    pub async fn change_status(
        &self,
        id: i32,
        change: PurchaseOrderStatusChange,
    ) -> Result<PurchaseOrderView, ServiceError> {
        change.validate()?;

        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        let (order, vendor) = PurchaseOrderEntity::find_by_id(id)
            .find_also_related(vendor::Entity)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {} not found", id)))?;

        let old_status = order.estado;
        check_transition(old_status, change.status, self.strict_transitions)?;

        let now = Utc::now();
        let mut active = order.into_active_model();
        active.estado = Set(change.status);
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        oc_status_history::ActiveModel {
            id: NotSet,
            oc_id: Set(id),
            status: Set(change.status),
            previous_status: Set(Some(old_status)),
            note: Set(non_blank(change.note)),
            changed_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await.map_err(|e| {
            error!("Failed to commit status change for purchase order {}: {}", id, e);
            ServiceError::DatabaseError(e)
        })?;

        info!(
            "Purchase order {} status updated from '{}' to '{}'",
            id, old_status, change.status
        );

        self.event_sender
            .publish(Event::PurchaseOrderStatusChanged {
                oc_id: id,
                old_status,
                new_status: change.status,
                changed_at: now,
            })
            .await;

        Ok(PurchaseOrderView::from_parts(updated, vendor))
    }

    #[instrument(skip(self))]
    pub async fn history(&self, id: i32) -> Result<Vec<HistoryModel>, ServiceError> {
        if PurchaseOrderEntity::find_by_id(id).one(&*self.db).await?.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Purchase order {} not found",
                id
            )));
        }

        let entries = HistoryEntity::find()
            .filter(oc_status_history::Column::OcId.eq(id))
            .order_by_asc(oc_status_history::Column::ChangedAt)
            .order_by_asc(oc_status_history::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(entries)
    }
}

async fn view<C: ConnectionTrait>(db: &C, id: i32) -> Result<PurchaseOrderView, ServiceError> {
    let (order, vendor) = PurchaseOrderEntity::find_by_id(id)
        .find_also_related(vendor::Entity)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {} not found", id)))?;
    Ok(PurchaseOrderView::from_parts(order, vendor))
}

async fn require_vendor<C: ConnectionTrait>(
    db: &C,
    vendor_id: i32,
) -> Result<vendor::Model, ServiceError> {
    vendor::Entity::find_by_id(vendor_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::invalid_field(
                "proveedorId",
                "not_found",
                format!("vendor {} does not exist", vendor_id),
            )
        })
}
