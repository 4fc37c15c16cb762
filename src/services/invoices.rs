use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    IntoActiveModel, NotSet, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{
    status_workflow::{check_transition, LifecycleStatus},
    validate_decimal_non_negative,
};
use crate::{
    db::DbPool,
    entities::{
        exchange_rate,
        invoice::{self, Entity as InvoiceEntity, Model as InvoiceModel},
        invoice_status_history::{self, Entity as HistoryEntity, Model as HistoryModel},
        purchase_order, vendor, Currency, DocType, InvoiceStatus,
    },
    errors::{ServiceError, ValidationIssue},
    events::{Event, EventSender},
};

/// Canonical form of a printed invoice number.
///
/// Whitespace is removed and letters are upper-cased. When the number has a
/// `SERIES-NUMBER` shape with a numeric tail, leading zeros of the tail are
/// dropped so that `f001-000123` and `F001-123` collide. Returns `None` for
/// blank input.
pub fn normalize_number(raw: &str) -> Option<String> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if compact.is_empty() {
        return None;
    }

    if let Some((series, tail)) = compact.rsplit_once('-') {
        if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
            let trimmed = tail.trim_start_matches('0');
            let tail = if trimmed.is_empty() { "0" } else { trimmed };
            return Some(format!("{}-{}", series, tail));
        }
    }
    Some(compact)
}

/// Local-currency total of an invoice.
///
/// PEN invoices are already local. USD invoices keep an explicit local total
/// when one was supplied, otherwise `total_foreign * rate` rounded half away
/// from zero to cents.
pub fn local_total(
    currency: Currency,
    total_foreign: Decimal,
    provided: Option<Decimal>,
    rate: Option<f64>,
) -> Result<Decimal, ServiceError> {
    if currency.is_local() {
        return Ok(total_foreign);
    }
    if let Some(total) = provided {
        return Ok(total);
    }
    let rate = rate.ok_or_else(|| {
        ServiceError::invalid_field("issueDate", "missing_rate", "no exchange rate for the issue year")
    })?;
    let rate = Decimal::try_from(rate).map_err(|_| {
        ServiceError::invalid_field("issueDate", "invalid_rate", "exchange rate is not representable")
    })?;
    Ok((total_foreign * rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Body of create and update requests. Status is not part of it; see
/// [`InvoiceStatusChange`].
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceInput {
    pub vendor_id: i32,
    #[serde(default)]
    pub oc_id: Option<i32>,
    pub doc_type: DocType,
    /// Number as printed; stored normalized
    #[validate(length(min = 1, max = 64, message = "number must be 1 to 64 characters"))]
    #[schema(example = "F001-000123")]
    pub number: String,
    pub issue_date: NaiveDate,
    pub currency: Currency,
    #[validate(custom = "validate_decimal_non_negative")]
    #[schema(example = "1180.00")]
    pub total_foreign: Decimal,
    /// Only honoured for USD; computed from the exchange rate when absent
    #[serde(default)]
    pub total_local: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceStatusChange {
    pub status: InvoiceStatus,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub vendor_id: Option<i32>,
}

impl InvoiceFilter {
    pub(crate) fn condition(&self) -> Condition {
        let mut condition = Condition::all();
        if let Some(status) = self.status {
            condition = condition.add(invoice::Column::StatusCurrent.eq(status));
        }
        if let Some(vendor_id) = self.vendor_id {
            condition = condition.add(invoice::Column::VendorId.eq(vendor_id));
        }
        condition
    }
}

/// Normalized, reference-checked values ready to be written
struct ResolvedInvoice {
    number_norm: String,
    total_local: Decimal,
}

#[derive(Clone)]
pub struct InvoiceService {
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    strict_transitions: bool,
}

impl InvoiceService {
    pub fn new(db: Arc<DbPool>, event_sender: Arc<EventSender>, strict_transitions: bool) -> Self {
        Self {
            db,
            event_sender,
            strict_transitions,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: InvoiceFilter) -> Result<Vec<InvoiceModel>, ServiceError> {
        let invoices = InvoiceEntity::find()
            .filter(filter.condition())
            .order_by_asc(invoice::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(invoices)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<InvoiceModel, ServiceError> {
        InvoiceEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", id)))
    }

    /// Creates an invoice in `RECEIVED` together with its first history row
    #[instrument(skip(self))]
    pub async fn create(&self, input: InvoiceInput) -> Result<InvoiceModel, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;
        let resolved = resolve(&txn, &input).await?;

        let now = Utc::now();
        let status = InvoiceStatus::initial();
        let created = invoice::ActiveModel {
            id: NotSet,
            vendor_id: Set(input.vendor_id),
            oc_id: Set(input.oc_id),
            doc_type: Set(input.doc_type),
            number_norm: Set(resolved.number_norm),
            issue_date: Set(input.issue_date),
            currency: Set(input.currency),
            total_foreign: Set(input.total_foreign),
            total_local: Set(resolved.total_local),
            status_current: Set(status),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| ServiceError::from_db("Invoice", e))?;

        invoice_status_history::ActiveModel {
            id: NotSet,
            invoice_id: Set(created.id),
            status: Set(status),
            previous_status: Set(None),
            note: Set(None),
            changed_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(
            id = created.id,
            vendor_id = created.vendor_id,
            number = %created.number_norm,
            "Invoice created"
        );
        Ok(created)
    }

    /// Replaces every field except the status
    #[instrument(skip(self))]
    pub async fn update(&self, id: i32, input: InvoiceInput) -> Result<InvoiceModel, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;
        let existing = InvoiceEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", id)))?;
        let resolved = resolve(&txn, &input).await?;

        let mut active = existing.into_active_model();
        active.vendor_id = Set(input.vendor_id);
        active.oc_id = Set(input.oc_id);
        active.doc_type = Set(input.doc_type);
        active.number_norm = Set(resolved.number_norm);
        active.issue_date = Set(input.issue_date);
        active.currency = Set(input.currency);
        active.total_foreign = Set(input.total_foreign);
        active.total_local = Set(resolved.total_local);
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| ServiceError::from_db("Invoice", e))?;
        txn.commit().await?;

        info!(id, "Invoice updated");
        Ok(updated)
    }

    /// Deletes the invoice and its history
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        HistoryEntity::delete_many()
            .filter(invoice_status_history::Column::InvoiceId.eq(id))
            .exec(&txn)
            .await?;
        let result = InvoiceEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| ServiceError::from_db("Invoice", e))?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Invoice {} not found", id)));
        }
        txn.commit().await?;

        info!(id, "Invoice deleted");
        Ok(())
    }

    /// Moves the invoice to `change.status` and appends one history row in
    /// the same transaction. Subscribers are notified after commit.
    #[instrument(skip(self), fields(invoice_id = %id, new_status = %change.status))]
    pub async fn change_status(
        &self,
        id: i32,
        change: InvoiceStatusChange,
    ) -> Result<InvoiceModel, ServiceError> {
        change.validate()?;

        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        let invoice = InvoiceEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", id)))?;

        let old_status = invoice.status_current;
        check_transition(old_status, change.status, self.strict_transitions)?;

        let now = Utc::now();
        let mut active = invoice.into_active_model();
        active.status_current = Set(change.status);
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        invoice_status_history::ActiveModel {
            id: NotSet,
            invoice_id: Set(id),
            status: Set(change.status),
            previous_status: Set(Some(old_status)),
            note: Set(super::non_blank(change.note)),
            changed_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await.map_err(|e| {
            error!("Failed to commit status change for invoice {}: {}", id, e);
            ServiceError::DatabaseError(e)
        })?;

        info!(
            "Invoice {} status updated from '{}' to '{}'",
            id, old_status, change.status
        );

        self.event_sender
            .publish(Event::InvoiceStatusChanged {
                invoice_id: id,
                old_status,
                new_status: change.status,
                changed_at: now,
            })
            .await;

        Ok(updated)
    }

    /// Audit trail, oldest first
    #[instrument(skip(self))]
    pub async fn history(&self, id: i32) -> Result<Vec<HistoryModel>, ServiceError> {
        self.get(id).await?;

        let entries = HistoryEntity::find()
            .filter(invoice_status_history::Column::InvoiceId.eq(id))
            .order_by_asc(invoice_status_history::Column::ChangedAt)
            .order_by_asc(invoice_status_history::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(entries)
    }
}

async fn resolve<C: ConnectionTrait>(
    db: &C,
    input: &InvoiceInput,
) -> Result<ResolvedInvoice, ServiceError> {
    let number_norm = normalize_number(&input.number).ok_or_else(|| {
        ServiceError::invalid_field("number", "blank", "number must not be blank")
    })?;

    let mut issues = Vec::new();
    if vendor::Entity::find_by_id(input.vendor_id).one(db).await?.is_none() {
        issues.push(ValidationIssue::new(
            "vendorId",
            "not_found",
            format!("vendor {} does not exist", input.vendor_id),
        ));
    }
    if let Some(oc_id) = input.oc_id {
        if purchase_order::Entity::find_by_id(oc_id).one(db).await?.is_none() {
            issues.push(ValidationIssue::new(
                "ocId",
                "not_found",
                format!("purchase order {} does not exist", oc_id),
            ));
        }
    }
    if !issues.is_empty() {
        return Err(ServiceError::InvalidFields(issues));
    }

    let rate = if input.currency.is_local() || input.total_local.is_some() {
        None
    } else {
        exchange_rate::Entity::find()
            .filter(exchange_rate::Column::Year.eq(input.issue_date.year()))
            .one(db)
            .await?
            .map(|r| r.rate)
    };
    let total_local = local_total(input.currency, input.total_foreign, input.total_local, rate)?;

    Ok(ResolvedInvoice {
        number_norm,
        total_local,
    })
}
