use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    IntoActiveModel, NotSet, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{non_blank, validate_decimal_non_negative};
use crate::{
    db::DbPool,
    entities::{
        budget_allocation::{self, Entity as BudgetEntity, Model as BudgetModel},
        period, support, Currency,
    },
    errors::{ServiceError, ValidationIssue},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BudgetInput {
    pub support_id: i32,
    pub period_id: i32,
    #[validate(custom = "validate_decimal_non_negative")]
    #[schema(value_type = String, example = "15000.00")]
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BudgetFilter {
    pub support_id: Option<i32>,
    pub period_id: Option<i32>,
}

#[derive(Clone)]
pub struct BudgetService {
    db: Arc<DbPool>,
}

impl BudgetService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: BudgetFilter) -> Result<Vec<BudgetModel>, ServiceError> {
        let mut condition = Condition::all();
        if let Some(support_id) = filter.support_id {
            condition = condition.add(budget_allocation::Column::SupportId.eq(support_id));
        }
        if let Some(period_id) = filter.period_id {
            condition = condition.add(budget_allocation::Column::PeriodId.eq(period_id));
        }

        let budgets = BudgetEntity::find()
            .filter(condition)
            .order_by_asc(budget_allocation::Column::PeriodId)
            .order_by_asc(budget_allocation::Column::SupportId)
            .all(&*self.db)
            .await?;
        Ok(budgets)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<BudgetModel, ServiceError> {
        BudgetEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Budget {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: BudgetInput) -> Result<BudgetModel, ServiceError> {
        input.validate()?;
        check_references(&*self.db, input.support_id, input.period_id).await?;

        let now = Utc::now();
        let created = budget_allocation::ActiveModel {
            id: NotSet,
            support_id: Set(input.support_id),
            period_id: Set(input.period_id),
            amount: Set(input.amount),
            currency: Set(input.currency.unwrap_or_default()),
            notes: Set(non_blank(input.notes)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| ServiceError::from_db("Budget", e))?;

        info!(
            id = created.id,
            support_id = created.support_id,
            period_id = created.period_id,
            "Budget allocation created"
        );
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: i32, input: BudgetInput) -> Result<BudgetModel, ServiceError> {
        input.validate()?;
        let existing = self.get(id).await?;
        check_references(&*self.db, input.support_id, input.period_id).await?;

        let currency = input.currency.unwrap_or(existing.currency);
        let mut active = existing.into_active_model();
        active.support_id = Set(input.support_id);
        active.period_id = Set(input.period_id);
        active.amount = Set(input.amount);
        active.currency = Set(currency);
        active.notes = Set(non_blank(input.notes));
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db("Budget", e))?;

        info!(id, "Budget allocation updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = BudgetEntity::delete_by_id(id)
            .exec(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db("Budget", e))?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Budget {} not found", id)));
        }

        info!(id, "Budget allocation deleted");
        Ok(())
    }
}

/// Reports one issue per dangling reference instead of relying on the
/// foreign key error, which names neither field.
async fn check_references<C: ConnectionTrait>(
    db: &C,
    support_id: i32,
    period_id: i32,
) -> Result<(), ServiceError> {
    let mut issues = Vec::new();
    if support::Entity::find_by_id(support_id).one(db).await?.is_none() {
        issues.push(ValidationIssue::new(
            "supportId",
            "not_found",
            format!("support {} does not exist", support_id),
        ));
    }
    if period::Entity::find_by_id(period_id).one(db).await?.is_none() {
        issues.push(ValidationIssue::new(
            "periodId",
            "not_found",
            format!("period {} does not exist", period_id),
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::InvalidFields(issues))
    }
}
