use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, EntityTrait, IntoActiveModel, NotSet, QueryOrder,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use super::non_blank;
use crate::{
    db::DbPool,
    entities::period::{self, Entity as PeriodEntity, Model as PeriodModel},
    errors::ServiceError,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodInput {
    #[validate(range(min = 2020, max = 2050, message = "year must be between 2020 and 2050"))]
    pub year: i32,
    #[validate(range(min = 1, max = 12, message = "month must be between 1 and 12"))]
    pub month: i32,
    /// Defaults to `YYYY-MM`
    #[validate(length(max = 32))]
    pub label: Option<String>,
}

impl PeriodInput {
    pub fn label_or_default(&self) -> String {
        non_blank(self.label.clone()).unwrap_or_else(|| format!("{:04}-{:02}", self.year, self.month))
    }
}

#[derive(Clone)]
pub struct PeriodService {
    db: Arc<DbPool>,
}

impl PeriodService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<PeriodModel>, ServiceError> {
        let periods = PeriodEntity::find()
            .order_by_asc(period::Column::Year)
            .order_by_asc(period::Column::Month)
            .all(&*self.db)
            .await?;
        Ok(periods)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<PeriodModel, ServiceError> {
        PeriodEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Period {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: PeriodInput) -> Result<PeriodModel, ServiceError> {
        input.validate()?;

        let created = period::ActiveModel {
            id: NotSet,
            year: Set(input.year),
            month: Set(input.month),
            label: Set(input.label_or_default()),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| ServiceError::from_db("Period", e))?;

        info!(id = created.id, label = %created.label, "Period created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: i32, input: PeriodInput) -> Result<PeriodModel, ServiceError> {
        input.validate()?;

        let existing = self.get(id).await?;
        let mut active = existing.into_active_model();
        active.year = Set(input.year);
        active.month = Set(input.month);
        active.label = Set(input.label_or_default());

        let updated = active
            .update(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db("Period", e))?;

        info!(id, "Period updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = PeriodEntity::delete_by_id(id)
            .exec(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db("Period", e))?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Period {} not found", id)));
        }

        info!(id, "Period deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_defaults_to_year_month() {
        let input = PeriodInput {
            year: 2025,
            month: 3,
            label: None,
        };
        assert_eq!(input.label_or_default(), "2025-03");

        let labelled = PeriodInput {
            label: Some(" Q1 cierre ".into()),
            ..input
        };
        assert_eq!(labelled.label_or_default(), "Q1 cierre");
    }

    #[test]
    fn month_out_of_range_is_rejected() {
        let input = PeriodInput {
            year: 2025,
            month: 13,
            label: None,
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("month"));
    }
}
