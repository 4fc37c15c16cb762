use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, IntoActiveModel, NotSet,
    QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    db::DbPool,
    entities::exchange_rate::{self, Entity as ExchangeRateEntity, Model as ExchangeRateModel},
    errors::ServiceError,
};

pub const MIN_YEAR: i32 = 2020;
pub const MAX_YEAR: i32 = 2050;

/// Body of create and update requests
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRateInput {
    #[schema(example = 2024)]
    pub year: i32,
    /// PEN per USD; strictly between 0 and 100
    #[schema(example = 3.75)]
    pub rate: f64,
}

// Hand-written so the open interval on `rate` is reported together with
// the year check.
impl Validate for ExchangeRateInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !(MIN_YEAR..=MAX_YEAR).contains(&self.year) {
            let mut err = ValidationError::new("range");
            err.message = Some("year must be between 2020 and 2050".into());
            errors.add("year", err);
        }
        if !(self.rate.is_finite() && self.rate > 0.0 && self.rate < 100.0) {
            let mut err = ValidationError::new("range");
            err.message = Some("rate must be greater than 0 and less than 100".into());
            errors.add("rate", err);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl ExchangeRateInput {
    pub fn check(&self) -> Result<(), ServiceError> {
        self.validate().map_err(ServiceError::from)
    }
}

#[derive(Clone)]
pub struct ExchangeRateService {
    db: Arc<DbPool>,
}

impl ExchangeRateService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Lists every rate ordered by year
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<ExchangeRateModel>, ServiceError> {
        let rates = ExchangeRateEntity::find()
            .order_by_asc(exchange_rate::Column::Year)
            .all(&*self.db)
            .await?;
        Ok(rates)
    }

    #[instrument(skip(self))]
    pub async fn find_by_year(&self, year: i32) -> Result<Option<ExchangeRateModel>, ServiceError> {
        let rate = ExchangeRateEntity::find()
            .filter(exchange_rate::Column::Year.eq(year))
            .one(&*self.db)
            .await?;
        Ok(rate)
    }

    #[instrument(skip(self))]
    pub async fn get_by_year(&self, year: i32) -> Result<ExchangeRateModel, ServiceError> {
        self.find_by_year(year)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Exchange rate for {} not found", year)))
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: ExchangeRateInput) -> Result<ExchangeRateModel, ServiceError> {
        input.check()?;

        let now = Utc::now();
        let created = exchange_rate::ActiveModel {
            id: NotSet,
            year: Set(input.year),
            rate: Set(input.rate),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| ServiceError::from_db("Exchange rate", e))?;

        info!(year = created.year, rate = created.rate, "Exchange rate created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: i32,
        input: ExchangeRateInput,
    ) -> Result<ExchangeRateModel, ServiceError> {
        input.check()?;

        let existing = ExchangeRateEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Exchange rate {} not found", id)))?;

        let mut active = existing.into_active_model();
        active.year = Set(input.year);
        active.rate = Set(input.rate);
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db("Exchange rate", e))?;

        info!(id, year = updated.year, "Exchange rate updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = ExchangeRateEntity::delete_by_id(id)
            .exec(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db("Exchange rate", e))?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Exchange rate {} not found",
                id
            )));
        }

        info!(id, "Exchange rate deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    fn issues_for(input: ExchangeRateInput) -> Vec<String> {
        match input.check() {
            Ok(()) => Vec::new(),
            Err(ServiceError::InvalidFields(issues)) => issues.into_iter().map(|i| i.path).collect(),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn accepts_rate_inside_bounds() {
        assert_matches!(
            ExchangeRateInput { year: 2024, rate: 3.75 }.check(),
            Ok(())
        );
    }

    #[test]
    fn rejects_bounds_and_non_finite_rates() {
        assert_eq!(issues_for(ExchangeRateInput { year: 2024, rate: 0.0 }), ["rate"]);
        assert_eq!(issues_for(ExchangeRateInput { year: 2024, rate: 100.0 }), ["rate"]);
        assert_eq!(issues_for(ExchangeRateInput { year: 2024, rate: f64::NAN }), ["rate"]);
        assert_eq!(
            issues_for(ExchangeRateInput { year: 2019, rate: -1.0 }),
            ["rate", "year"]
        );
    }

    proptest! {
        #[test]
        fn year_validation_matches_range(year in 1990i32..2080) {
            let valid = issues_for(ExchangeRateInput { year, rate: 3.5 }).is_empty();
            prop_assert_eq!(valid, (MIN_YEAR..=MAX_YEAR).contains(&year));
        }

        #[test]
        fn rate_validation_matches_open_interval(rate in -10.0f64..120.0) {
            let valid = issues_for(ExchangeRateInput { year: 2030, rate }).is_empty();
            prop_assert_eq!(valid, rate > 0.0 && rate < 100.0);
        }
    }
}
