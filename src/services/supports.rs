use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, EntityTrait, IntoActiveModel,
    NotSet, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::non_blank;
use crate::{
    db::DbPool,
    entities::support::{self, Entity as SupportEntity, Model as SupportModel},
    errors::ServiceError,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupportInput {
    #[validate(length(min = 1, max = 32, message = "code must be 1 to 32 characters"))]
    #[schema(example = "SUP-001")]
    pub code: String,
    #[validate(length(min = 1, max = 200, message = "name must be 1 to 200 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "category must be 1 to 100 characters"))]
    pub category: String,
    #[validate(length(max = 100))]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

impl SupportInput {
    fn normalized(self) -> Self {
        Self {
            code: self.code.trim().to_string(),
            name: self.name.trim().to_string(),
            category: self.category.trim().to_string(),
            subcategory: non_blank(self.subcategory),
            active: self.active,
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SupportFilter {
    pub active: Option<bool>,
    pub category: Option<String>,
    /// Matches code or name
    pub search: Option<String>,
}

#[derive(Clone)]
pub struct SupportService {
    db: Arc<DbPool>,
}

impl SupportService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: SupportFilter) -> Result<Vec<SupportModel>, ServiceError> {
        let mut condition = Condition::all();
        if let Some(active) = filter.active {
            condition = condition.add(support::Column::Active.eq(active));
        }
        if let Some(category) = non_blank(filter.category) {
            condition = condition.add(support::Column::Category.eq(category));
        }
        if let Some(search) = non_blank(filter.search) {
            condition = condition.add(
                Condition::any()
                    .add(support::Column::Code.contains(&search))
                    .add(support::Column::Name.contains(&search)),
            );
        }

        let supports = SupportEntity::find()
            .filter(condition)
            .order_by_asc(support::Column::Code)
            .all(&*self.db)
            .await?;
        Ok(supports)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<SupportModel, ServiceError> {
        SupportEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Support {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: SupportInput) -> Result<SupportModel, ServiceError> {
        let input = input.normalized();
        input.validate()?;

        let now = Utc::now();
        let created = support::ActiveModel {
            id: NotSet,
            code: Set(input.code),
            name: Set(input.name),
            category: Set(input.category),
            subcategory: Set(input.subcategory),
            active: Set(input.active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| ServiceError::from_db("Support", e))?;

        info!(id = created.id, code = %created.code, "Support created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: i32, input: SupportInput) -> Result<SupportModel, ServiceError> {
        let input = input.normalized();
        input.validate()?;

        let existing = self.get(id).await?;
        let active_flag = input.active.unwrap_or(existing.active);
        let mut active = existing.into_active_model();
        active.code = Set(input.code);
        active.name = Set(input.name);
        active.category = Set(input.category);
        active.subcategory = Set(input.subcategory);
        active.active = Set(active_flag);
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db("Support", e))?;

        info!(id, "Support updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = SupportEntity::delete_by_id(id)
            .exec(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db("Support", e))?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Support {} not found", id)));
        }

        info!(id, "Support deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_trims_before_validation() {
        let input = SupportInput {
            code: "  SUP-9 ".into(),
            name: " Licencias ".into(),
            category: "TI".into(),
            subcategory: Some("   ".into()),
            active: None,
        }
        .normalized();

        assert_eq!(input.code, "SUP-9");
        assert_eq!(input.name, "Licencias");
        assert!(input.subcategory.is_none());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn blank_code_is_invalid_after_trim() {
        let input = SupportInput {
            code: "   ".into(),
            name: "x".into(),
            category: "y".into(),
            subcategory: None,
            active: None,
        }
        .normalized();

        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("code"));
    }
}
