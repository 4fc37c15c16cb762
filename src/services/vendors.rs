use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, IntoActiveModel, NotSet,
    QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    db::DbPool,
    entities::vendor::{self, Entity as VendorEntity, Model as VendorModel},
    errors::ServiceError,
};

/// Length of a Peruvian tax id (RUC)
pub const RUC_LEN: usize = 11;

pub fn is_valid_ruc(ruc: &str) -> bool {
    ruc.len() == RUC_LEN && ruc.bytes().all(|b| b.is_ascii_digit())
}

fn validate_ruc(ruc: &str) -> Result<(), ValidationError> {
    if is_valid_ruc(ruc) {
        return Ok(());
    }
    let mut err = ValidationError::new("format");
    err.message = Some("ruc must be exactly 11 digits".into());
    Err(err)
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorInput {
    #[validate(length(min = 1, max = 255, message = "razonSocial must be 1 to 255 characters"))]
    #[schema(example = "Servicios Generales SAC")]
    pub razon_social: String,
    #[validate(custom = "validate_ruc")]
    #[schema(example = "20123456789")]
    pub ruc: String,
    #[serde(default)]
    pub active: Option<bool>,
}

impl VendorInput {
    fn normalized(self) -> Self {
        Self {
            razon_social: self.razon_social.trim().to_string(),
            ruc: self.ruc.trim().to_string(),
            active: self.active,
        }
    }
}

#[derive(Clone)]
pub struct VendorService {
    db: Arc<DbPool>,
}

impl VendorService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<VendorModel>, ServiceError> {
        let vendors = VendorEntity::find()
            .order_by_asc(vendor::Column::RazonSocial)
            .all(&*self.db)
            .await?;
        Ok(vendors)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<VendorModel, ServiceError> {
        VendorEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Vendor {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn get_by_ruc(&self, ruc: &str) -> Result<VendorModel, ServiceError> {
        VendorEntity::find()
            .filter(vendor::Column::Ruc.eq(ruc.trim()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Vendor with ruc {} not found", ruc)))
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: VendorInput) -> Result<VendorModel, ServiceError> {
        let input = input.normalized();
        input.validate()?;

        let now = Utc::now();
        let created = vendor::ActiveModel {
            id: NotSet,
            razon_social: Set(input.razon_social),
            ruc: Set(input.ruc),
            active: Set(input.active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| ServiceError::from_db("Vendor", e))?;

        info!(id = created.id, ruc = %created.ruc, "Vendor created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: i32, input: VendorInput) -> Result<VendorModel, ServiceError> {
        let input = input.normalized();
        input.validate()?;

        let existing = self.get(id).await?;
        let active_flag = input.active.unwrap_or(existing.active);
        let mut active = existing.into_active_model();
        active.razon_social = Set(input.razon_social);
        active.ruc = Set(input.ruc);
        active.active = Set(active_flag);
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db("Vendor", e))?;

        info!(id, "Vendor updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = VendorEntity::delete_by_id(id)
            .exec(&*self.db)
            .await
            .map_err(|e| ServiceError::from_db("Vendor", e))?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Vendor {} not found", id)));
        }

        info!(id, "Vendor deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("20123456789", true)]
    #[case("2012345678", false)]
    #[case("201234567890", false)]
    #[case("20123A56789", false)]
    #[case("", false)]
    #[case("２０１２３４５６７８９", false)]
    fn ruc_format(#[case] ruc: &str, #[case] expected: bool) {
        assert_eq!(is_valid_ruc(ruc), expected);
    }

    #[test]
    fn input_is_trimmed_before_validation() {
        let input = VendorInput {
            razon_social: "  Acme SAC ".into(),
            ruc: " 20123456789 ".into(),
            active: None,
        }
        .normalized();
        assert!(input.validate().is_ok());
        assert_eq!(input.ruc, "20123456789");
    }
}
