use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use super::status::OcStatus;
use utoipa::ToSchema;

/// Append-only audit row, one per purchase order status change.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "oc_status_history")]
#[serde(rename_all = "camelCase")]
#[schema(as = OcStatusHistoryEntry)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub oc_id: i32,
    pub status: OcStatus,
    pub previous_status: Option<OcStatus>,
    pub note: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_order::Entity",
        from = "Column::OcId",
        to = "super::purchase_order::Column::Id",
        on_delete = "Cascade"
    )]
    PurchaseOrder,
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
