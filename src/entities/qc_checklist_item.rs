use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of the reviewer's checklist, recorded with the verdict.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "qc_checklist_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub qc_request_id: Uuid,
    pub category: String,
    pub description: String,
    pub passed: bool,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::qc_request::Entity",
        from = "Column::QcRequestId",
        to = "super::qc_request::Column::Id"
    )]
    QcRequest,
}

impl Related<super::qc_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QcRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
