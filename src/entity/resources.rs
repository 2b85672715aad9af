//! 资源实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "resources")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub batch_id: i64,
    pub title: String,
    pub resource_type: String,
    pub file_name: String,
    #[sea_orm(unique)]
    pub stored_name: String,
    pub file_size: i64,
    pub content_type: String,
    pub uploaded_by: i64,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::batches::Entity",
        from = "Column::BatchId",
        to = "super::batches::Column::Id"
    )]
    Batch,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UploadedBy",
        to = "super::users::Column::Id"
    )]
    Uploader,
}

impl Related<super::batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batch.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Uploader.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_resource(self) -> crate::models::resources::entities::Resource {
        use crate::models::resources::entities::{Resource, ResourceType};

        Resource {
            id: self.id,
            batch_id: self.batch_id,
            title: self.title,
            resource_type: self
                .resource_type
                .parse::<ResourceType>()
                .unwrap_or(ResourceType::Assignment),
            file_name: self.file_name,
            stored_name: self.stored_name,
            file_size: self.file_size,
            content_type: self.content_type,
            uploaded_by: self.uploaded_by,
            created_at: super::ts_to_datetime(self.created_at),
        }
    }
}
