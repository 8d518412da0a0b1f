use sea_orm::entity::prelude::*;

/// A dynamic configuration row.
///
/// `category` selects the runtime component the row configures and `data` carries the
/// category-specific payload (JSON object, CIDR, comma list or timestamp).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "configuration")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub category: String,
    pub status: i32,
    #[sea_orm(column_type = "Text")]
    pub data: String,
    pub owner: String,
    pub description: String,
    pub started_at: DateTimeUtc,
    pub ended_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
