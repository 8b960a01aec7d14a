//! Paper entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "papers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "String(StringLen::N(255))")]
    pub title: String,

    /// `abstract` is a reserved keyword in Rust
    #[sea_orm(column_name = "abstract", column_type = "Text", nullable)]
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,

    /// Text extracted from the uploaded PDF
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
