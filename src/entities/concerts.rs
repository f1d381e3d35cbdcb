use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "concerts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    pub artist: String,

    pub genre: String,

    /// `YYYY-MM-DD`, so lexical order is chronological order.
    pub date: String,

    /// `HH:MM`, 24-hour clock.
    pub time: String,

    pub location: String,

    pub price: f64,

    pub description: String,

    pub image_url: String,

    pub music_url: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
