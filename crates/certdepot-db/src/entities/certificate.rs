//! Certificate entity storing generated PKCS#12 bundles

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "certificates")]
pub struct Model {
    /// Record id (primary key, auto-increment)
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stored filename, always `<requested name>.p12`
    pub filename: String,

    /// PKCS#12 archive bytes, stored inline
    #[sea_orm(column_type = "Blob")]
    pub payload: Vec<u8>,

    /// When the record was created (never mutated afterwards)
    pub uploaded_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
