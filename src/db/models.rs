use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::schema::{categories, products};

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = categories)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Serialize, Deserialize, Debug)]
#[diesel(table_name = categories)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
}

/// Category update only ever touches name and description; the id and the
/// timestamps are managed elsewhere.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = categories)]
pub struct UpdateCategory {
    pub name: String,
    pub description: String,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = products)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: i32,
    pub quantity: i32,
    /// Stored compressed; decompressed only on the read path.
    pub picture: Vec<u8>,
    pub category_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = products)]
pub struct NewProduct {
    pub name: String,
    pub price: i32,
    pub quantity: i32,
    pub picture: Vec<u8>,
    pub category_id: i32,
}
