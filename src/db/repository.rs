use chrono::Utc;
use diesel::prelude::*;

use crate::db::connection::{PgPool, PgPooledConnection};
use crate::db::models::{Category, NewCategory, NewProduct, Product, UpdateCategory};
use crate::db::schema::{categories, products};
use crate::error::ApiError;

/// Category persistence, as plain records. Implementations must not carry
/// lazy-loading proxies or per-request state.
pub trait CategoryStore: Send + Sync {
    fn list(&self) -> Result<Vec<Category>, ApiError>;
    fn find(&self, id: i32) -> Result<Option<Category>, ApiError>;
    fn insert(&self, new_category: NewCategory) -> Result<Category, ApiError>;
    fn update(&self, id: i32, changes: UpdateCategory) -> Result<Option<Category>, ApiError>;
    /// Idempotent: deleting an absent id is not an error.
    fn delete(&self, id: i32) -> Result<(), ApiError>;
}

/// Product persistence. Reads return the product together with its category
/// so callers never need a second lookup.
pub trait ProductStore: Send + Sync {
    /// Inserts the product inside one transaction that first verifies the
    /// referenced category exists; fails with [`ApiError::CategoryNotFound`]
    /// and persists nothing otherwise.
    fn insert(&self, new_product: NewProduct) -> Result<(Product, Category), ApiError>;
    fn find(&self, id: i32) -> Result<Option<(Product, Category)>, ApiError>;
}

/// Diesel-backed implementation of both stores over one shared pool.
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        PgCatalog { pool }
    }

    fn conn(&self) -> Result<PgPooledConnection, ApiError> {
        Ok(self.pool.get()?)
    }
}

impl CategoryStore for PgCatalog {
    fn list(&self) -> Result<Vec<Category>, ApiError> {
        let conn = &mut self.conn()?;
        Ok(categories::table.order(categories::id.asc()).load(conn)?)
    }

    fn find(&self, id: i32) -> Result<Option<Category>, ApiError> {
        let conn = &mut self.conn()?;
        Ok(categories::table.find(id).first(conn).optional()?)
    }

    fn insert(&self, new_category: NewCategory) -> Result<Category, ApiError> {
        let conn = &mut self.conn()?;
        Ok(diesel::insert_into(categories::table)
            .values(&new_category)
            .get_result(conn)?)
    }

    fn update(&self, id: i32, changes: UpdateCategory) -> Result<Option<Category>, ApiError> {
        let conn = &mut self.conn()?;
        Ok(diesel::update(categories::table.find(id))
            .set((changes, categories::updated_at.eq(Utc::now().naive_utc())))
            .get_result(conn)
            .optional()?)
    }

    fn delete(&self, id: i32) -> Result<(), ApiError> {
        let conn = &mut self.conn()?;
        diesel::delete(categories::table.find(id)).execute(conn)?;
        Ok(())
    }
}

impl ProductStore for PgCatalog {
    fn insert(&self, new_product: NewProduct) -> Result<(Product, Category), ApiError> {
        let conn = &mut self.conn()?;
        conn.transaction(|conn| {
            let category = categories::table
                .find(new_product.category_id)
                .first::<Category>(conn)
                .optional()?
                .ok_or(ApiError::CategoryNotFound)?;
            let product: Product = diesel::insert_into(products::table)
                .values(&new_product)
                .get_result(conn)?;
            Ok((product, category))
        })
    }

    fn find(&self, id: i32) -> Result<Option<(Product, Category)>, ApiError> {
        let conn = &mut self.conn()?;
        Ok(products::table
            .inner_join(categories::table)
            .filter(products::id.eq(id))
            .first::<(Product, Category)>(conn)
            .optional()?)
    }
}
