use actix_web::http::StatusCode;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// Everything that can go wrong inside a catalog flow. Each handler converts
/// these into a failure envelope at its own boundary; nothing propagates
/// uncaught and nothing is retried.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("category not found")]
    CategoryNotFound,
    #[error("product not found")]
    ProductNotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("database error: {0}")]
    Database(#[from] DieselError),
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("picture transform failed: {0}")]
    Transform(#[from] std::io::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::CategoryNotFound | ApiError::ProductNotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            // Writes the store rejects because of the client's data are the
            // client's fault, not the server's.
            ApiError::Database(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::NotNullViolation
                | DatabaseErrorKind::CheckViolation,
                _,
            )) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
