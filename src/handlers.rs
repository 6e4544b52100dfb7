use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use serde::Serialize;

use crate::compression;
use crate::db::models::{NewCategory, NewProduct, UpdateCategory};
use crate::db::repository::{CategoryStore, ProductStore};
use crate::error::ApiError;
use crate::response::{CategoryPayload, Envelope, ProductPayload, ProductView};

pub struct AppState {
    pub categories: Arc<dyn CategoryStore>,
    pub products: Arc<dyn ProductStore>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/categories", web::get().to(get_categories))
            .route("/categories", web::post().to(create_category))
            .route("/categories/{id}", web::get().to(get_category))
            .route("/categories/{id}", web::put().to(update_category))
            .route("/categories/{id}", web::delete().to(delete_category))
            .route("/products", web::post().to(create_product))
            .route("/products/{id}", web::get().to(get_product)),
    );
}

/// Converts a flow failure into the envelope the caller sees. No error
/// leaves a handler any other way.
fn failure<P: Serialize + Default>(err: &ApiError) -> HttpResponse {
    if err.status().is_server_error() {
        tracing::error!(%err, "request failed");
    } else {
        tracing::warn!(%err, "request rejected");
    }
    HttpResponse::build(err.status()).json(Envelope::<P>::failure(&err.to_string()))
}

async fn get_categories(data: web::Data<AppState>) -> HttpResponse {
    match data.categories.list() {
        Ok(categories) => HttpResponse::Ok().json(Envelope::ok(
            "Success response",
            CategoryPayload::of(categories),
        )),
        Err(err) => failure::<CategoryPayload>(&err),
    }
}

async fn get_category(data: web::Data<AppState>, id: web::Path<i32>) -> HttpResponse {
    let result = data
        .categories
        .find(id.into_inner())
        .and_then(|category| category.ok_or(ApiError::CategoryNotFound));
    match result {
        Ok(category) => HttpResponse::Ok().json(Envelope::ok(
            "Category found",
            CategoryPayload::of(vec![category]),
        )),
        Err(err) => failure::<CategoryPayload>(&err),
    }
}

async fn create_category(
    data: web::Data<AppState>,
    category: web::Json<NewCategory>,
) -> HttpResponse {
    if category.name.trim().is_empty() {
        let err = ApiError::BadRequest("category name cannot be empty".to_string());
        return failure::<CategoryPayload>(&err);
    }
    match data.categories.insert(category.into_inner()) {
        Ok(saved) => HttpResponse::Ok().json(Envelope::ok(
            "Category saved",
            CategoryPayload::of(vec![saved]),
        )),
        Err(err) => failure::<CategoryPayload>(&err),
    }
}

async fn update_category(
    data: web::Data<AppState>,
    id: web::Path<i32>,
    category: web::Json<NewCategory>,
) -> HttpResponse {
    if category.name.trim().is_empty() {
        let err = ApiError::BadRequest("category name cannot be empty".to_string());
        return failure::<CategoryPayload>(&err);
    }
    let category = category.into_inner();
    let changes = UpdateCategory {
        name: category.name,
        description: category.description,
    };
    let result = data
        .categories
        .update(id.into_inner(), changes)
        .and_then(|updated| updated.ok_or(ApiError::CategoryNotFound));
    match result {
        Ok(updated) => HttpResponse::Ok().json(Envelope::ok(
            "Category updated",
            CategoryPayload::of(vec![updated]),
        )),
        Err(err) => failure::<CategoryPayload>(&err),
    }
}

async fn delete_category(data: web::Data<AppState>, id: web::Path<i32>) -> HttpResponse {
    match data.categories.delete(id.into_inner()) {
        Ok(()) => HttpResponse::Ok().json(Envelope::ok(
            "Category deleted",
            CategoryPayload::default(),
        )),
        Err(err) => failure::<CategoryPayload>(&err),
    }
}

async fn create_product(data: web::Data<AppState>, payload: Multipart) -> HttpResponse {
    let form = match read_product_form(payload).await {
        Ok(form) => form,
        Err(err) => return failure::<ProductPayload>(&err),
    };
    // Compressed exactly once here; reversed exactly once in get_product.
    let compressed = match compression::compress(&form.picture) {
        Ok(bytes) => bytes,
        Err(err) => return failure::<ProductPayload>(&ApiError::Transform(err)),
    };
    let new_product = NewProduct {
        name: form.name,
        price: form.price,
        quantity: form.quantity,
        picture: compressed,
        category_id: form.category_id,
    };
    match data.products.insert(new_product) {
        Ok((product, category)) => HttpResponse::Ok().json(Envelope::ok(
            "Product saved",
            ProductPayload::of(vec![ProductView::new(product, category, None)]),
        )),
        Err(err) => failure::<ProductPayload>(&err),
    }
}

async fn get_product(data: web::Data<AppState>, id: web::Path<i32>) -> HttpResponse {
    let result = data.products.find(id.into_inner()).and_then(|found| {
        let (product, category) = found.ok_or(ApiError::ProductNotFound)?;
        let original = compression::decompress(&product.picture)?;
        Ok((product, category, original))
    });
    match result {
        Ok((product, category, original)) => HttpResponse::Ok().json(Envelope::ok(
            "Product found",
            ProductPayload::of(vec![ProductView::new(product, category, Some(original))]),
        )),
        Err(err) => failure::<ProductPayload>(&err),
    }
}

struct ProductForm {
    picture: Vec<u8>,
    name: String,
    price: i32,
    quantity: i32,
    category_id: i32,
}

async fn read_product_form(mut payload: Multipart) -> Result<ProductForm, ApiError> {
    let mut picture = None;
    let mut name = None;
    let mut price = None;
    let mut quantity = None;
    let mut category_id = None;

    while let Some(mut field) = payload.try_next().await.map_err(bad_multipart)? {
        let field_name = field.name().to_string();
        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(bad_multipart)? {
            data.extend_from_slice(&chunk);
        }
        match field_name.as_str() {
            "picture" => picture = Some(data),
            "name" => name = Some(text_field(data, "name")?),
            "price" => price = Some(int_field(data, "price")?),
            "quantity" => quantity = Some(int_field(data, "quantity")?),
            "categoryId" => category_id = Some(int_field(data, "categoryId")?),
            _ => {}
        }
    }

    Ok(ProductForm {
        picture: picture.ok_or_else(|| missing("picture"))?,
        name: name.ok_or_else(|| missing("name"))?,
        price: price.ok_or_else(|| missing("price"))?,
        quantity: quantity.ok_or_else(|| missing("quantity"))?,
        category_id: category_id.ok_or_else(|| missing("categoryId"))?,
    })
}

fn bad_multipart(err: actix_multipart::MultipartError) -> ApiError {
    ApiError::BadRequest(format!("malformed multipart payload: {err}"))
}

fn text_field(data: Vec<u8>, name: &str) -> Result<String, ApiError> {
    String::from_utf8(data)
        .map_err(|_| ApiError::BadRequest(format!("field `{name}` is not valid UTF-8")))
}

fn int_field(data: Vec<u8>, name: &str) -> Result<i32, ApiError> {
    text_field(data, name)?
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("field `{name}` is not a valid integer")))
}

fn missing(name: &str) -> ApiError {
    ApiError::BadRequest(format!("missing field `{name}`"))
}
