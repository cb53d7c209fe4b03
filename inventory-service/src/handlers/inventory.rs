//! Product CRUD handlers.
//!
//! Successful writes answer with a bare JSON `true`; every failure goes
//! through [`AppError`] and its `{code, message}` envelope.

use crate::models::{Product, ProductPatch, UpdateField, UPDATE_FIELD_HEADER};
use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;

pub const STATUS_MESSAGE: &str = "IMS API is running...";

pub async fn index() -> impl IntoResponse {
    Json(STATUS_MESSAGE)
}

pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    let products = state.repository.list_products().await?;

    if products.is_empty() {
        return Err(AppError::not_found("No products found"));
    }

    tracing::debug!(count = products.len(), "Listed products");
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Product>, AppError> {
    let id = parse_product_id(&raw_id)?;

    let product = state
        .repository
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    Ok(Json(product))
}

pub async fn create_product(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<bool>), AppError> {
    let product: Product = decode_body(&body)?;

    tracing::info!(product_id = product.id, product_name = %product.name, "Creating product");

    state.repository.create_product(&product).await?;

    Ok((StatusCode::CREATED, Json(true)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<bool>, AppError> {
    let id = parse_product_id(&raw_id)?;
    let field = update_field(&headers)?;
    let patch: ProductPatch = decode_body(&body)?;
    let update = patch.into_update(field)?;

    tracing::info!(product_id = id, field = field.as_str(), "Updating product");

    state.repository.update_product(id, update).await?;

    Ok(Json(true))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<bool>, AppError> {
    let id = parse_product_id(&raw_id)?;

    tracing::info!(product_id = id, "Deleting product");

    state.repository.delete_product(id).await?;

    Ok(Json(true))
}

fn parse_product_id(raw: &str) -> Result<u64, AppError> {
    raw.parse::<u64>().map_err(|e| {
        tracing::debug!(id = %raw, error = %e, "Rejected product id");
        AppError::bad_request("Invalid product id")
    })
}

fn update_field(headers: &HeaderMap) -> Result<UpdateField, AppError> {
    headers
        .get(UPDATE_FIELD_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Invalid field"))?
        .parse()
}

// Bodies are read as raw bytes so a missing or wrong Content-Type does not
// change how the payload is judged.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::bad_request(format!("Invalid request body: {}", e)))
}
