use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::Deserialize;
use validator::Validate;

use crate::error::AppError;
use crate::models::Product;
use crate::startup::AppState;

/// GET /products
#[tracing::instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = state.db.list_products().await?;
    Ok(Json(products))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    pub price: f64,
}

/// POST /products (admin)
#[tracing::instrument(skip(state, request))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    request.validate()?;

    if request.price < 0.0 {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Product price cannot be negative"
        )));
    }

    let mut product = Product {
        id: None,
        name: request.name,
        price: request.price,
    };

    let id = state.db.insert_product(&product).await?;
    product.id = Some(id);

    Ok((StatusCode::CREATED, Json(product)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<f64>,
}

/// PUT /products/:id (admin)
#[tracing::instrument(skip(state, request))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    let object_id = ObjectId::parse_str(&id)
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid product id: {}", id)))?;

    let mut patch = Document::new();
    if let Some(name) = request.name {
        patch.insert("name", name);
    }
    if let Some(price) = request.price {
        patch.insert("price", price);
    }
    if patch.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Update requires at least one field"
        )));
    }

    state
        .db
        .update_product(object_id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Product not found: {}", id)))
}

/// DELETE /products/:id (admin). Products are hard-deleted; only orders
/// are tombstoned.
#[tracing::instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let object_id = ObjectId::parse_str(&id)
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid product id: {}", id)))?;

    if state.db.delete_product(object_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(anyhow::anyhow!(
            "Product not found: {}",
            id
        )))
    }
}
