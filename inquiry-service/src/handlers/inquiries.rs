use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use mongodb::bson::{self, Document};
use serde_json::Value;
use service_core::error::AppError;

use crate::dtos::inquiries::MAX_LIST_LIMIT;
use crate::dtos::{CreateInquiryResponse, InquiryResponse, ListInquiriesQuery, ListInquiriesResponse};
use crate::models::Inquiry;
use crate::services::{record_inquiry_created, record_inquiry_listed, validate, StoreHandle};
use crate::startup::AppState;

#[tracing::instrument(skip(state, body))]
pub async fn create_inquiry(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateInquiryResponse>), AppError> {
    let Json(raw) = body.map_err(|e| {
        record_inquiry_created("rejected");
        AppError::BadRequest(anyhow::anyhow!("Invalid JSON body: {}", e.body_text()))
    })?;

    let inquiry = validate(&raw).map_err(|e| {
        record_inquiry_created("rejected");
        AppError::from(e)
    })?;

    let id = state
        .store
        .insert(&state.config.store.collection, &inquiry)
        .await
        .map_err(|e| {
            record_inquiry_created("failed");
            AppError::from(e)
        })?;

    record_inquiry_created("created");
    tracing::info!(inquiry_id = %id, "Inquiry created");

    Ok((StatusCode::CREATED, Json(CreateInquiryResponse { id })))
}

#[tracing::instrument(skip(state))]
pub async fn list_inquiries(
    State(state): State<AppState>,
    Query(query): Query<ListInquiriesQuery>,
) -> Result<Json<ListInquiriesResponse>, AppError> {
    if query.limit < 0 {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Invalid limit: {}. Must be zero or greater",
            query.limit
        )));
    }

    let limit = query.limit.min(MAX_LIST_LIMIT) as u32;

    let items = fetch(&state, Document::new(), limit).await.map_err(|e| {
        record_inquiry_listed("failed");
        e
    })?;

    record_inquiry_listed("listed");
    Ok(Json(ListInquiriesResponse { items }))
}

#[tracing::instrument(skip(state))]
pub async fn get_inquiry(
    State(state): State<AppState>,
    Path(inquiry_id): Path<String>,
) -> Result<Json<InquiryResponse>, AppError> {
    let filter = StoreHandle::id_filter(&inquiry_id)?;

    fetch(&state, filter, 1)
        .await?
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Inquiry not found: {}", inquiry_id)))
}

/// Listed documents rendered as inquiries. Documents that do not deserialize
/// as an [`Inquiry`] are logged and left out.
async fn fetch(
    state: &AppState,
    filter: Document,
    limit: u32,
) -> Result<Vec<InquiryResponse>, AppError> {
    let documents = state
        .store
        .list(&state.config.store.collection, filter, limit)
        .await?;

    Ok(documents
        .into_iter()
        .filter_map(|doc| {
            let id = doc.get_str("_id").unwrap_or("-").to_string();
            match bson::from_document::<Inquiry>(doc) {
                Ok(inquiry) => Some(InquiryResponse::from(inquiry)),
                Err(e) => {
                    tracing::warn!(
                        document_id = %id,
                        "Skipping stored document that is not an inquiry: {}",
                        e
                    );
                    None
                }
            }
        })
        .collect())
}
