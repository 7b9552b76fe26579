//! Document handlers

use std::str::FromStr;

use axum::{
    extract::{Path, State},
    Json,
};

use domain_guest::{validator_for, DocumentCategory};

use crate::dto::guest::{DocumentRuleResponse, GuestResponse};
use crate::{error::ApiError, AppState};

/// Finds the guest holding a document number, in any formatting
pub async fn find_guest_by_document(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<GuestResponse>, ApiError> {
    state
        .service
        .find_by_document_number(&number)
        .await
        .map(|guest| Json(guest.into()))
        .ok_or_else(|| ApiError::NotFound(format!("No guest holds document {}", number)))
}

/// Describes the rule a document category is validated against
pub async fn document_rule(
    Path(category): Path<String>,
) -> Result<Json<DocumentRuleResponse>, ApiError> {
    let category = DocumentCategory::from_str(&category)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(Json(DocumentRuleResponse {
        category,
        rule: validator_for(category).explain(),
    }))
}
