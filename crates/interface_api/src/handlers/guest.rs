//! Guest handlers

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use domain_guest::GuestRole;

use crate::dto::guest::*;
use crate::handlers::{parse_guest_id, request_service, validated};
use crate::{error::ApiError, AppState};

/// Registers a primary guest
pub async fn register_primary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RegisterPrimaryRequest>,
) -> Result<(StatusCode, Json<GuestResponse>), ApiError> {
    let request = validated(request)?;
    let guest = request_service(&state, &headers).register_primary(request.into()).await?;
    Ok((StatusCode::CREATED, Json(guest.into())))
}

/// Lists guests, optionally filtered by role
pub async fn list_guests(
    State(state): State<AppState>,
    Query(query): Query<GuestListQuery>,
) -> Json<Vec<GuestResponse>> {
    let guests = match query.role {
        Some(GuestRole::Primary) => state.service.all_primaries().await,
        Some(GuestRole::Companion) => state.service.all_companions().await,
        None => state.service.all_guests().await,
    };
    Json(guests.iter().map(GuestResponse::from).collect())
}

/// Gets a guest by ID
pub async fn get_guest(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GuestResponse>, ApiError> {
    let guest = state.service.get_guest(parse_guest_id(&id)?).await?;
    Ok(Json(guest.into()))
}

/// Changes names or birth date
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<GuestResponse>, ApiError> {
    let id = parse_guest_id(&id)?;
    let request = validated(request)?;
    let guest = request_service(&state, &headers).update_profile(id, request.into()).await?;
    Ok(Json(guest.into()))
}

/// Removes a guest; companions follow the configured policy
pub async fn remove_guest(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<RemovedGuestResponse>, ApiError> {
    let outcome = request_service(&state, &headers).remove_guest(parse_guest_id(&id)?).await?;
    Ok(Json(outcome.into()))
}

/// Registers a companion under a primary guest
pub async fn register_companion(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<RegisterCompanionRequest>,
) -> Result<(StatusCode, Json<GuestResponse>), ApiError> {
    let primary_id = parse_guest_id(&id)?;
    let request = validated(request)?;
    let companion = request_service(&state, &headers)
        .register_companion(primary_id, request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(companion.into())))
}

/// Lists the companions of a primary guest
pub async fn list_companions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<GuestResponse>>, ApiError> {
    let companions = state.service.companions_of(parse_guest_id(&id)?).await?;
    Ok(Json(companions.iter().map(GuestResponse::from).collect()))
}

/// Replaces a guest's address, cascading to companions of a primary
pub async fn update_address(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<AddressDto>,
) -> Result<Json<GuestResponse>, ApiError> {
    let id = parse_guest_id(&id)?;
    let address = validated(request)?;
    let guest = request_service(&state, &headers).update_address(id, address.into()).await?;
    Ok(Json(guest.into()))
}

/// Moves a guest under another primary guest
pub async fn reassign_primary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ReassignPrimaryRequest>,
) -> Result<Json<GuestResponse>, ApiError> {
    let id = parse_guest_id(&id)?;
    let guest = request_service(&state, &headers)
        .reassign_primary(id, request.primary_id)
        .await?;
    Ok(Json(guest.into()))
}

/// Attaches a document
pub async fn attach_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<DocumentRequest>,
) -> Result<Json<GuestResponse>, ApiError> {
    let id = parse_guest_id(&id)?;
    let document = validated(request)?;
    let guest = request_service(&state, &headers).attach_document(id, document.into()).await?;
    Ok(Json(guest.into()))
}

/// Attaches a contact number
pub async fn attach_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ContactRequest>,
) -> Result<Json<GuestResponse>, ApiError> {
    let id = parse_guest_id(&id)?;
    let contact = validated(request)?;
    let guest = request_service(&state, &headers).attach_contact(id, contact.into()).await?;
    Ok(Json(guest.into()))
}
