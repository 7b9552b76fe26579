//! Request handlers

pub mod document;
pub mod guest;
pub mod health;

use axum::http::HeaderMap;
use core_kernel::GuestId;
use domain_guest::GuestService;
use validator::Validate;

use crate::error::ApiError;
use crate::middleware::REQUEST_ID_HEADER;
use crate::AppState;

/// Parses a guest id path segment (with or without the `GST-` prefix)
pub(crate) fn parse_guest_id(raw: &str) -> Result<GuestId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid guest id: {}", raw)))
}

/// Runs field validation on a request body
pub(crate) fn validated<T: Validate>(request: T) -> Result<T, ApiError> {
    request.validate()?;
    Ok(request)
}

/// The service handle for one request, tagged with its request id so the
/// store can log it next to each write
pub(crate) fn request_service(state: &AppState, headers: &HeaderMap) -> GuestService {
    match headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()) {
        Some(request_id) => state.service.with_correlation_id(request_id),
        None => GuestService::clone(&state.service),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::HeaderValue;
    use domain_guest::{GuestServiceConfig, InMemoryGuestStore};

    use super::*;
    use crate::config::ApiConfig;

    fn state() -> AppState {
        let service = GuestService::new(
            Arc::new(InMemoryGuestStore::new()),
            GuestServiceConfig::default(),
        );
        AppState {
            service: Arc::new(service),
            config: ApiConfig::default(),
        }
    }

    #[test]
    fn test_request_id_becomes_correlation_id() {
        let state = state();
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("7f9c-req"));

        let service = request_service(&state, &headers);
        assert_eq!(service.correlation_id(), Some("7f9c-req"));
        assert_eq!(state.service.correlation_id(), None);
    }

    #[test]
    fn test_missing_request_id_leaves_service_untagged() {
        let service = request_service(&state(), &HeaderMap::new());
        assert_eq!(service.correlation_id(), None);
    }

    #[test]
    fn test_parse_guest_id_rejects_garbage() {
        assert!(matches!(parse_guest_id("not-an-id"), Err(ApiError::BadRequest(_))));
    }
}
