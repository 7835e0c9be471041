use axum::http::{header::AUTHORIZATION, HeaderMap};
use serde::Deserialize;
use utoipa::IntoParams;
use warbler_database::ListQuery;

use crate::ApiError;

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn require_bearer(headers: &HeaderMap) -> Result<String, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("missing authorization header"))?;

    let (scheme, token) = value.trim().split_once(' ').unwrap_or((value.trim(), ""));
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(ApiError::unauthorized("invalid authorization scheme"));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::unauthorized("missing bearer token"));
    }

    Ok(token.to_string())
}

/// `?page=&limit=&search=` as accepted by the list endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// 1-based page number, default 1
    pub page: Option<u32>,
    /// Page size, default 10, at most 100
    pub limit: Option<u32>,
    pub search: Option<String>,
}

impl From<PageParams> for ListQuery {
    fn from(params: PageParams) -> Self {
        ListQuery::new(params.page, params.limit, params.search)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    #[test]
    fn require_bearer_extracts_token_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer TOKEN123"));

        assert_eq!(require_bearer(&headers).unwrap(), "TOKEN123");
    }

    #[test]
    fn require_bearer_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));

        let error = require_bearer(&headers).unwrap_err();
        assert_eq!(error.status, StatusCode::UNAUTHORIZED);
        assert!(error.message.contains("scheme"));
    }

    #[test]
    fn require_bearer_rejects_missing_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer"));

        let error = require_bearer(&headers).unwrap_err();
        assert!(error.message.contains("missing bearer token"));
        assert!(require_bearer(&HeaderMap::new()).is_err());
    }

    #[test]
    fn page_params_are_clamped() {
        let query = ListQuery::from(PageParams {
            page: Some(0),
            limit: Some(1000),
            search: Some("  ".to_string()),
        });
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 100);
        assert_eq!(query.search, None);
    }
}
