//! Transport-layer envelopes shared by every handler.
//!
//! Successful single-resource answers are wrapped in [`ApiResponse`], list
//! answers in [`PaginatedResponse`] and failures in [`ErrorResponse`].

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// One page of a list query.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    /// Number of matching rows over all pages
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub message: String,
    pub success: bool,
}

impl<T> PaginatedResponse<T> {
    /// `total_pages` is `ceil(total / limit)`, zero for an empty result.
    pub fn new(data: Vec<T>, total: u64, page: u64, limit: u64, message: impl Into<String>) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            data,
            total,
            page,
            limit,
            total_pages,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success flag (always false)
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        let page = PaginatedResponse::new(vec![1, 2, 3], 21, 1, 10, "ok");
        assert_eq!(page.total_pages, 3);

        let empty: PaginatedResponse<i32> = PaginatedResponse::new(vec![], 0, 1, 10, "ok");
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_envelopes_serialize_with_success_flag() {
        let json = serde_json::to_value(ApiResponse::ok(5, "done")).unwrap();
        assert_eq!(json["data"], 5);
        assert_eq!(json["success"], true);

        let err = ErrorResponse {
            error: "Customer not found".to_string(),
            code: "NOT_FOUND".to_string(),
            success: false,
        };
        let json = serde_json::to_value(err).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["success"], false);
    }
}
