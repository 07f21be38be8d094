use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quotecache_core::errors::{DatabaseError, Error as CoreError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("Not Found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Clone, Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

/// Status code for an engine error.
pub fn core_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::InvalidSymbol(_) | CoreError::InvalidConfigValue(_) => StatusCode::BAD_REQUEST,
        CoreError::MarketData(e) if e.is_invalid_symbol() => StatusCode::BAD_REQUEST,
        CoreError::SourceTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        CoreError::SourceFailure { .. } | CoreError::MarketData(_) => StatusCode::BAD_GATEWAY,
        CoreError::Database(DatabaseError::NotFound(_)) => StatusCode::NOT_FOUND,
        CoreError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
        CoreError::Serialization(_) | CoreError::Unexpected(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl ErrorBody {
    pub fn from_core(err: &CoreError) -> Self {
        Self {
            code: core_status(err).as_u16(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Core(e) => core_status(e),
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use quotecache_core::LadderTier;
    use quotecache_market_data::MarketDataError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CoreError::InvalidSymbol("B@D".into()), 400),
            (
                CoreError::SourceTimeout {
                    symbol: "AAPL".into(),
                    tier: LadderTier::Total,
                },
                504,
            ),
            (
                CoreError::SourceFailure {
                    symbol: "AAPL".into(),
                    tier: LadderTier::Cache,
                    message: "boom".into(),
                },
                502,
            ),
            (
                CoreError::Database(DatabaseError::ConnectionFailed("gone".into())),
                503,
            ),
            (
                CoreError::MarketData(MarketDataError::InvalidSymbol("X!".into())),
                400,
            ),
            (CoreError::Unexpected("?".into()), 500),
        ];
        for (err, expected) in cases {
            assert_eq!(core_status(&err).as_u16(), expected, "{}", err);
        }
    }
}
