use crate::core::PipelineError;
use crate::models::{AddressRole, ErrorResponse};
use crate::services::StoreError;
use actix_web::{error, http::StatusCode, HttpRequest, HttpResponse};
use std::fmt;

/// Errors surfaced to HTTP clients as `{ code, message }`
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    CaptchaInvalid,
    AddressNotFound { address: String, role: AddressRole },
    GeocodingUnavailable,
    Internal,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::CaptchaInvalid => "INVALID_RECAPTCHA",
            ApiError::AddressNotFound { .. } => "ADDRESS_NOT_FOUND",
            ApiError::GeocodingUnavailable => "GEOCODING_PROVIDER_ERROR",
            ApiError::Internal => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::Validation(detail) => format!("Request validation failed: {}", detail),
            ApiError::CaptchaInvalid => "reCAPTCHA verification failed. Please try again.".to_string(),
            ApiError::AddressNotFound { address, role } => {
                format!("Could not find coordinates for {} address: {}", role, address)
            }
            ApiError::GeocodingUnavailable => {
                "The geocoding service is currently unavailable. Please try again later.".to_string()
            }
            ApiError::Internal => "An internal error occurred. Please try again later.".to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for ApiError {}

impl error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::AddressNotFound { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::CaptchaInvalid => StatusCode::BAD_REQUEST,
            ApiError::GeocodingUnavailable => StatusCode::BAD_GATEWAY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            code: self.code().to_string(),
            message: self.message(),
        })
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(detail) => ApiError::Validation(detail),
            PipelineError::CaptchaInvalid(_) => ApiError::CaptchaInvalid,
            PipelineError::AddressNotFound { address, role } => ApiError::AddressNotFound { address, role },
            PipelineError::GeocodingUnavailable(_) => ApiError::GeocodingUnavailable,
            PipelineError::PersistenceFailed(_) => ApiError::Internal,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!("History store error: {}", err);
        ApiError::Internal
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    ApiError::Validation(format!("Invalid JSON: {}", err)).into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query payload error on {}: {}", req.path(), err);
    ApiError::Validation(format!("Invalid query: {}", err)).into()
}
