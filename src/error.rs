use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::api::models::ErrorResponse;

/// API 전역 오류 타입
///
/// 모든 핸들러와 주문 생명주기 로직이 이 타입으로 실패를 보고합니다.
/// 저장소 오류는 내부에만 상세를 로깅하고 호출자에게는 일반 메시지를 돌려줍니다.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 입력 검증 실패 (누락 필드, 0 이하 수량/가격 등)
    #[error("{0}")]
    Validation(String),

    /// 주문 또는 잔고 행이 존재하지 않음
    #[error("{0}")]
    NotFound(String),

    /// 소유자가 아닌 사용자의 접근
    #[error("{0}")]
    Forbidden(String),

    /// 현재 주문 상태에서 허용되지 않는 연산
    #[error("{0}")]
    InvalidState(String),

    /// 예약 금액이 가용 잔고를 초과
    #[error("잔고 부족: {asset} 필요량 {required}, 가용량 {available}")]
    InsufficientFunds {
        asset: String,
        required: f64,
        available: f64,
    },

    /// 인증 실패 (로그인 실패, 토큰 누락/만료)
    #[error("{0}")]
    Unauthorized(String),

    /// 데이터베이스/트랜잭션 오류
    #[error("데이터베이스 오류가 발생했습니다")]
    Storage(#[from] sqlx::Error),

    /// 그 외 내부 오류 (해시 생성 실패 등)
    #[error("내부 서버 오류가 발생했습니다")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::InvalidState(_) => (StatusCode::BAD_REQUEST, "INVALID_STATE"),
            ApiError::InsufficientFunds { .. } => (StatusCode::BAD_REQUEST, "INSUFFICIENT_FUNDS"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Storage(e) => {
                // 상세 내용은 내부 로그에만 남긴다
                log::error!("데이터베이스 오류: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
            }
            ApiError::Internal(detail) => {
                log::error!("내부 오류: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}
