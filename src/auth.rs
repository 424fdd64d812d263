//! 인증 유틸리티
//!
//! bcrypt 비밀번호 해시와 HS256 JWT 발급/검증, 그리고 보호된 핸들러가
//! 사용하는 `AuthenticatedUser` 추출기를 제공합니다.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::server::ServerState;

/// JWT 클레임
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// 사용자 이메일
    pub sub: String,
    /// 사용자 ID
    pub user_id: i64,
    /// 만료 시각 (Unix 타임스탬프)
    pub exp: usize,
}

/// 비밀번호 해시 생성
pub fn hash_password(plain: &str) -> Result<String, ApiError> {
    hash(plain, DEFAULT_COST).map_err(|e| ApiError::Internal(format!("비밀번호 해시 실패: {}", e)))
}

/// 비밀번호 검증
pub fn verify_password(plain: &str, hashed: &str) -> bool {
    verify(plain, hashed).unwrap_or(false)
}

/// 고정 만료 기간의 토큰 발급
pub fn issue_token(
    user_id: i64,
    email: &str,
    secret: &str,
    expires_in_secs: i64,
) -> Result<String, ApiError> {
    let claims = Claims {
        sub: email.to_string(),
        user_id,
        exp: (Utc::now().timestamp() + expires_in_secs) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("토큰 발급 실패: {}", e)))
}

/// 토큰에서 신원 확인. 서명이 틀리거나 만료된 토큰은 Unauthorized.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized("유효하지 않거나 만료된 토큰입니다".to_string()))
}

/// 인증된 사용자
///
/// `Authorization: Bearer <token>` 헤더를 검증해 user_id를 꺼내는 추출기입니다.
pub struct AuthenticatedUser {
    pub user_id: i64,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    ServerState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = ServerState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::Unauthorized("인증 토큰이 없습니다".to_string()))?;
        let value = header
            .to_str()
            .map_err(|_| ApiError::Unauthorized("잘못된 인증 헤더입니다".to_string()))?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Bearer 토큰이 필요합니다".to_string()))?;

        let claims = decode_token(token, &state.config.jwt_secret)?;

        Ok(AuthenticatedUser {
            user_id: claims.user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hashed = hash_password("secret-pw").unwrap();
        assert!(verify_password("secret-pw", &hashed));
        assert!(!verify_password("wrong-pw", &hashed));
    }

    #[test]
    fn token_round_trip() {
        let token = issue_token(7, "trader@example.com", "test-secret", 3600).unwrap();
        let claims = decode_token(&token, "test-secret").unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.sub, "trader@example.com");
    }

    #[test]
    fn token_rejects_wrong_secret() {
        let token = issue_token(7, "trader@example.com", "test-secret", 3600).unwrap();
        assert!(decode_token(&token, "other-secret").is_err());
    }

    #[test]
    fn token_rejects_expired() {
        // 기본 leeway(60초)를 넘겨서 만료시킨다
        let token = issue_token(7, "trader@example.com", "test-secret", -120).unwrap();
        assert!(decode_token(&token, "test-secret").is_err());
    }
}
