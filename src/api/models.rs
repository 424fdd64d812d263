use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::db::models::{BalanceRecord, OrderRecord};

/// 회원 가입 요청
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// 회원 가입 응답
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub user_id: i64,
    pub message: String,
}

/// 로그인 요청
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 로그인 응답
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    /// 토큰 만료까지 남은 시간 (초)
    pub expires_in: i64,
    pub user_id: i64,
}

/// 주문 생성 요청
#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: String,
    pub quantity: f64,
    pub price: Option<f64>,
    pub order_type: Option<String>,
}

/// 주문 수정 요청 (order_type은 유지됨)
#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub symbol: String,
    pub side: String,
    pub quantity: f64,
    pub price: f64,
}

/// 주문 응답 뷰
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: String,
    pub user_id: i64,
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub price: f64,
    pub quantity: f64,
    pub filled_quantity: f64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<OrderRecord> for OrderView {
    fn from(record: OrderRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            symbol: record.symbol,
            side: record.side,
            order_type: record.order_type,
            price: record.price,
            quantity: record.quantity,
            filled_quantity: record.filled_quantity,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// 주문 생성/수정 응답
#[derive(Debug, Serialize)]
pub struct OrderActionResponse {
    pub success: bool,
    pub message: String,
    pub order: OrderView,
}

/// 주문 취소 등 단순 동작 응답
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

/// 사용자 주문 목록 응답
#[derive(Debug, Serialize)]
pub struct UserOrdersResponse {
    pub success: bool,
    pub orders: Vec<OrderView>,
}

/// 자산별 잔고 뷰
#[derive(Debug, Serialize)]
pub struct BalanceView {
    pub available: f64,
    pub reserved: f64,
    pub total: f64,
}

impl From<&BalanceRecord> for BalanceView {
    fn from(record: &BalanceRecord) -> Self {
        Self {
            available: record.available,
            reserved: record.reserved,
            total: record.total(),
        }
    }
}

/// 사용자 잔고 응답
#[derive(Debug, Serialize)]
pub struct UserBalancesResponse {
    pub success: bool,
    pub balances: BTreeMap<String, BalanceView>,
}

/// 잔고 직접 설정 요청 (reserved 생략 시 기존 값 유지)
#[derive(Debug, Deserialize)]
pub struct BalanceUpdateRequest {
    pub available: f64,
    pub reserved: Option<f64>,
}

/// 호가창 응답: 미체결 주문을 매수/매도로 나눠 정렬한 목록
#[derive(Debug, Serialize)]
pub struct OrderBookResponse {
    pub symbol: String,
    pub bids: Vec<OrderView>,
    pub asks: Vec<OrderView>,
}

/// API 오류 응답
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
