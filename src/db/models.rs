use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 사용자 DB 모델
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
}

/// 주문 DB 모델
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderRecord {
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

/// 잔고 DB 모델
///
/// available은 즉시 사용 가능한 수량, reserved는 미체결 주문에 묶인 수량입니다.
/// 두 값 모두 커밋 이후에는 음수가 될 수 없습니다.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BalanceRecord {
    pub user_id: i64,
    pub asset: String,
    pub available: f64,
    pub reserved: f64,
}

impl BalanceRecord {
    /// 사용자가 경제적으로 보유한 총량
    pub fn total(&self) -> f64 {
        self.available + self.reserved
    }
}
