use sqlx::sqlite::SqlitePool;

use super::models::{BalanceRecord, OrderRecord, UserRecord};
use super::DEMO_BALANCES;
use crate::error::ApiError;
use crate::lifecycle::model::STATUS_PENDING;

/// 사용자 저장소
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 회원 가입: 사용자 생성과 데모 잔고 지급을 한 트랜잭션으로 처리
    pub async fn register(&self, email: &str, password_hash: &str) -> Result<i64, ApiError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("INSERT INTO users (email, password_hash) VALUES (?, ?)")
            .bind(email)
            .bind(password_hash)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if e.as_database_error()
                    .map(|d| d.is_unique_violation())
                    .unwrap_or(false)
                {
                    ApiError::Validation("이미 등록된 이메일입니다".to_string())
                } else {
                    ApiError::Storage(e)
                }
            })?;

        let user_id = result.last_insert_rowid();

        for (asset, amount) in DEMO_BALANCES {
            sqlx::query(
                "INSERT INTO balances (user_id, asset, available, reserved) VALUES (?, ?, ?, 0)",
            )
            .bind(user_id)
            .bind(asset)
            .bind(amount)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(user_id)
    }

    /// 이메일로 사용자 조회
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, ApiError> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, password_hash FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

/// 주문 저장소 (조회 전용 - 상태를 바꾸는 쓰기는 생명주기 관리자가 담당)
#[derive(Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 전체 주문 조회
    pub async fn find_all(&self) -> Result<Vec<OrderRecord>, ApiError> {
        let orders = sqlx::query_as::<_, OrderRecord>(
            "SELECT id, user_id, symbol, side, order_type, price, quantity, filled_quantity, status, created_at, updated_at
             FROM orders
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// 주문 단건 조회
    pub async fn find_by_id(&self, order_id: &str) -> Result<Option<OrderRecord>, ApiError> {
        let order = sqlx::query_as::<_, OrderRecord>(
            "SELECT id, user_id, symbol, side, order_type, price, quantity, filled_quantity, status, created_at, updated_at
             FROM orders
             WHERE id = ?",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// 사용자별 주문 조회
    pub async fn find_by_user(&self, user_id: i64) -> Result<Vec<OrderRecord>, ApiError> {
        let orders = sqlx::query_as::<_, OrderRecord>(
            "SELECT id, user_id, symbol, side, order_type, price, quantity, filled_quantity, status, created_at, updated_at
             FROM orders
             WHERE user_id = ?
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// 심볼별 미체결 주문 조회 (호가창 응답용)
    pub async fn find_pending_by_symbol(
        &self,
        symbol: &str,
    ) -> Result<Vec<OrderRecord>, ApiError> {
        let orders = sqlx::query_as::<_, OrderRecord>(
            "SELECT id, user_id, symbol, side, order_type, price, quantity, filled_quantity, status, created_at, updated_at
             FROM orders
             WHERE symbol = ? AND status = ?
             ORDER BY created_at ASC",
        )
        .bind(symbol)
        .bind(STATUS_PENDING)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }
}

/// 잔고 저장소 (조회 전용 - 예약/해제는 생명주기 관리자의 원장 연산이 담당)
#[derive(Clone)]
pub struct BalanceRepository {
    pool: SqlitePool,
}

impl BalanceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 사용자의 전체 자산 잔고 조회
    pub async fn find_by_user(&self, user_id: i64) -> Result<Vec<BalanceRecord>, ApiError> {
        let balances = sqlx::query_as::<_, BalanceRecord>(
            "SELECT user_id, asset, available, reserved
             FROM balances
             WHERE user_id = ?
             ORDER BY asset ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(balances)
    }
}
