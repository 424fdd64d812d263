//! 주문 생명주기 관리자
//!
//! 주문 생성/취소/수정을 잔고 원장과 한 트랜잭션으로 묶어 처리합니다.
//! 주문 흐름 중 balances 행을 쓰는 유일한 컴포넌트이며, 중간 단계에서
//! 실패하면 해당 연산에서 시도된 모든 변경이 함께 롤백됩니다.

use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::ledger;
use super::model::{reservation, NewOrder, Side, STATUS_PENDING};
use crate::db::models::OrderRecord;
use crate::error::ApiError;

/// 주문 생명주기 관리자
#[derive(Clone)]
pub struct OrderLifecycleManager {
    pool: SqlitePool,
}

impl OrderLifecycleManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 주문 생성
    ///
    /// 예약 → 주문 삽입이 하나의 단위로 커밋됩니다. 잔고가 부족하면
    /// 주문 행 없이 InsufficientFunds로 끝납니다.
    pub async fn create(&self, user_id: i64, order: NewOrder) -> Result<OrderRecord, ApiError> {
        let (asset, amount) = reservation(order.side, &order.symbol, order.quantity, order.price)?;

        let mut tx = self.pool.begin().await?;

        // 시장가 매수는 가격 0으로 접수되어 예약 금액이 0이다
        if amount > 0.0 {
            ledger::reserve(&mut *tx, user_id, &asset, amount).await?;
        }

        let now = Utc::now().to_rfc3339();
        let record = OrderRecord {
            id: Uuid::new_v4().to_string(),
            user_id,
            symbol: order.symbol,
            side: order.side.as_str().to_string(),
            order_type: order.order_type.as_str().to_string(),
            price: order.price,
            quantity: order.quantity,
            filled_quantity: 0.0,
            status: STATUS_PENDING.to_string(),
            created_at: now.clone(),
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO orders
             (id, user_id, symbol, side, order_type, price, quantity, filled_quantity, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(record.user_id)
        .bind(&record.symbol)
        .bind(&record.side)
        .bind(&record.order_type)
        .bind(record.price)
        .bind(record.quantity)
        .bind(record.filled_quantity)
        .bind(&record.status)
        .bind(&record.created_at)
        .bind(&record.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        log::info!(
            "주문 생성: {} {} {} 수량 {} 가격 {} (예약 {} {})",
            record.id,
            record.side,
            record.symbol,
            record.quantity,
            record.price,
            amount,
            asset
        );

        Ok(record)
    }

    /// 주문 취소
    ///
    /// 생성 시점과 동일한 규칙으로 예약을 되돌린 뒤 주문 행을 삭제합니다.
    /// CANCELLED 상태를 남기지 않고 행을 지우는 것이 원래 동작입니다.
    pub async fn cancel(&self, order_id: &str, user_id: i64) -> Result<(), ApiError> {
        let mut tx = self.pool.begin().await?;

        let order = Self::load_owned_pending(&mut *tx, order_id, user_id, "취소").await?;

        let side = Side::from_str(&order.side)?;
        let (asset, amount) = reservation(side, &order.symbol, order.quantity, order.price)?;

        if amount > 0.0 {
            ledger::release(&mut *tx, user_id, &asset, amount).await?;
        }

        sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        log::info!("주문 취소: {} (해제 {} {})", order_id, amount, asset);

        Ok(())
    }

    /// 주문 수정
    ///
    /// 기존 예약 해제와 새 예약을 한 트랜잭션 안에서 순차 처리합니다.
    /// 새 예약이 잔고 부족으로 실패하면 해제까지 함께 롤백되어
    /// 기존 예약이 그대로 유지됩니다.
    pub async fn update(
        &self,
        order_id: &str,
        user_id: i64,
        new: NewOrder,
    ) -> Result<OrderRecord, ApiError> {
        let mut tx = self.pool.begin().await?;

        let order = Self::load_owned_pending(&mut *tx, order_id, user_id, "수정").await?;

        let old_side = Side::from_str(&order.side)?;
        let (old_asset, old_amount) =
            reservation(old_side, &order.symbol, order.quantity, order.price)?;
        let (new_asset, new_amount) =
            reservation(new.side, &new.symbol, new.quantity, new.price)?;

        if old_amount > 0.0 {
            ledger::release(&mut *tx, user_id, &old_asset, old_amount).await?;
        }
        if new_amount > 0.0 {
            ledger::reserve(&mut *tx, user_id, &new_asset, new_amount).await?;
        }

        // order_type은 수정 대상이 아니다
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE orders
             SET symbol = ?, side = ?, price = ?, quantity = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&new.symbol)
        .bind(new.side.as_str())
        .bind(new.price)
        .bind(new.quantity)
        .bind(&now)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        log::info!(
            "주문 수정: {} (해제 {} {}, 재예약 {} {})",
            order_id,
            old_amount,
            old_asset,
            new_amount,
            new_asset
        );

        Ok(OrderRecord {
            symbol: new.symbol,
            side: new.side.as_str().to_string(),
            price: new.price,
            quantity: new.quantity,
            updated_at: now,
            ..order
        })
    }

    /// 주문을 읽고 취소/수정 공통 사전 조건을 검사한다.
    ///
    /// 검사 순서는 NotFound → Forbidden → InvalidState로 고정입니다.
    async fn load_owned_pending(
        conn: &mut SqliteConnection,
        order_id: &str,
        user_id: i64,
        action: &str,
    ) -> Result<OrderRecord, ApiError> {
        let order = sqlx::query_as::<_, OrderRecord>(
            "SELECT id, user_id, symbol, side, order_type, price, quantity, filled_quantity, status, created_at, updated_at
             FROM orders
             WHERE id = ?",
        )
        .bind(order_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| ApiError::NotFound("주문을 찾을 수 없습니다".to_string()))?;

        if order.user_id != user_id {
            return Err(ApiError::Forbidden(format!(
                "자신의 주문만 {}할 수 있습니다",
                action
            )));
        }
        if order.status != STATUS_PENDING {
            return Err(ApiError::InvalidState(format!(
                "PENDING 상태의 주문만 {}할 수 있습니다 (현재: {})",
                action, order.status
            )));
        }

        Ok(order)
    }
}
