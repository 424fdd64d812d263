//! 잔고 원장 연산
//!
//! (user_id, asset)별 available/reserved 금액을 다루는 최소 연산 집합입니다.
//! 모든 함수가 `&mut SqliteConnection`을 받으므로 호출자의 트랜잭션 안에서
//! 합성되고, 트랜잭션 커밋 전에는 어떤 변경도 외부에 보이지 않습니다.

use sqlx::SqliteConnection;

use crate::db::models::BalanceRecord;
use crate::error::ApiError;

/// 잔고 행 조회. 행이 없으면 NotFound.
pub async fn get(
    conn: &mut SqliteConnection,
    user_id: i64,
    asset: &str,
) -> Result<BalanceRecord, ApiError> {
    sqlx::query_as::<_, BalanceRecord>(
        "SELECT user_id, asset, available, reserved
         FROM balances
         WHERE user_id = ? AND asset = ?",
    )
    .bind(user_id)
    .bind(asset)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("{} 잔고가 없습니다", asset)))
}

/// 가용 잔고에서 amount를 예약 잔고로 옮긴다.
///
/// `available >= amount`가 아니면 InsufficientFunds로 실패하고
/// 아무 변경도 남기지 않습니다.
pub async fn reserve(
    conn: &mut SqliteConnection,
    user_id: i64,
    asset: &str,
    amount: f64,
) -> Result<(), ApiError> {
    if amount <= 0.0 {
        return Err(ApiError::Validation(
            "예약 금액은 0보다 커야 합니다".to_string(),
        ));
    }

    let balance = get(&mut *conn, user_id, asset).await?;
    if balance.available < amount {
        return Err(ApiError::InsufficientFunds {
            asset: asset.to_string(),
            required: amount,
            available: balance.available,
        });
    }

    sqlx::query(
        "UPDATE balances
         SET available = available - ?, reserved = reserved + ?, updated_at = CURRENT_TIMESTAMP
         WHERE user_id = ? AND asset = ?",
    )
    .bind(amount)
    .bind(amount)
    .bind(user_id)
    .bind(asset)
    .execute(conn)
    .await?;

    Ok(())
}

/// 예약 잔고에서 amount를 가용 잔고로 되돌린다.
///
/// reserved는 0 밑으로 내려가지 않도록 바닥을 고정합니다.
/// 과거 부기가 어긋났더라도 음수 예약은 절대 만들지 않습니다.
pub async fn release(
    conn: &mut SqliteConnection,
    user_id: i64,
    asset: &str,
    amount: f64,
) -> Result<(), ApiError> {
    if amount <= 0.0 {
        return Err(ApiError::Validation(
            "해제 금액은 0보다 커야 합니다".to_string(),
        ));
    }

    // 행 존재 확인
    get(&mut *conn, user_id, asset).await?;

    sqlx::query(
        "UPDATE balances
         SET available = available + ?, reserved = MAX(0, reserved - ?), updated_at = CURRENT_TIMESTAMP
         WHERE user_id = ? AND asset = ?",
    )
    .bind(amount)
    .bind(amount)
    .bind(user_id)
    .bind(asset)
    .execute(conn)
    .await?;

    Ok(())
}

/// 관리용 잔고 직접 설정. 음수 입력은 거부하고, 행이 없으면 새로 만든다.
pub async fn set_absolute(
    conn: &mut SqliteConnection,
    user_id: i64,
    asset: &str,
    available: f64,
    reserved: f64,
) -> Result<(), ApiError> {
    if available < 0.0 || reserved < 0.0 {
        return Err(ApiError::Validation(
            "잔고는 음수로 설정할 수 없습니다".to_string(),
        ));
    }

    sqlx::query(
        "INSERT INTO balances (user_id, asset, available, reserved, updated_at)
         VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP)
         ON CONFLICT(user_id, asset) DO UPDATE SET
            available = excluded.available,
            reserved = excluded.reserved,
            updated_at = CURRENT_TIMESTAMP",
    )
    .bind(user_id)
    .bind(asset)
    .bind(available)
    .bind(reserved)
    .execute(conn)
    .await?;

    Ok(())
}
