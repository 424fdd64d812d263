//! 주문 생명주기 통합 테스트
//!
//! 인메모리 SQLite에 대해 생성/취소/수정과 잔고 예약 부기의
//! 핵심 성질을 검증합니다.

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use xledger::db::{self, DEMO_BALANCES};
use xledger::error::ApiError;
use xledger::lifecycle::{NewOrder, OrderLifecycleManager};

/// 인메모리 DB 생성 (연결이 나뉘면 메모리 DB도 나뉘므로 연결 1개로 고정)
async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("인메모리 DB 연결 실패");
    db::create_tables(&pool).await.expect("테이블 생성 실패");
    pool
}

/// 테스트 사용자 생성 + 데모 잔고 지급
async fn seed_user(pool: &SqlitePool, email: &str) -> i64 {
    let result = sqlx::query("INSERT INTO users (email, password_hash) VALUES (?, 'x')")
        .bind(email)
        .execute(pool)
        .await
        .unwrap();
    let user_id = result.last_insert_rowid();

    for (asset, amount) in DEMO_BALANCES {
        sqlx::query("INSERT INTO balances (user_id, asset, available, reserved) VALUES (?, ?, ?, 0)")
            .bind(user_id)
            .bind(asset)
            .bind(amount)
            .execute(pool)
            .await
            .unwrap();
    }
    user_id
}

async fn balance(pool: &SqlitePool, user_id: i64, asset: &str) -> (f64, f64) {
    sqlx::query_as::<_, (f64, f64)>(
        "SELECT available, reserved FROM balances WHERE user_id = ? AND asset = ?",
    )
    .bind(user_id)
    .bind(asset)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn order_count(pool: &SqlitePool) -> i64 {
    sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await
        .unwrap()
        .0
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "기대값 {} 실제값 {}",
        expected,
        actual
    );
}

fn buy(symbol: &str, quantity: f64, price: f64) -> NewOrder {
    NewOrder::parse(symbol, "BUY", Some(price), quantity, None).unwrap()
}

fn sell(symbol: &str, quantity: f64, price: f64) -> NewOrder {
    NewOrder::parse(symbol, "SELL", Some(price), quantity, None).unwrap()
}

#[tokio::test]
async fn buy_create_reserves_quote_asset() {
    let pool = setup_pool().await;
    let user = seed_user(&pool, "buyer@test.com").await;
    let manager = OrderLifecycleManager::new(pool.clone());

    let order = manager.create(user, buy("BTCUSD", 0.1, 30_000.0)).await.unwrap();
    assert_eq!(order.status, "PENDING");
    assert_close(order.filled_quantity, 0.0);

    // USD available이 수량×가격만큼 줄고 reserved가 같은 만큼 늘어난다
    let (available, reserved) = balance(&pool, user, "USD").await;
    assert_close(available, 7_000.0);
    assert_close(reserved, 3_000.0);
    assert_close(available + reserved, 10_000.0);
}

#[tokio::test]
async fn sell_create_reserves_base_asset_quantity() {
    let pool = setup_pool().await;
    let user = seed_user(&pool, "seller@test.com").await;
    let manager = OrderLifecycleManager::new(pool.clone());

    manager.create(user, sell("BTCUSD", 0.2, 30_000.0)).await.unwrap();

    let (available, reserved) = balance(&pool, user, "BTC").await;
    assert_close(available, 0.3);
    assert_close(reserved, 0.2);

    // 매도 주문은 USD 잔고를 건드리지 않는다
    let (usd_available, usd_reserved) = balance(&pool, user, "USD").await;
    assert_close(usd_available, 10_000.0);
    assert_close(usd_reserved, 0.0);
}

#[tokio::test]
async fn cancel_after_create_round_trips_balances() {
    let pool = setup_pool().await;
    let user = seed_user(&pool, "roundtrip@test.com").await;
    let manager = OrderLifecycleManager::new(pool.clone());

    let order = manager.create(user, buy("ETHUSD", 2.0, 1_500.0)).await.unwrap();
    manager.cancel(&order.id, user).await.unwrap();

    let (available, reserved) = balance(&pool, user, "USD").await;
    assert_close(available, 10_000.0);
    assert_close(reserved, 0.0);

    // 취소는 행을 삭제한다 (CANCELLED 상태를 남기지 않는다)
    assert_eq!(order_count(&pool).await, 0);
}

#[tokio::test]
async fn update_price_only_keeps_total_and_re_reserves() {
    let pool = setup_pool().await;
    let user = seed_user(&pool, "reprice@test.com").await;
    let manager = OrderLifecycleManager::new(pool.clone());

    let order = manager.create(user, buy("BTCUSD", 0.1, 30_000.0)).await.unwrap();
    let updated = manager
        .update(&order.id, user, buy("BTCUSD", 0.1, 20_000.0))
        .await
        .unwrap();

    assert_close(updated.price, 20_000.0);

    let (available, reserved) = balance(&pool, user, "USD").await;
    assert_close(reserved, 2_000.0);
    assert_close(available, 8_000.0);
    assert_close(available + reserved, 10_000.0);
}

#[tokio::test]
async fn create_fails_insufficient_funds_without_side_effects() {
    let pool = setup_pool().await;
    let user = seed_user(&pool, "poor@test.com").await;
    let manager = OrderLifecycleManager::new(pool.clone());

    // USD 10,000으로는 1 × 30,000을 예약할 수 없다
    let err = manager.create(user, buy("BTCUSD", 1.0, 30_000.0)).await.unwrap_err();
    match err {
        ApiError::InsufficientFunds {
            asset,
            required,
            available,
        } => {
            assert_eq!(asset, "USD");
            assert_close(required, 30_000.0);
            assert_close(available, 10_000.0);
        }
        other => panic!("InsufficientFunds를 기대했지만 {:?}", other),
    }

    // 잔고도 주문 행도 그대로여야 한다
    let (available, reserved) = balance(&pool, user, "USD").await;
    assert_close(available, 10_000.0);
    assert_close(reserved, 0.0);
    assert_eq!(order_count(&pool).await, 0);
}

#[tokio::test]
async fn cancel_non_pending_order_fails_invalid_state() {
    let pool = setup_pool().await;
    let user = seed_user(&pool, "state@test.com").await;
    let manager = OrderLifecycleManager::new(pool.clone());

    let order = manager.create(user, buy("BTCUSD", 0.1, 30_000.0)).await.unwrap();

    // 범위 밖 종결 상태를 흉내 낸다
    sqlx::query("UPDATE orders SET status = 'FILLED' WHERE id = ?")
        .bind(&order.id)
        .execute(&pool)
        .await
        .unwrap();

    let err = manager.cancel(&order.id, user).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidState(_)));

    // 실패한 취소는 잔고를 건드리지 않는다
    let (available, reserved) = balance(&pool, user, "USD").await;
    assert_close(available, 7_000.0);
    assert_close(reserved, 3_000.0);
}

#[tokio::test]
async fn cancel_and_update_by_non_owner_fail_forbidden() {
    let pool = setup_pool().await;
    let owner = seed_user(&pool, "owner@test.com").await;
    let intruder = seed_user(&pool, "intruder@test.com").await;
    let manager = OrderLifecycleManager::new(pool.clone());

    let order = manager.create(owner, buy("BTCUSD", 0.1, 30_000.0)).await.unwrap();

    let err = manager.cancel(&order.id, intruder).await.unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    let err = manager
        .update(&order.id, intruder, buy("BTCUSD", 0.1, 10_000.0))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    // 소유자 잔고는 변하지 않는다
    let (available, reserved) = balance(&pool, owner, "USD").await;
    assert_close(available, 7_000.0);
    assert_close(reserved, 3_000.0);
}

#[tokio::test]
async fn cancel_missing_order_fails_not_found() {
    let pool = setup_pool().await;
    let user = seed_user(&pool, "missing@test.com").await;
    let manager = OrderLifecycleManager::new(pool.clone());

    let err = manager.cancel("no-such-order", user).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn failed_update_re_reservation_restores_old_reservation() {
    let pool = setup_pool().await;
    let user = seed_user(&pool, "atomic@test.com").await;
    let manager = OrderLifecycleManager::new(pool.clone());

    let order = manager.create(user, buy("BTCUSD", 0.1, 30_000.0)).await.unwrap();

    // 새 예약(0.5 × 30,000 = 15,000)은 해제 후 가용 잔고(10,000)로도 부족하다.
    // 해제+재예약이 한 단위이므로 기존 예약이 그대로 복원되어야 한다.
    let err = manager
        .update(&order.id, user, buy("BTCUSD", 0.5, 30_000.0))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InsufficientFunds { .. }));

    let (available, reserved) = balance(&pool, user, "USD").await;
    assert_close(available, 7_000.0);
    assert_close(reserved, 3_000.0);

    // 주문 필드도 수정 전 그대로다
    let (price, quantity) = sqlx::query_as::<_, (f64, f64)>(
        "SELECT price, quantity FROM orders WHERE id = ?",
    )
    .bind(&order.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_close(price, 30_000.0);
    assert_close(quantity, 0.1);
}

#[tokio::test]
async fn update_sell_to_buy_switches_reserved_asset() {
    let pool = setup_pool().await;
    let user = seed_user(&pool, "switch@test.com").await;
    let manager = OrderLifecycleManager::new(pool.clone());

    let order = manager.create(user, sell("BTCUSD", 0.2, 30_000.0)).await.unwrap();
    manager
        .update(&order.id, user, buy("BTCUSD", 0.1, 30_000.0))
        .await
        .unwrap();

    // BTC 예약은 풀리고 USD 예약이 걸린다
    let (btc_available, btc_reserved) = balance(&pool, user, "BTC").await;
    assert_close(btc_available, 0.5);
    assert_close(btc_reserved, 0.0);

    let (usd_available, usd_reserved) = balance(&pool, user, "USD").await;
    assert_close(usd_available, 7_000.0);
    assert_close(usd_reserved, 3_000.0);
}

#[tokio::test]
async fn market_buy_reserves_nothing() {
    let pool = setup_pool().await;
    let user = seed_user(&pool, "market@test.com").await;
    let manager = OrderLifecycleManager::new(pool.clone());

    let order = manager
        .create(
            user,
            NewOrder::parse("BTCUSD", "BUY", None, 0.5, Some("MARKET")).unwrap(),
        )
        .await
        .unwrap();

    // 시장가 매수는 가격 0으로 저장되고 예약 금액도 0이다
    assert_close(order.price, 0.0);
    let (available, reserved) = balance(&pool, user, "USD").await;
    assert_close(available, 10_000.0);
    assert_close(reserved, 0.0);

    // 취소도 예약 없이 행만 지운다
    manager.cancel(&order.id, user).await.unwrap();
    assert_eq!(order_count(&pool).await, 0);
}

#[tokio::test]
async fn sell_create_fails_without_balance_row() {
    let pool = setup_pool().await;
    let user = seed_user(&pool, "nobalance@test.com").await;
    let manager = OrderLifecycleManager::new(pool.clone());

    // 시드에 없는 자산(XRP)의 매도는 잔고 행이 없어 NotFound
    let err = manager.create(user, sell("XRPUSD", 1.0, 2.0)).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(order_count(&pool).await, 0);
}

#[tokio::test]
async fn demo_scenario_from_seed_to_round_trip() {
    let pool = setup_pool().await;
    let user = seed_user(&pool, "scenario@test.com").await;
    let manager = OrderLifecycleManager::new(pool.clone());

    // 1 × 30,000 매수는 실패하고 잔고는 그대로
    assert!(manager.create(user, buy("BTCUSD", 1.0, 30_000.0)).await.is_err());
    let (available, reserved) = balance(&pool, user, "USD").await;
    assert_close(available, 10_000.0);
    assert_close(reserved, 0.0);

    // 0.1 × 30,000 매수는 성공: 7,000 / 3,000
    let order = manager.create(user, buy("BTCUSD", 0.1, 30_000.0)).await.unwrap();
    let (available, reserved) = balance(&pool, user, "USD").await;
    assert_close(available, 7_000.0);
    assert_close(reserved, 3_000.0);

    // 취소하면 10,000 / 0으로 복원
    manager.cancel(&order.id, user).await.unwrap();
    let (available, reserved) = balance(&pool, user, "USD").await;
    assert_close(available, 10_000.0);
    assert_close(reserved, 0.0);
}
