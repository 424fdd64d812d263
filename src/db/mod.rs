pub mod models;
pub mod repository;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Error as SqlxError;

/// 회원 가입 시 지급되는 데모 잔고 (자산, 수량)
pub const DEMO_BALANCES: &[(&str, f64)] = &[
    ("USD", 10_000.0),
    ("BTC", 0.5),
    ("ETH", 10.0),
    ("ADA", 1_000.0),
    ("SOL", 100.0),
];

/// SQLite 데이터베이스 초기화 및 연결
pub async fn init_database(database_url: &str) -> Result<SqlitePool, SqlxError> {
    log::info!("SQLite 데이터베이스 초기화 중: {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    // 연결 풀 생성
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // 테이블 생성
    create_tables(&pool).await?;

    log::info!("데이터베이스 초기화 완료");

    Ok(pool)
}

/// 필요한 테이블 생성
pub async fn create_tables(pool: &SqlitePool) -> Result<(), SqlxError> {
    // 사용자 테이블
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    // 잔고 테이블
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS balances (
            user_id INTEGER NOT NULL,
            asset TEXT NOT NULL,
            available REAL NOT NULL,
            reserved REAL NOT NULL DEFAULT 0,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (user_id, asset)
        )",
    )
    .execute(pool)
    .await?;

    // 주문 테이블
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL,
            symbol TEXT NOT NULL,
            side TEXT NOT NULL,
            order_type TEXT NOT NULL,
            price REAL NOT NULL,
            quantity REAL NOT NULL,
            filled_quantity REAL NOT NULL DEFAULT 0,
            status TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    // 인덱스 생성
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_symbol ON orders(symbol)")
        .execute(pool)
        .await?;

    Ok(())
}
