use std::env;
use std::sync::Arc;

use sqlx::sqlite::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::create_api_router;
use crate::db::init_database;
use crate::lifecycle::OrderLifecycleManager;

/// 서버 설정
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expires_in_secs: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            database_url: "sqlite:xledger.db".into(),
            jwt_secret: "dev-secret-change-me".into(),
            jwt_expires_in_secs: 3600,
        }
    }
}

impl ServerConfig {
    /// 환경 변수에서 설정 로드 (없는 값은 기본값 사용)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env::var("XLEDGER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            jwt_secret: env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_expires_in_secs: env::var("JWT_EXPIRES_IN_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.jwt_expires_in_secs),
        }
    }
}

/// 서버 상태
#[derive(Clone)]
pub struct ServerState {
    pub pool: SqlitePool,
    pub config: Arc<ServerConfig>,
    pub lifecycle: OrderLifecycleManager,
}

impl ServerState {
    pub fn new(pool: SqlitePool, config: ServerConfig) -> Self {
        Self {
            lifecycle: OrderLifecycleManager::new(pool.clone()),
            pool,
            config: Arc::new(config),
        }
    }
}

/// 서버 시작
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    println!("xLedger 서버 시작 중...");

    let pool = init_database(&config.database_url).await?;

    let port = config.port;
    let state = ServerState::new(pool, config);

    // REST API 라우터 생성
    let api_router = create_api_router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // REST API 서버 시작
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    println!("서버가 성공적으로 시작되었습니다!");
    println!("REST API: http://localhost:{}", port);

    axum::serve(listener, api_router).await?;

    Ok(())
}
