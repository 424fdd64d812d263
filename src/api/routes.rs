use axum::{
    routing::{get, post, put},
    Router,
};

use crate::api::handlers::*;
use crate::server::ServerState;

/// API 라우터 생성
pub fn create_api_router() -> Router<ServerState> {
    Router::new()
        // 안내 페이지
        .route("/", get(index))
        // 인증 API
        .route("/register", post(register))
        .route("/login", post(login))
        // 주문 API
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/:order_id",
            get(get_order).put(update_order).delete(cancel_order),
        )
        .route("/orderbook/:symbol", get(get_orderbook))
        // 사용자 API
        .route("/user/orders", get(user_orders))
        .route("/user/balances", get(user_balances))
        .route("/user/balances/:asset", put(set_balance))
        // 시장 데이터 API
        .route("/market", get(market))
}
