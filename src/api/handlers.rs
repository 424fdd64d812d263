use std::cmp::Ordering;
use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Json},
};
use serde_json::{json, Value};

use crate::api::models::*;
use crate::auth::{self, AuthenticatedUser};
use crate::db::repository::{BalanceRepository, OrderRepository, UserRepository};
use crate::error::ApiError;
use crate::lifecycle::{ledger, model::NewOrder, model::Side};
use crate::server::ServerState;

/// 안내 페이지 핸들러
pub async fn index() -> Html<&'static str> {
    Html(
        "<h1>xLedger API</h1>\
         <p>잔고 예약 기반 주문 관리 API입니다. 지원하는 엔드포인트는 아래와 같습니다.</p>\
         <ul>\
             <li>POST /register - 회원 가입</li>\
             <li>POST /login - 로그인 (JWT 발급)</li>\
             <li>GET /orders - 전체 주문 조회</li>\
             <li>POST /orders - 주문 생성 (인증 필요)</li>\
             <li>GET /orders/{order_id} - 주문 단건 조회</li>\
             <li>PUT /orders/{order_id} - 주문 수정 (인증 필요)</li>\
             <li>DELETE /orders/{order_id} - 주문 취소 (인증 필요)</li>\
             <li>GET /orderbook/{symbol} - 심볼별 호가 조회</li>\
             <li>GET /user/orders - 내 주문 조회 (인증 필요)</li>\
             <li>GET /user/balances - 내 잔고 조회 (인증 필요)</li>\
             <li>PUT /user/balances/{asset} - 잔고 직접 설정 (인증 필요)</li>\
             <li>GET /market - 데모 시세 조회</li>\
         </ul>",
    )
}

/// 회원 가입 핸들러
///
/// 사용자 생성과 함께 데모 잔고가 지급됩니다.
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::Validation(
            "올바른 이메일이 필요합니다".to_string(),
        ));
    }
    if payload.password.len() < 4 {
        return Err(ApiError::Validation(
            "비밀번호는 4자 이상이어야 합니다".to_string(),
        ));
    }

    let password_hash = auth::hash_password(&payload.password)?;
    let user_id = UserRepository::new(state.pool.clone())
        .register(&email, &password_hash)
        .await?;

    log::info!("회원 가입: {} (user_id {})", email, user_id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            user_id,
            message: "가입이 완료되었습니다".to_string(),
        }),
    ))
}

/// 로그인 핸들러
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();

    let user = UserRepository::new(state.pool.clone())
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("이메일 또는 비밀번호가 틀렸습니다".to_string()))?;

    if !auth::verify_password(&payload.password, &user.password_hash) {
        return Err(ApiError::Unauthorized(
            "이메일 또는 비밀번호가 틀렸습니다".to_string(),
        ));
    }

    let token = auth::issue_token(
        user.id,
        &user.email,
        &state.config.jwt_secret,
        state.config.jwt_expires_in_secs,
    )?;

    Ok(Json(LoginResponse {
        token,
        expires_in: state.config.jwt_expires_in_secs,
        user_id: user.id,
    }))
}

/// 전체 주문 조회 핸들러
pub async fn list_orders(
    State(state): State<ServerState>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let orders = OrderRepository::new(state.pool.clone()).find_all().await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

/// 주문 생성 핸들러
pub async fn create_order(
    State(state): State<ServerState>,
    user: AuthenticatedUser,
    Json(payload): Json<OrderRequest>,
) -> Result<(StatusCode, Json<OrderActionResponse>), ApiError> {
    let new_order = NewOrder::parse(
        &payload.symbol,
        &payload.side,
        payload.price,
        payload.quantity,
        payload.order_type.as_deref(),
    )?;

    let record = state.lifecycle.create(user.user_id, new_order).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderActionResponse {
            success: true,
            message: "주문이 접수되었습니다".to_string(),
            order: record.into(),
        }),
    ))
}

/// 주문 단건 조회 핸들러
pub async fn get_order(
    State(state): State<ServerState>,
    Path(order_id): Path<String>,
) -> Result<Json<OrderView>, ApiError> {
    let order = OrderRepository::new(state.pool.clone())
        .find_by_id(&order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("주문을 찾을 수 없습니다".to_string()))?;

    Ok(Json(order.into()))
}

/// 주문 수정 핸들러
///
/// 기존 예약 해제와 새 예약이 하나의 트랜잭션으로 처리됩니다.
pub async fn update_order(
    State(state): State<ServerState>,
    user: AuthenticatedUser,
    Path(order_id): Path<String>,
    Json(payload): Json<UpdateOrderRequest>,
) -> Result<Json<OrderActionResponse>, ApiError> {
    // 수정은 항상 양수 가격을 요구한다 (order_type은 바꾸지 않는다)
    let new_order = NewOrder::parse(
        &payload.symbol,
        &payload.side,
        Some(payload.price),
        payload.quantity,
        None,
    )?;

    let record = state
        .lifecycle
        .update(&order_id, user.user_id, new_order)
        .await?;

    Ok(Json(OrderActionResponse {
        success: true,
        message: "주문이 수정되었습니다".to_string(),
        order: record.into(),
    }))
}

/// 주문 취소 핸들러
pub async fn cancel_order(
    State(state): State<ServerState>,
    user: AuthenticatedUser,
    Path(order_id): Path<String>,
) -> Result<Json<ActionResponse>, ApiError> {
    state.lifecycle.cancel(&order_id, user.user_id).await?;

    Ok(Json(ActionResponse {
        success: true,
        message: "주문이 취소되었습니다".to_string(),
    }))
}

/// 호가창 조회 핸들러
///
/// 심볼의 미체결 주문을 매수(높은 가격 우선)/매도(낮은 가격 우선)로 나눠 돌려줍니다.
pub async fn get_orderbook(
    State(state): State<ServerState>,
    Path(symbol): Path<String>,
) -> Result<Json<OrderBookResponse>, ApiError> {
    let symbol = symbol.to_uppercase();
    let orders = OrderRepository::new(state.pool.clone())
        .find_pending_by_symbol(&symbol)
        .await?;

    let (mut bids, mut asks): (Vec<OrderView>, Vec<OrderView>) = (Vec::new(), Vec::new());
    for order in orders {
        if order.side == Side::Buy.as_str() {
            bids.push(order.into());
        } else {
            asks.push(order.into());
        }
    }
    bids.sort_by(|a, b| b.price.partial_cmp(&a.price).unwrap_or(Ordering::Equal));
    asks.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal));

    Ok(Json(OrderBookResponse { symbol, bids, asks }))
}

/// 내 주문 조회 핸들러
pub async fn user_orders(
    State(state): State<ServerState>,
    user: AuthenticatedUser,
) -> Result<Json<UserOrdersResponse>, ApiError> {
    let orders = OrderRepository::new(state.pool.clone())
        .find_by_user(user.user_id)
        .await?;

    Ok(Json(UserOrdersResponse {
        success: true,
        orders: orders.into_iter().map(OrderView::from).collect(),
    }))
}

/// 내 잔고 조회 핸들러
pub async fn user_balances(
    State(state): State<ServerState>,
    user: AuthenticatedUser,
) -> Result<Json<UserBalancesResponse>, ApiError> {
    let records = BalanceRepository::new(state.pool.clone())
        .find_by_user(user.user_id)
        .await?;

    let mut balances = BTreeMap::new();
    for record in &records {
        balances.insert(record.asset.clone(), BalanceView::from(record));
    }

    Ok(Json(UserBalancesResponse {
        success: true,
        balances,
    }))
}

/// 잔고 직접 설정 핸들러 (관리/데모용)
///
/// reserved를 생략하면 기존 예약 수량이 유지됩니다.
pub async fn set_balance(
    State(state): State<ServerState>,
    user: AuthenticatedUser,
    Path(asset): Path<String>,
    Json(payload): Json<BalanceUpdateRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    let asset = asset.to_uppercase();
    let mut conn = state.pool.acquire().await?;

    let reserved = match payload.reserved {
        Some(r) => r,
        None => match ledger::get(&mut conn, user.user_id, &asset).await {
            Ok(balance) => balance.reserved,
            Err(ApiError::NotFound(_)) => 0.0,
            Err(e) => return Err(e),
        },
    };

    ledger::set_absolute(&mut conn, user.user_id, &asset, payload.available, reserved).await?;

    log::info!(
        "잔고 직접 설정: user {} {} available {} reserved {}",
        user.user_id,
        asset,
        payload.available,
        reserved
    );

    Ok(Json(ActionResponse {
        success: true,
        message: "잔고가 설정되었습니다".to_string(),
    }))
}

/// 데모 시세 조회 핸들러
///
/// 외부 시세 소스가 없으므로 시드 자산에 대한 고정 데모 값을 돌려줍니다.
pub async fn market() -> Json<Value> {
    Json(json!({
        "BTCUSD": 30_000.0,
        "ETHUSD": 2_000.0,
        "ADAUSD": 0.5,
        "SOLUSD": 25.0,
    }))
}
