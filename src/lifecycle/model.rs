//! 주문 생명주기의 기본 모델
//!
//! 이 모듈은 매수/매도 방향, 주문 타입, 주문 상태와 함께
//! 모든 진입점이 공유하는 필드 검증·예약 금액 계산 로직을 정의합니다.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// 매수 주문이 예약하는 호가 자산 (이 설계에서는 USD 고정)
pub const QUOTE_ASSET: &str = "USD";

/// 진입 가능한 유일한 주문 상태
pub const STATUS_PENDING: &str = "PENDING";

/// 매수/매도 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// 매수 주문
    Buy,
    /// 매도 주문
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl FromStr for Side {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => Err(ApiError::Validation(format!(
                "side는 BUY 또는 SELL이어야 합니다: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 주문 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// 지정가 주문 - 가격 필수
    Limit,
    /// 시장가 주문 - 가격 없이 접수 (price 0으로 저장)
    Market,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Limit => "LIMIT",
            OrderType::Market => "MARKET",
        }
    }
}

impl FromStr for OrderType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LIMIT" => Ok(OrderType::Limit),
            "MARKET" => Ok(OrderType::Market),
            other => Err(ApiError::Validation(format!(
                "order_type은 LIMIT 또는 MARKET이어야 합니다: {}",
                other
            ))),
        }
    }
}

/// 신규 주문 입력 (정규화 완료 상태)
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub symbol: String,
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    pub order_type: OrderType,
}

impl NewOrder {
    /// 원시 요청 필드를 정규화하고 공유 검증을 거쳐 NewOrder를 만든다.
    ///
    /// 과거 구현처럼 라우트마다 검증을 중복하지 않고
    /// 생성·수정 진입점 모두 이 함수를 거칩니다.
    pub fn parse(
        symbol: &str,
        side: &str,
        price: Option<f64>,
        quantity: f64,
        order_type: Option<&str>,
    ) -> Result<Self, ApiError> {
        let symbol = symbol.trim().to_uppercase();
        let side = Side::from_str(side)?;
        let order_type = match order_type {
            Some(t) => OrderType::from_str(t)?,
            None => OrderType::Limit,
        };
        // 시장가 주문은 가격 없이 접수되며 0으로 저장된다
        let price = price.unwrap_or(0.0);

        validate_order_fields(&symbol, quantity, price, order_type)?;

        Ok(Self {
            symbol,
            side,
            price,
            quantity,
            order_type,
        })
    }
}

/// 주문 필드 공유 검증
///
/// 수량은 항상 양수여야 하고, 시장가가 아닌 주문은 가격도 양수여야 합니다.
pub fn validate_order_fields(
    symbol: &str,
    quantity: f64,
    price: f64,
    order_type: OrderType,
) -> Result<(), ApiError> {
    if symbol.is_empty() {
        return Err(ApiError::Validation("symbol이 비어 있습니다".to_string()));
    }
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(ApiError::Validation(
            "수량은 0보다 커야 합니다".to_string(),
        ));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(ApiError::Validation(
            "가격은 음수일 수 없습니다".to_string(),
        ));
    }
    if order_type != OrderType::Market && price <= 0.0 {
        return Err(ApiError::Validation(
            "지정가 주문에는 0보다 큰 가격이 필요합니다".to_string(),
        ));
    }
    Ok(())
}

/// 심볼에서 기초 자산을 유도한다.
///
/// 알려진 호가 자산 접미사를 긴 것부터("USDT" → "USD") 제거합니다.
/// "USDUSDT" 같은 심볼은 모호하게 해석되는 알려진 한계가 있으며,
/// 원래 동작을 그대로 보존합니다.
pub fn base_asset(symbol: &str) -> Option<&str> {
    let base = symbol
        .strip_suffix("USDT")
        .or_else(|| symbol.strip_suffix("USD"))?;
    if base.is_empty() {
        None
    } else {
        Some(base)
    }
}

/// 주문이 잔고에 걸어야 하는 예약을 계산한다.
///
/// - 매수: 호가 자산(USD)에서 수량 × 가격
/// - 매도: 기초 자산에서 수량
///
/// 시장가 매수는 가격 0으로 접수되므로 예약 금액이 0이 됩니다.
pub fn reservation(
    side: Side,
    symbol: &str,
    quantity: f64,
    price: f64,
) -> Result<(String, f64), ApiError> {
    match side {
        Side::Buy => Ok((QUOTE_ASSET.to_string(), quantity * price)),
        Side::Sell => {
            let base = base_asset(symbol).ok_or_else(|| {
                ApiError::Validation(format!(
                    "기초 자산을 유도할 수 없는 심볼입니다: {}",
                    symbol
                ))
            })?;
            Ok((base.to_string(), quantity))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_asset_strips_known_quote_suffixes() {
        assert_eq!(base_asset("BTCUSD"), Some("BTC"));
        assert_eq!(base_asset("BTCUSDT"), Some("BTC"));
        assert_eq!(base_asset("ETHUSD"), Some("ETH"));
        // USDT가 USD보다 먼저 제거된다
        assert_eq!(base_asset("SOLUSDT"), Some("SOL"));
    }

    #[test]
    fn base_asset_rejects_unknown_or_bare_symbols() {
        assert_eq!(base_asset("BTCKRW"), None);
        assert_eq!(base_asset("USD"), None);
        assert_eq!(base_asset("USDT"), None);
    }

    #[test]
    fn reservation_buy_uses_quote_asset() {
        let (asset, amount) = reservation(Side::Buy, "BTCUSD", 0.1, 30000.0).unwrap();
        assert_eq!(asset, "USD");
        assert!((amount - 3000.0).abs() < 1e-9);
    }

    #[test]
    fn reservation_sell_uses_base_asset_quantity() {
        let (asset, amount) = reservation(Side::Sell, "BTCUSD", 0.25, 30000.0).unwrap();
        assert_eq!(asset, "BTC");
        assert!((amount - 0.25).abs() < 1e-12);
    }

    #[test]
    fn reservation_sell_fails_without_derivable_base() {
        assert!(reservation(Side::Sell, "BTCKRW", 1.0, 100.0).is_err());
    }

    #[test]
    fn parse_rejects_non_positive_quantity() {
        assert!(NewOrder::parse("BTCUSD", "BUY", Some(100.0), 0.0, None).is_err());
        assert!(NewOrder::parse("BTCUSD", "BUY", Some(100.0), -1.0, None).is_err());
    }

    #[test]
    fn parse_requires_price_for_limit_orders() {
        assert!(NewOrder::parse("BTCUSD", "BUY", None, 1.0, None).is_err());
        assert!(NewOrder::parse("BTCUSD", "BUY", Some(0.0), 1.0, Some("LIMIT")).is_err());
        // 시장가는 가격 없이 통과한다
        let order = NewOrder::parse("BTCUSD", "BUY", None, 1.0, Some("MARKET")).unwrap();
        assert_eq!(order.price, 0.0);
        assert_eq!(order.order_type, OrderType::Market);
    }

    #[test]
    fn parse_normalizes_symbol_and_side() {
        let order = NewOrder::parse(" btcusd ", "buy", Some(100.0), 1.0, None).unwrap();
        assert_eq!(order.symbol, "BTCUSD");
        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.order_type, OrderType::Limit);
    }
}
