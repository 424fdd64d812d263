//! xLedger - 잔고 예약 기반 주문 관리 API
//!
//! 주문 생성/취소/수정을 사용자의 자산 예약과 한 트랜잭션으로 묶어 처리하는
//! 단일 바이너리 서버입니다. 매칭 엔진은 없으며 주문은 저장된 행으로만
//! 존재합니다. 상태 전이는 전적으로 클라이언트 요청으로 일어납니다.

pub mod api;
pub mod auth;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod server;
