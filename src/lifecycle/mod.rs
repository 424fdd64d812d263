pub mod ledger;
pub mod manager;
pub mod model;

pub use manager::OrderLifecycleManager;
pub use model::{NewOrder, OrderType, Side};
