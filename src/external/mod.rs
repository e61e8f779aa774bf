pub mod account_ledger;
pub mod order_factory;

pub use account_ledger::*;
pub use order_factory::*;
