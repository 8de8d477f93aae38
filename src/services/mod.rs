pub mod cart_snapshot;
pub mod catalog;
pub mod checkout_service;
pub mod order_repository;
pub mod order_service;
pub mod order_state;
pub mod payment_service;
pub mod stock_ledger;
