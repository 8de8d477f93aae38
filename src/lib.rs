//! Checkout-to-settlement backend of an online shop.
//!
//! Checked cart lines become an order in one transaction that debits stock
//! through conditional updates; orders then move through a closed status
//! machine driven by the buyer, the back office and the payer callback.

pub mod app;
pub mod audit;
pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod order_no;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
