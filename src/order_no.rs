use chrono::Local;
use rand::Rng;

/// `yyyyMMddHHmmss` followed by a random suffix in 100000..=999999.
///
/// Not unique by construction; the `orders.order_no` unique index is the
/// guard and insertion retries on conflict.
pub fn generate_order_no() -> String {
    let timestamp = Local::now().format("%Y%m%d%H%M%S");
    let suffix: u32 = rand::thread_rng().gen_range(100_000..=999_999);
    format!("{timestamp}{suffix}")
}

/// Reference handed back by the mock payment capture.
pub fn generate_transaction_no() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("PAY{millis}{}", random[..8].to_uppercase())
}
