use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PayRequest {
    pub order_no: String,
    /// Free-form label such as `ALIPAY`; defaults to `MOCK`.
    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResult {
    pub order_no: String,
    pub pay_amount: Decimal,
    pub payment_method: String,
    pub payment_status: PaymentOutcome,
    pub message: String,
    pub transaction_no: String,
}

/// Outcome reported by the payer. Anything other than `SUCCESS` is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentOutcome {
    Success,
    #[serde(other)]
    Failed,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentNotifyRequest {
    #[serde(alias = "orderNo")]
    pub order_no: String,
    #[serde(alias = "transactionNo")]
    pub transaction_no: String,
    #[serde(alias = "paymentStatus")]
    pub payment_status: PaymentOutcome,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallbackOutcome {
    /// The order moved from UNPAID to PAID.
    Settled,
    /// The order is already PAID; the notification was ignored.
    AlreadySettled,
    /// The payer reported a failure; the order stays UNPAID.
    Declined,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CallbackAck {
    pub order_no: String,
    pub outcome: CallbackOutcome,
}
