use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        orders::{CreateOrderRequest, OrderList, OrderWithItems},
        payment::{
            CallbackAck, CallbackOutcome, PayRequest, PaymentNotifyRequest, PaymentOutcome,
            PaymentResult,
        },
    },
    entity::sea_orm_active_enums::OrderStatus,
    error::ErrorData,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::{admin, health, orders, params, payment},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::cancel_order,
        orders::confirm_receipt,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::ship_order,
        admin::cancel_order_admin,
        payment::pay,
        payment::notify
    ),
    components(
        schemas(
            Order,
            OrderItem,
            OrderStatus,
            CreateOrderRequest,
            OrderList,
            OrderWithItems,
            PayRequest,
            PaymentResult,
            PaymentOutcome,
            PaymentNotifyRequest,
            CallbackOutcome,
            CallbackAck,
            ErrorData,
            params::Pagination,
            params::OrderListQuery,
            Meta,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<PaymentResult>,
            ApiResponse<CallbackAck>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Orders", description = "Checkout and order lifecycle endpoints"),
        (name = "Admin", description = "Back-office order endpoints"),
        (name = "Payment", description = "Mock settlement endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
