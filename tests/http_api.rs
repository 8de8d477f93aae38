mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use common::*;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use shop_checkout::{
    app::build_app, entity::sea_orm_active_enums::ProductStatus, middleware::auth::Claims,
    state::AppState,
};
use tower::ServiceExt;
use uuid::Uuid;

fn bearer(state: &AppState, user_id: Uuid, role: &str) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: 4_102_444_800,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.jwt_secret.as_bytes()),
    )
    .expect("encode token");
    format!("Bearer {token}")
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> anyhow::Result<(StatusCode, Value)> {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        request = request.header(header::AUTHORIZATION, auth);
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => request.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, json))
}

#[tokio::test]
async fn unknown_route_gets_enveloped_404() -> anyhow::Result<()> {
    let app = build_app(setup_state().await?);
    let (status, body) = send(&app, Method::GET, "/nowhere", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["path"], "/nowhere");
    Ok(())
}

#[tokio::test]
async fn health_echoes_request_id() -> anyhow::Result<()> {
    let app = build_app(setup_state().await?);
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    Ok(())
}

#[tokio::test]
async fn order_routes_require_a_bearer_token() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let app = build_app(state.clone());

    let (status, body) = send(&app, Method::GET, "/api/orders", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["data"]["code"], 401);

    let (status, _) = send(&app, Method::GET, "/api/orders", Some("Basic abc"), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let auth = bearer(&state, Uuid::new_v4(), "user");
    let (status, body) = send(&app, Method::GET, "/api/orders", Some(&auth), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 0);
    assert_eq!(body["data"]["items"], json!([]));
    Ok(())
}

#[tokio::test]
async fn checkout_then_pay_over_http() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let app = build_app(state.clone());
    let user_id = Uuid::new_v4();
    let auth = bearer(&state, user_id, "ROLE_USER");

    let product = seed_product(&state, "lamp", 1999, 3, ProductStatus::OnSale).await?;
    add_cart_line(&state, user_id, product, 2, true).await?;
    let address_id = seed_address(&state, user_id).await?;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(&auth),
        Some(json!({ "address_id": address_id })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order"]["status"], "UNPAID");
    assert_eq!(body["data"]["order"]["total_amount"], "39.98");
    let order_no = body["data"]["order"]["order_no"]
        .as_str()
        .expect("order_no")
        .to_string();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/admin/orders/{order_no}/ship"),
        Some(&auth),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["data"]["code"], 403);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/payment/pay",
        Some(&auth),
        Some(json!({ "order_no": order_no, "payment_method": "WECHAT" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["payment_status"], "SUCCESS");
    assert_eq!(body["data"]["payment_method"], "WECHAT");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/payment/notify",
        None,
        Some(json!({
            "order_no": order_no,
            "transaction_no": "PAY0000000000000DEADBEEF",
            "payment_status": "SUCCESS",
            "timestamp": 1_767_225_600_000_i64
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "ALREADY_SETTLED");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/orders/{order_no}/cancel"),
        Some(&auth),
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order"]["status"], "CANCELLED");
    assert_eq!(stock_of(&state, product).await?, 3);
    Ok(())
}

#[tokio::test]
async fn business_errors_carry_stable_codes() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let app = build_app(state.clone());
    let auth = bearer(&state, Uuid::new_v4(), "user");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/payment/notify",
        None,
        Some(json!({
            "order_no": "19700101000000000000",
            "transaction_no": "PAY1",
            "payment_status": "SUCCESS"
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["code"], 40501);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        Some(&auth),
        Some(json!({ "address_id": Uuid::new_v4() })),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["data"]["code"], 40303);

    let (status, body) = send(&app, Method::GET, "/api/orders?status=LOST", Some(&auth), None).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["data"]["code"], 40502);
    Ok(())
}
