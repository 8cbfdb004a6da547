use std::time::Duration;

use axum::{
    http::{StatusCode, Uri},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use cryptopay_core::api::ApiError;

use crate::{
    access::access_control,
    handlers::{
        health::livez,
        payments::{create_payment, get_payment, list_payments},
        rates::{get_rates, get_rates_history},
        users::{create_user, get_user, get_user_payments},
        AppError,
    },
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState, request_timeout: Duration) -> Router {
    // API routes behind the key check and the throttle
    let api_routes = Router::new()
        // User routes
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/payments", get(get_user_payments))
        // Payment routes
        .route("/payments", get(list_payments).post(create_payment))
        .route("/payments/{id}", get(get_payment))
        // Rate routes
        .route("/rates", get(get_rates))
        .route("/rates/history", get(get_rates_history))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), access_control));

    // Main application router
    api_routes
        .route("/livez", get(livez))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .with_state(state)
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    AppError::from(ApiError::not_found(uri.path()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use chrono::{TimeZone, Utc};
    use cryptopay_core::api::{Operation, ROUTES};
    use cryptopay_core::payment::{rate_to_item, Rate};
    use cryptopay_core::storage::{PutCondition, Store};
    use cryptopay_core::throttle::ThrottleLimits;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{config::Config, storage::InMemoryStore};

    const KEY: &str = "test-key";

    fn config() -> Config {
        Config {
            api_keys: vec![KEY.to_string()],
            ..Config::default()
        }
    }

    fn app_with(store: Arc<dyn Store>, config: Config) -> Router {
        let state = AppState::new(store, &config);
        create_app(state, config.request_timeout())
    }

    fn app() -> Router {
        app_with(Arc::new(InMemoryStore::new()), config())
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-api-key", KEY)
            .body(Body::empty())
            .unwrap()
    }

    fn post_req(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("x-api-key", KEY)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        post_req(uri, body.to_string())
    }

    async fn body_json(response: Response) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, body_json(response).await)
    }

    async fn create_user(app: &Router, body: Value) -> String {
        let (status, json) = send(app, post_json("/users", body)).await;
        assert_eq!(status, StatusCode::CREATED);
        json["userId"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let app = app();

        let user_id = create_user(&app, json!({"name": "Alice", "email": "a@x.io"})).await;

        let (status, json) = send(&app, get_req(&format!("/users/{user_id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["id"], user_id.as_str());
        assert_eq!(json["name"], "Alice");
        assert_eq!(json["email"], "a@x.io");
        assert!(json["createdAt"].is_string());
        assert_eq!(json["createdAt"], json["updatedAt"]);
    }

    #[tokio::test]
    async fn test_get_unknown_user_is_not_found() {
        let (status, json) = send(&app(), get_req("/users/nobody")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "User not found: nobody");
    }

    #[tokio::test]
    async fn test_create_user_validation() {
        let app = app();

        let cases = [
            (json!({}), "Either name or email is required."),
            (json!({"email": "not-an-email"}), "Invalid email address."),
            (json!({"name": 42}), "Invalid name."),
        ];

        for (body, message) in cases {
            let (status, json) = send(&app, post_json("/users", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["code"], "VALIDATION_ERROR");
            assert_eq!(json["message"], message);
        }
    }

    #[tokio::test]
    async fn test_malformed_bodies_are_rejected() {
        let app = app();

        for body in ["", "not json", "[1, 2]", "\"text\""] {
            let (status, json) = send(&app, post_req("/payments", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
            assert_eq!(json["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn test_create_and_get_payment() {
        let app = app();
        let user_id = create_user(&app, json!({"name": "Alice"})).await;

        let (status, json) = send(
            &app,
            post_json(
                "/payments",
                json!({
                    "userId": user_id,
                    "amount": "0.005",
                    "currency": "BTC",
                    "metadata": {"orderId": "o-1"}
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let payment_id = json["paymentId"].as_str().unwrap().to_string();

        let (status, json) = send(&app, get_req(&format!("/payments/{payment_id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["paymentId"], payment_id.as_str());
        assert_eq!(json["userId"], user_id.as_str());
        assert_eq!(json["amount"], "0.005");
        assert_eq!(json["currency"], "BTC");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["metadata"]["orderId"], "o-1");
    }

    #[tokio::test]
    async fn test_numeric_amount_is_accepted() {
        let app = app();
        let user_id = create_user(&app, json!({"email": "b@x.io"})).await;

        let (status, json) = send(
            &app,
            post_json(
                "/payments",
                json!({"userId": user_id, "amount": 12.5, "currency": "ETH"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let payment_id = json["paymentId"].as_str().unwrap();
        let (_, json) = send(&app, get_req(&format!("/payments/{payment_id}"))).await;
        assert_eq!(json["amount"], "12.5");
    }

    #[tokio::test]
    async fn test_payment_validation() {
        let app = app();
        let user_id = create_user(&app, json!({"name": "Alice"})).await;

        let cases = [
            (
                json!({"amount": "1", "currency": "BTC"}),
                "Invalid or missing userId.",
            ),
            (
                json!({"userId": user_id, "amount": "-1", "currency": "BTC"}),
                "Invalid or missing amount.",
            ),
            (
                json!({"userId": user_id, "amount": "1"}),
                "Invalid or missing currency.",
            ),
            (
                json!({"userId": user_id, "amount": "1", "currency": "bitcoin!"}),
                "Invalid currency format.",
            ),
            (
                json!({"userId": user_id, "amount": "1", "currency": "BTC", "metadata": [1]}),
                "Invalid metadata, expected a JSON object.",
            ),
        ];

        for (body, message) in cases {
            let (status, json) = send(&app, post_json("/payments", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["message"], message);
        }

        let (_, json) = send(&app, get_req("/payments")).await;
        assert_eq!(json, json!([]));
    }

    #[tokio::test]
    async fn test_payment_for_unknown_user_is_rejected() {
        let app = app();

        let (status, json) = send(
            &app,
            post_json(
                "/payments",
                json!({"userId": "ghost", "amount": "1", "currency": "BTC"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "User ghost does not exist.");
    }

    #[tokio::test]
    async fn test_duplicate_payment_id_conflicts() {
        let app = app();
        let user_id = create_user(&app, json!({"name": "Alice"})).await;
        let body = json!({
            "userId": user_id,
            "amount": "1",
            "currency": "BTC",
            "paymentId": "order-42"
        });

        let (status, json) = send(&app, post_json("/payments", body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["paymentId"], "order-42");

        let (status, json) = send(&app, post_json("/payments", body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "CONFLICT");

        let (_, json) = send(&app, get_req(&format!("/users/{user_id}/payments"))).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_user_payments_in_creation_order() {
        let app = app();
        let alice = create_user(&app, json!({"name": "Alice"})).await;
        let bob = create_user(&app, json!({"name": "Bob"})).await;

        for (user, id) in [(&alice, "a-1"), (&bob, "b-1"), (&alice, "a-2"), (&alice, "a-3")] {
            let (status, _) = send(
                &app,
                post_json(
                    "/payments",
                    json!({"userId": user, "amount": "1", "currency": "USD", "paymentId": id}),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, json) = send(&app, get_req(&format!("/users/{alice}/payments"))).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["paymentId"].as_str().unwrap())
            .collect();
        assert_eq!(ids, ["a-1", "a-2", "a-3"]);

        let (_, json) = send(&app, get_req("/users/nobody/payments")).await;
        assert_eq!(json, json!([]));
    }

    #[tokio::test]
    async fn test_index_lookup_matches_listing() {
        let app = app();
        let user_id = create_user(&app, json!({"name": "Alice"})).await;

        for currency in ["BTC", "ETH"] {
            send(
                &app,
                post_json(
                    "/payments",
                    json!({"userId": user_id, "amount": "2", "currency": currency}),
                ),
            )
            .await;
        }

        let (status, listed) = send(&app, get_req("/payments")).await;
        assert_eq!(status, StatusCode::OK);
        let listed = listed.as_array().unwrap().clone();
        assert_eq!(listed.len(), 2);

        for payment in listed {
            let id = payment["paymentId"].as_str().unwrap();
            let (status, fetched) = send(&app, get_req(&format!("/payments/{id}"))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(fetched, payment);
        }

        let (status, _) = send(&app, get_req("/payments/missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rates_and_history() {
        let store = Arc::new(InMemoryStore::new());
        let t = |min| Utc.with_ymd_and_hms(2024, 6, 15, 12, min, 0).unwrap();
        for rate in [
            Rate::new("BTC-USD", "65000.00", t(0)),
            Rate::new("BTC-USD", "65100.00", t(1)),
            Rate::new("ETH-USD", "3400.00", t(0)),
        ] {
            store
                .put_item(&rate_to_item(&rate).unwrap(), PutCondition::Overwrite)
                .await
                .unwrap();
        }
        let app = app_with(store, config());

        let (status, json) = send(&app, get_req("/rates")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"BTC-USD": "65100.00", "ETH-USD": "3400.00"}));

        let (status, json) = send(&app, get_req("/rates/history")).await;
        assert_eq!(status, StatusCode::OK);
        let rates: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["rate"].as_str().unwrap())
            .collect();
        assert_eq!(rates, ["65100.00", "3400.00", "65000.00"]);

        let (_, json) = send(&app, get_req("/rates/history?pair=ETH-USD")).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["pair"], "ETH-USD");
    }

    #[tokio::test]
    async fn test_rates_empty_store() {
        let app = app();

        let (_, json) = send(&app, get_req("/rates")).await;
        assert_eq!(json, json!({}));

        let (_, json) = send(&app, get_req("/rates/history?pair=BTC-USD")).await;
        assert_eq!(json, json!([]));
    }

    #[tokio::test]
    async fn test_every_route_requires_api_key() {
        let app = app();

        for route in ROUTES {
            let path = route.path.replace("{id}", "x");
            for key in [None, Some("wrong-key")] {
                let mut builder = Request::builder()
                    .method(route.method.as_str())
                    .uri(&path);
                if let Some(key) = key {
                    builder = builder.header("x-api-key", key);
                }
                let request = builder.body(Body::from("{}")).unwrap();

                let (status, json) = send(&app, request).await;
                assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {path}", route.method.as_str());
                assert_eq!(json["code"], "UNAUTHORIZED");
            }
        }
    }

    #[tokio::test]
    async fn test_every_route_reaches_its_operation() {
        let app = app();
        let user_id = create_user(&app, json!({"name": "Alice"})).await;
        let (status, _) = send(
            &app,
            post_json(
                "/payments",
                json!({"userId": user_id, "amount": "1", "currency": "BTC", "paymentId": "p-1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        for route in ROUTES {
            let id = if route.path.starts_with("/users") {
                user_id.as_str()
            } else {
                "p-1"
            };
            let path = route.path.replace("{id}", id);
            let body = match route.operation {
                Operation::CreateUser => json!({"name": "Bob"}),
                Operation::CreatePayment => {
                    json!({"userId": user_id, "amount": "2", "currency": "ETH"})
                }
                _ => Value::Null,
            };
            let request = Request::builder()
                .method(route.method.as_str())
                .uri(&path)
                .header("x-api-key", KEY)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();

            let (status, json) = send(&app, request).await;

            let label = format!("{} {path}", route.method.as_str());
            assert_eq!(status.as_u16(), route.success_status, "{label}");
            match route.operation {
                Operation::CreateUser => assert!(json["userId"].is_string(), "{label}"),
                Operation::CreatePayment => assert!(json["paymentId"].is_string(), "{label}"),
                Operation::GetUser => assert_eq!(json["id"], user_id.as_str(), "{label}"),
                Operation::GetPayment => assert_eq!(json["paymentId"], "p-1", "{label}"),
                Operation::GetUserPayments | Operation::ListPayments => {
                    assert!(json.as_array().is_some_and(|p| !p.is_empty()), "{label}")
                }
                Operation::GetRates => assert!(json.is_object(), "{label}"),
                Operation::GetRatesHistory => assert!(json.is_array(), "{label}"),
            }
        }
    }

    #[tokio::test]
    async fn test_no_keys_configured_rejects_everything() {
        let app = app_with(Arc::new(InMemoryStore::new()), Config::default());

        let (status, _) = send(&app, get_req("/rates")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_burst_exhaustion_is_throttled() {
        let config = Config {
            throttle: ThrottleLimits {
                rate_per_sec: 1,
                burst: 2,
            },
            ..config()
        };
        let app = app_with(Arc::new(InMemoryStore::new()), config);

        for _ in 0..2 {
            let (status, _) = send(&app, get_req("/rates")).await;
            assert_eq!(status, StatusCode::OK);
        }

        let response = app.clone().oneshot(get_req("/rates")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
        let json = body_json(response).await;
        assert_eq!(json["code"], "THROTTLED");
    }

    #[tokio::test]
    async fn test_unauthorized_requests_do_not_spend_tokens() {
        let config = Config {
            throttle: ThrottleLimits {
                rate_per_sec: 1,
                burst: 1,
            },
            ..config()
        };
        let app = app_with(Arc::new(InMemoryStore::new()), config);

        for _ in 0..5 {
            let request = Request::builder().uri("/rates").body(Body::empty()).unwrap();
            let (status, _) = send(&app, request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        let (status, _) = send(&app, get_req("/rates")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_undeclared_routes_are_not_found() {
        let app = app();

        let cases = [
            Request::builder()
                .method("DELETE")
                .uri("/users/x")
                .header("x-api-key", KEY)
                .body(Body::empty())
                .unwrap(),
            Request::builder()
                .method("GET")
                .uri("/users")
                .header("x-api-key", KEY)
                .body(Body::empty())
                .unwrap(),
            get_req("/unknown"),
            get_req("/payments/a/b"),
        ];

        for request in cases {
            let (status, json) = send(&app, request).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(json["code"], "NOT_FOUND");
        }
    }

    #[tokio::test]
    async fn test_livez_needs_no_key() {
        let response = app()
            .oneshot(Request::builder().uri("/livez").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
