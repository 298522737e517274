use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::wallets;
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/wallets/{wallet_id}/spend", post(wallets::spend))
        .route("/wallets/{wallet_id}/topup", post(wallets::top_up))
        .route("/wallets/{wallet_id}/bonus", post(wallets::bonus))
        .route("/wallets/{wallet_id}/balance", get(wallets::balance))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let state = ServerState {
        engine: Arc::new(engine),
    };

    tracing::info!("listening on {:?}", listener.local_addr());
    axum::serve(listener, router(state)).await
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header::CONTENT_TYPE},
    };
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::Database;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;

    struct Fixture {
        router: Router,
        wallet_id: String,
    }

    async fn fixture() -> Fixture {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = Engine::builder().database(db).build().unwrap();

        let asset_type_id = engine.create_asset_type("Gold Coins").await.unwrap();
        engine.create_treasury(asset_type_id, 1000).await.unwrap();
        let wallet_id = engine
            .create_wallet("user-1", asset_type_id, 100)
            .await
            .unwrap();

        Fixture {
            router: router(ServerState {
                engine: Arc::new(engine),
            }),
            wallet_id: wallet_id.to_string(),
        }
    }

    fn movement_request(path: &str, key: &str, amount: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header(CONTENT_TYPE, "application/json")
            .header("idempotency-key", key)
            .body(Body::from(format!("{{\"amount\":\"{amount}\"}}")))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn spend_returns_new_balance_as_text() {
        let fixture = fixture().await;
        let path = format!("/wallets/{}/spend", fixture.wallet_id);

        let response = fixture
            .router
            .oneshot(movement_request(&path, "k1", "30"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["newBalance"], "70");
        assert_eq!(body["replayed"], false);
    }

    #[tokio::test]
    async fn spend_without_idempotency_key_is_rejected() {
        let fixture = fixture().await;
        let path = format!("/wallets/{}/spend", fixture.wallet_id);

        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"amount":"30"}"#))
            .unwrap();
        let response = fixture.router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_integer_amount_is_rejected() {
        let fixture = fixture().await;
        let path = format!("/wallets/{}/spend", fixture.wallet_id);

        let response = fixture
            .router
            .oneshot(movement_request(&path, "k1", "30.5"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn overdraft_maps_to_conflict() {
        let fixture = fixture().await;
        let path = format!("/wallets/{}/spend", fixture.wallet_id);

        let response = fixture
            .router
            .oneshot(movement_request(&path, "k1", "500"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn top_up_credits_wallet() {
        let fixture = fixture().await;
        let path = format!("/wallets/{}/topup", fixture.wallet_id);

        let response = fixture
            .router
            .clone()
            .oneshot(movement_request(&path, "k2", "50"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["newBalance"], "150");

        let balance_path = format!("/wallets/{}/balance", fixture.wallet_id);
        let response = fixture
            .router
            .oneshot(
                Request::builder()
                    .uri(balance_path)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["balance"], "150");
    }

    #[tokio::test]
    async fn unknown_wallet_maps_to_not_found() {
        let fixture = fixture().await;
        let path = format!("/wallets/{}/balance", Uuid::new_v4());

        let response = fixture
            .router
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
