use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use eshop_db::Store;
use serde::Serialize;

use crate::api::ApiState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub storage: HealthCheck,
    pub checked_at: String,
}

pub async fn health(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    let storage = storage_check(state.store()).await;
    let ready = storage.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck { status: "ready", detail: "eshop-server is accepting requests".to_string() },
        storage,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn storage_check(store: &Store) -> HealthCheck {
    match store.ping().await {
        Ok(()) => HealthCheck {
            status: "ready",
            detail: format!("database `{}` answered", store.database_name()),
        },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("storage query failed: {error}") }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};
    use eshop_db::{connect_with_settings, Store};

    use crate::api::ApiState;
    use crate::health::health;

    async fn state() -> ApiState {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        ApiState::new(Store::from_pool(pool, "eshop", "customers").expect("store"))
    }

    #[tokio::test]
    async fn health_returns_ready_when_storage_is_reachable() {
        let state = state().await;

        let (status, Json(payload)) = health(State(state.clone())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.storage.status, "ready");
        assert_eq!(payload.service.status, "ready");

        state.store().close().await;
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_storage_is_closed() {
        let state = state().await;
        state.store().close().await;

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.storage.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}
