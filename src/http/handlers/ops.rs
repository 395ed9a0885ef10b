use crate::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::atomic::Ordering;

pub async fn queue_status(State(state): State<AppState>) -> impl IntoResponse {
    match state.queue.depths().await {
        Ok((pending, in_flight)) => (
            axum::http::StatusCode::OK,
            Json(serde_json::json!({
                "pending": pending,
                "inFlight": in_flight,
                "leader": state.is_leader.load(Ordering::Relaxed),
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("queue status unavailable: {e}");
            axum::http::StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}
