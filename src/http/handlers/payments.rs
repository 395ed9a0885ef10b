use crate::domain::payment::PaymentRequest;
use crate::domain::time::parse_instant;
use crate::AppState;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub async fn create_payment(
    State(state): State<AppState>,
    Json(req): Json<PaymentRequest>,
) -> impl IntoResponse {
    let request = req.into_routable(Utc::now());
    match state.queue.enqueue(&request).await {
        Ok(()) => axum::http::StatusCode::CREATED.into_response(),
        Err(e) => {
            tracing::error!("could not enqueue payment {}: {e}", request.correlation_id);
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct SummaryParams {
    pub from: Option<String>,
    pub to: Option<String>,
}

pub async fn payments_summary(
    State(state): State<AppState>,
    Query(params): Query<SummaryParams>,
) -> impl IntoResponse {
    let from = match parse_bound(params.from.as_deref()) {
        Ok(from) => from,
        Err(resp) => return resp,
    };
    let to = match parse_bound(params.to.as_deref()) {
        Ok(to) => to,
        Err(resp) => return resp,
    };

    match state.ledger.get_summary(from, to).await {
        Ok(summary) => (axum::http::StatusCode::OK, Json(summary)).into_response(),
        Err(e) => {
            tracing::error!("could not build payments summary: {e}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn purge_payments(State(state): State<AppState>) -> impl IntoResponse {
    let purged = state.ledger.purge().await;
    let drained = state.queue.purge_pending().await;
    match purged.and(drained) {
        Ok(()) => axum::http::StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("purge failed: {e}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn health() -> impl IntoResponse {
    (axum::http::StatusCode::OK, "ok")
}

/// An absent or empty bound leaves that side of the range open; anything
/// else must parse as an ISO-8601 instant.
fn parse_bound(
    raw: Option<&str>,
) -> Result<Option<DateTime<Utc>>, axum::response::Response> {
    match raw {
        None | Some("") => Ok(None),
        Some(raw) => parse_instant(raw).map(Some).ok_or_else(|| {
            (
                axum::http::StatusCode::BAD_REQUEST,
                "from and to must be ISO-8601 instants.",
            )
                .into_response()
        }),
    }
}
