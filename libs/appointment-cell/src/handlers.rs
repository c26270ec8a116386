use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::Identity;
use shared_models::error::AppError;

use crate::models::{BookAppointmentRequest, TransitionRequest, ViewScope};
use crate::services::booking::AppointmentBookingService;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::projection::{LiveViewService, SubscriptionGuard, ViewDelta};
use crate::AppointmentState;

#[derive(Debug, Deserialize)]
pub struct ScopeQuery {
    pub scope: Option<String>,
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(identity): Extension<Identity>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let booking = AppointmentBookingService::new(&state);
    let appointment = booking.book_appointment(&identity, request).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppointmentState>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<Value>, AppError> {
    let scope_param = query.scope.as_deref().unwrap_or("mine");
    let scope = ViewScope::authorize(scope_param, &identity)?;

    let booking = AppointmentBookingService::new(&state);
    let appointments = booking.list(&scope).await;

    Ok(Json(json!({
        "appointments": appointments,
        "count": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(identity): Extension<Identity>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking = AppointmentBookingService::new(&state);
    let appointment = booking.get(appointment_id, &identity).await?;

    Ok(Json(json!({ "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn transition_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(identity): Extension<Identity>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Value>, AppError> {
    let lifecycle = AppointmentLifecycleService::new(&state);
    let appointment = lifecycle
        .transition(appointment_id, request.target_status, &identity, request.remarks)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<AppointmentState>>,
    Extension(identity): Extension<Identity>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let booking = AppointmentBookingService::new(&state);
    booking.delete(appointment_id, &identity).await?;

    Ok(Json(json!({ "success": true })))
}

/// Long-lived role-scoped subscription, exposed as server-sent events: one
/// `snapshot` event, then a `change`/`removed` event per committed delta.
/// A feed overflow surfaces as a terminal `error` event; the client
/// resubscribes. Client disconnect tears the subscription down.
#[axum::debug_handler]
pub async fn stream_appointments(
    State(state): State<Arc<AppointmentState>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ScopeQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let scope_param = query.scope.as_deref().unwrap_or("mine");
    let scope = ViewScope::authorize(scope_param, &identity)?;

    let live_views = LiveViewService::new(&state);
    let subscription = live_views.subscribe(scope).await;
    let (snapshot, receiver, guard) = subscription.into_parts();

    let snapshot_json = serde_json::to_string(&snapshot)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let snapshot_event = Event::default().event("snapshot").data(snapshot_json);

    let deltas = stream::unfold(
        DeltaStreamState {
            receiver,
            _guard: guard,
            done: false,
        },
        |mut state| async move {
            if state.done {
                return None;
            }

            match state.receiver.recv().await {
                Some(ViewDelta::Changed(appointment)) => {
                    let data = serde_json::to_string(&appointment).unwrap_or_default();
                    Some((Event::default().event("change").data(data), state))
                }
                Some(ViewDelta::Removed(id)) => {
                    Some((Event::default().event("removed").data(id.to_string()), state))
                }
                Some(ViewDelta::Lagged) => {
                    state.done = true;
                    Some((
                        Event::default()
                            .event("error")
                            .data("subscription lagged, resubscribe"),
                        state,
                    ))
                }
                None => None,
            }
        },
    );

    let stream = stream::once(async move { snapshot_event })
        .chain(deltas)
        .map(Ok);

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

struct DeltaStreamState {
    receiver: tokio::sync::mpsc::Receiver<ViewDelta>,
    // Holds the forwarding task; dropping the stream cancels the watch.
    _guard: SubscriptionGuard,
    done: bool,
}
