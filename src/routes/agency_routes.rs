use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::{get, post},
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};
use validator::Validate;

use crate::controllers::agency_controller::AgencyController;
use crate::dto::agency_dto::{CreateAgencyRequest, DashboardSummary, UpdateAgencyRequest};
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::agency::Agency;
use crate::services::booking_workflow::BookingWorkflow;
use crate::services::notification_hub::{DashboardEvent, DashboardSubscription};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_agency_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_agency))
        .route("/me", get(get_agency).put(update_agency))
        .route("/dashboard", get(dashboard))
        .route("/live", get(live_dashboard))
}

async fn create_agency(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateAgencyRequest>,
) -> Result<Json<ApiResponse<Agency>>, AppError> {
    request.validate()?;
    let response = AgencyController::new(&state).create(&user, request).await?;
    Ok(Json(response))
}

async fn get_agency(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Agency>>, AppError> {
    let response = AgencyController::new(&state).get_own(&user).await?;
    Ok(Json(response))
}

async fn update_agency(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<UpdateAgencyRequest>,
) -> Result<Json<ApiResponse<Agency>>, AppError> {
    request.validate()?;
    let response = AgencyController::new(&state).update_own(&user, request).await?;
    Ok(Json(response))
}

async fn dashboard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<DashboardSummary>>, AppError> {
    let response = AgencyController::new(&state).dashboard(&user).await?;
    Ok(Json(response))
}

/// WebSocket del dashboard: la suscripción se abre antes del upgrade para
/// que un usuario sin agencia reciba el error HTTP normal
async fn live_dashboard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ws: WebSocketUpgrade,
) -> Result<Response, AppError> {
    let subscription = state.bookings.open_dashboard(&user).await?;
    let workflow = state.bookings.clone();
    Ok(ws.on_upgrade(move |socket| run_dashboard_socket(socket, subscription, workflow)))
}

async fn run_dashboard_socket(
    socket: WebSocket,
    mut subscription: DashboardSubscription,
    workflow: BookingWorkflow,
) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = subscription.next() => {
                let Some(event) = event else { break };

                // Una reserva nueva puede ser de un vehículo dado de alta después de suscribirse
                if matches!(event, DashboardEvent::Broadcast { .. } | DashboardEvent::Resync) {
                    match workflow.fleet_ids(subscription.agency_id()).await {
                        Ok(ids) => subscription.refresh_vehicles(ids),
                        Err(e) => warn!(topic = subscription.topic(), "Could not refresh fleet: {}", e),
                    }
                }

                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Could not serialize dashboard event: {}", e);
                        continue;
                    }
                };
                if sender.send(Message::Text(text)).await.is_err() {
                    debug!(topic = subscription.topic(), "Dashboard socket closed while sending");
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    subscription.unsubscribe().await;
}
