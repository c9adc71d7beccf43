use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::AppState;

use crate::handlers::*;
use crate::models::{Appointment, CareRecord, Document, Notification, Prescription, Vitals};

fn record_routes<T: CareRecord>() -> Router<AppState> {
    Router::new()
        .route("/", post(create_record::<T>).get(list_records::<T>))
        .route("/{id}", get(get_record::<T>).patch(update_record::<T>))
}

/// One route group per record type, all behind a session token.
pub fn care_records_routes(state: AppState) -> Router {
    let appointments = record_routes::<Appointment>()
        .route("/doctor", get(list_for_doctor::<Appointment>));

    let prescriptions = record_routes::<Prescription>()
        .route("/doctor", get(list_for_doctor::<Prescription>));

    let notifications = record_routes::<Notification>()
        .route("/read-all", patch(mark_all_notifications_read))
        .route("/{id}/read", patch(mark_notification_read));

    Router::new()
        .nest("/appointments", appointments)
        .nest("/vitals", record_routes::<Vitals>())
        .nest("/documents", record_routes::<Document>())
        .nest("/notifications", notifications)
        .nest("/prescriptions", prescriptions)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
