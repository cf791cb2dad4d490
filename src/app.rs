use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/habits", get(handlers::list_habits))
        .route("/api/habits", post(handlers::create_habit))
        .route("/api/habits/:id", put(handlers::update_habit))
        .route("/api/habits/:id", delete(handlers::delete_habit))
        .route("/api/habits/:id/toggle", post(handlers::toggle_completion))
        .route("/api/habits/:id/progress", post(handlers::update_progress))
        .route("/api/habits/:id/complete", post(handlers::mark_completed))
        .route("/api/habits/:id/reset", post(handlers::reset_day))
        .route("/api/stats/summary", get(handlers::get_summary))
        .route("/api/stats/day", get(handlers::get_day_stats))
        .route("/api/stats/week", get(handlers::get_week_stats))
        .route("/api/stats/month", get(handlers::get_month_stats))
        .route("/api/calendar/week", get(handlers::get_week_calendar))
        .route("/api/calendar/month", get(handlers::get_month_calendar))
        .with_state(state)
}
