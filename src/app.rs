use axum::Router;

use crate::routes::create_routes;
use crate::state::AppState;

pub fn create_app() -> Router {
    create_routes(AppState::new())
}
