use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::services::action::{Action, ActionError};
use crate::services::game_service::{self, CommandOutcome};
use crate::services::messages::OutboundMessage;
use crate::services::setup::{RoleSelection, SetupError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    players: Vec<String>,
    #[serde(default)]
    roles: RolesField,
    seed: Option<u64>,
    session: Option<String>,
}

/// Either a selection mode keyword or an explicit role-name list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RolesField {
    Mode(String),
    List(Vec<String>),
}

impl Default for RolesField {
    fn default() -> Self {
        RolesField::Mode("none".to_string())
    }
}

impl RolesField {
    fn into_selection(self) -> Result<RoleSelection, String> {
        match self {
            RolesField::List(names) => Ok(RoleSelection::Use(names)),
            RolesField::Mode(mode) => match mode.to_ascii_lowercase().as_str() {
                "none" => Ok(RoleSelection::None),
                "random" => Ok(RoleSelection::Random),
                other => Err(format!("unknown role selection mode: {}", other)),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct StartResponse {
    session: String,
    stage: String,
    round: u32,
    messages: Vec<OutboundMessage>,
}

#[derive(Debug, Serialize)]
struct ActionResponse {
    stage: String,
    round: u32,
    messages: Vec<OutboundMessage>,
}

impl From<CommandOutcome> for ActionResponse {
    fn from(outcome: CommandOutcome) -> Self {
        ActionResponse {
            stage: outcome.stage.to_string(),
            round: outcome.round,
            messages: outcome.messages,
        }
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", post(start_game))
        .nest(
            "/:session",
            Router::new()
                .route("/", get(game_status))
                .route("/action", post(submit_action))
                .route("/quit", post(quit_game)),
        )
        .with_state(state)
}

async fn start_game(
    State(state): State<AppState>,
    Json(request): Json<StartRequest>,
) -> impl IntoResponse {
    // Player names must be distinct; the engine treats this as a
    // precondition.
    for (i, name) in request.players.iter().enumerate() {
        if request.players[i + 1..].contains(name) {
            let message = format!("duplicate player name: {}", name);
            return (StatusCode::BAD_REQUEST, Json(message)).into_response();
        }
    }
    let selection = match request.roles.into_selection() {
        Ok(selection) => selection,
        Err(message) => return (StatusCode::BAD_REQUEST, Json(message)).into_response(),
    };
    match game_service::start_session(
        state,
        request.session,
        request.players,
        selection,
        request.seed,
    )
    .await
    {
        Ok((session, outcome)) => (
            StatusCode::OK,
            Json(StartResponse {
                session,
                stage: outcome.stage.to_string(),
                round: outcome.round,
                messages: outcome.messages,
            }),
        )
            .into_response(),
        Err(error) => setup_error_response(error),
    }
}

async fn game_status(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> impl IntoResponse {
    match game_service::game_status(state, &session).await {
        Ok(game) => (StatusCode::OK, Json(game)).into_response(),
        Err(error) => action_error_response(error),
    }
}

async fn submit_action(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(action): Json<Action>,
) -> impl IntoResponse {
    match game_service::submit_action(state, &session, action).await {
        Ok(outcome) => (StatusCode::OK, Json(ActionResponse::from(outcome))).into_response(),
        Err(error) => action_error_response(error),
    }
}

async fn quit_game(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> impl IntoResponse {
    match game_service::quit_session(state, &session).await {
        Ok(outcome) => (StatusCode::OK, Json(ActionResponse::from(outcome))).into_response(),
        Err(error) => action_error_response(error),
    }
}

fn setup_error_response(error: SetupError) -> axum::response::Response {
    let status = match error {
        SetupError::GameAlreadyRunning => StatusCode::CONFLICT,
        SetupError::RolesNotFound(_) | SetupError::TooFewPlayers { .. } => {
            StatusCode::BAD_REQUEST
        }
    };
    (status, Json(error.to_string())).into_response()
}

fn action_error_response(error: ActionError) -> axum::response::Response {
    let status = match error {
        ActionError::NoGameRunning => StatusCode::NOT_FOUND,
        ActionError::GameIsOver => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, Json(error.to_string())).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_setup::setup_test_env;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    fn start_body(players: &[&str], roles: &str) -> Body {
        Body::from(format!(
            r#"{{"players": [{}], "roles": "{}", "seed": 42}}"#,
            players
                .iter()
                .map(|p| format!("\"{}\"", p))
                .collect::<Vec<_>>()
                .join(", "),
            roles
        ))
    }

    #[tokio::test]
    async fn test_start_game() {
        setup_test_env();
        let state = AppState::new();
        let app = routes(state.clone());

        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(start_body(&["ann", "bob", "carl", "dina"], "none"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_start_game_rejects_duplicates() {
        setup_test_env();
        let state = AppState::new();
        let app = routes(state.clone());

        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(start_body(&["ann", "ann", "carl", "dina"], "none"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_action_without_game_is_not_found() {
        setup_test_env();
        let state = AppState::new();
        let app = routes(state.clone());

        let request = Request::builder()
            .method("POST")
            .uri("/missing/action")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"actor": "ann", "verb": "vote", "target": "bob"}"#,
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
