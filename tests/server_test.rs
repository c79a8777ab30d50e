use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;
use werewolf_gm::app;
use werewolf_gm::utils::test_setup::setup_test_env;

fn start_request(session: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/game")
        .header("content-type", "application/json")
        .body(Body::from(format!(
            r#"{{"players": ["ann", "bob", "carl", "dina"], "roles": "none", "seed": 42, "session": "{}"}}"#,
            session
        )))
        .unwrap()
}

fn action_request(session: &str, actor: &str, verb: &str, target: Option<&str>) -> Request<Body> {
    let target = match target {
        Some(name) => format!(r#""{}""#, name),
        None => "null".to_string(),
    };
    Request::builder()
        .method("POST")
        .uri(format!("/api/game/{}/action", session))
        .header("content-type", "application/json")
        .body(Body::from(format!(
            r#"{{"actor": "{}", "verb": "{}", "target": {}}}"#,
            actor, verb, target
        )))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_full_first_night_over_http() {
    setup_test_env();
    let app = app::create_app();

    let response = app.clone().oneshot(start_request("table1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let start = body_json(response).await;
    assert_eq!(start["session"], "table1");
    assert_eq!(start["stage"], "Werewolves' turn");
    assert_eq!(start["round"], 1);

    // find the werewolf from the status snapshot
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/game/table1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status = body_json(response).await;
    let players = status["players"].as_array().unwrap();
    let wolf = players
        .iter()
        .find(|p| p["role"] == "SimpleWerewolf")
        .unwrap()["name"]
        .as_str()
        .unwrap()
        .to_string();
    let victim = players
        .iter()
        .find(|p| p["role"] == "SimpleVillager")
        .unwrap()["name"]
        .as_str()
        .unwrap()
        .to_string();

    // the werewolf devours; dawn breaks and the village vote opens
    let response = app
        .clone()
        .oneshot(action_request("table1", &wolf, "vote", Some(&victim)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = body_json(response).await;
    assert_eq!(outcome["stage"], "Village's turn");
}

#[tokio::test]
async fn test_starting_the_same_session_twice_conflicts() {
    setup_test_env();
    let app = app::create_app();

    let response = app.clone().oneshot(start_request("table2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(start_request("table2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_quit_ends_the_game() {
    setup_test_env();
    let app = app::create_app();

    let response = app.clone().oneshot(start_request("table3")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let quit = Request::builder()
        .method("POST")
        .uri("/api/game/table3/quit")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(quit).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // further actions are refused: the game is over
    let response = app
        .clone()
        .oneshot(action_request("table3", "ann", "vote", Some("bob")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // but a finished session id may be reused for a fresh game
    let response = app.clone().oneshot(start_request("table3")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_actions_do_not_change_the_game() {
    setup_test_env();
    let app = app::create_app();

    let response = app.clone().oneshot(start_request("table4")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let before = body_json(
        app.clone()
            .oneshot(
                Request::builder()
                    .uri("/api/game/table4")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap(),
    )
    .await;

    // a villager cannot act during the werewolves' turn
    let villager = before["players"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["role"] == "SimpleVillager")
        .unwrap()["name"]
        .as_str()
        .unwrap()
        .to_string();
    let response = app
        .clone()
        .oneshot(action_request("table4", &villager, "vote", Some("ann")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let after = body_json(
        app.clone()
            .oneshot(
                Request::builder()
                    .uri("/api/game/table4")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(before, after);
}
