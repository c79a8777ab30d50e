use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use crate::models::game::Game;

/// Shared application state. Each session maps to one whole-game snapshot;
/// the map mutex serializes all commands touching the same game, so stage
/// resolution sees actions in arrival order.
#[derive(Clone, Default)]
pub struct AppState {
    pub games: Arc<Mutex<HashMap<String, Game>>>,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            games: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}
