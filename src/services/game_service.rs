use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use uuid::Uuid;

use crate::models::game::{Event, Game, GameResult, Stage};
use crate::services::action::{self, Action, ActionError};
use crate::services::messages::{self, OutboundMessage};
use crate::services::resolve;
use crate::services::setup::{self, RoleSelection, SetupError};
use crate::state::AppState;

/// What a successful command hands back to the transport layer.
#[derive(Clone, Debug, Serialize)]
pub struct CommandOutcome {
    pub stage: Stage,
    pub round: u32,
    pub messages: Vec<OutboundMessage>,
}

fn outcome(game: &Game, messages: Vec<OutboundMessage>) -> CommandOutcome {
    CommandOutcome {
        stage: game.stage,
        round: game.round,
        messages,
    }
}

/// Set up a new game under `session` (random id when not given). Fails
/// with `GameAlreadyRunning` when the session already holds an unfinished
/// game.
pub async fn start_session(
    state: AppState,
    session: Option<String>,
    names: Vec<String>,
    selection: RoleSelection,
    seed: Option<u64>,
) -> Result<(String, CommandOutcome), SetupError> {
    let id = session.unwrap_or_else(|| Uuid::new_v4().to_string());
    let mut games = state.games.lock().await;
    if let Some(existing) = games.get(&id) {
        if existing.stage != Stage::GameOver {
            return Err(SetupError::GameAlreadyRunning);
        }
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut game = setup::new_game(&names, selection, &mut rng)?;
    resolve::open(&mut game);

    let msgs = messages::render(&game, game.events_since(0));
    info!("session {} started: {}", id, game);
    let out = outcome(&game, msgs);
    games.insert(id.clone(), game);
    Ok((id, out))
}

/// Run one player action against a session. The stored snapshot is only
/// replaced when the whole command succeeds, so a failed action leaves the
/// game exactly as it was.
pub async fn submit_action(
    state: AppState,
    session: &str,
    action: Action,
) -> Result<CommandOutcome, ActionError> {
    let mut games = state.games.lock().await;
    let snapshot = games.get(session).ok_or(ActionError::NoGameRunning)?;

    let mut game = snapshot.clone();
    let events = action::apply(&mut game, &action)?;
    let msgs = messages::render(&game, &events);
    let out = outcome(&game, msgs);
    games.insert(session.to_string(), game);
    Ok(out)
}

pub async fn game_status(state: AppState, session: &str) -> Result<Game, ActionError> {
    let games = state.games.lock().await;
    games
        .get(session)
        .cloned()
        .ok_or(ActionError::NoGameRunning)
}

/// Abandon a running game: it ends immediately with no winner. The
/// snapshot stays stored for inspection, like any finished game.
pub async fn quit_session(
    state: AppState,
    session: &str,
) -> Result<CommandOutcome, ActionError> {
    let mut games = state.games.lock().await;
    let snapshot = games.get(session).ok_or(ActionError::NoGameRunning)?;
    if snapshot.stage == Stage::GameOver {
        return Err(ActionError::GameIsOver);
    }

    let mut game = snapshot.clone();
    game.stage = Stage::GameOver;
    game.result = GameResult::NoWinner;
    game.push_event(Event::GameEnded(None));
    let mark = game.events.len() - 1;
    let msgs = messages::render(&game, game.events_since(mark));
    info!("session {} abandoned", session);
    let out = outcome(&game, msgs);
    games.insert(session.to_string(), game);
    Ok(out)
}
