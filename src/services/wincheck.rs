use log::info;

use crate::models::game::{Event, Game, GameResult, Stage};
use crate::models::role::Allegiance;

/// Win evaluation, run after every applied elimination. Allegiance checks
/// use each player's current allegiance, never the catalog default.
pub fn after_elimination(game: &mut Game, victim: &str) {
    if game.result != GameResult::InProgress {
        return;
    }

    // A first-round Angel death is a solo win for the Angel.
    let angel_died = game
        .player(victim)
        .map(|p| p.allegiance == Allegiance::Angel)
        .unwrap_or(false);
    if angel_died && game.round == 1 {
        finish(game, Some(Allegiance::Angel));
        return;
    }

    let mut living: Vec<Allegiance> = Vec::new();
    for player in game.players.iter().filter(|p| p.alive) {
        if !living.contains(&player.allegiance) {
            living.push(player.allegiance);
        }
    }
    match living.as_slice() {
        [] => finish(game, None),
        [sole] => finish(game, Some(*sole)),
        _ => {}
    }
}

fn finish(game: &mut Game, winner: Option<Allegiance>) {
    info!("game over, winner: {:?}", winner);
    game.result = match winner {
        Some(allegiance) => GameResult::Won(allegiance),
        None => GameResult::NoWinner,
    };
    game.stage = Stage::GameOver;
    game.push_event(Event::GameEnded(winner));
}
