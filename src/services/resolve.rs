use log::debug;

use crate::models::game::{tally_votes, Event, Game, NightRecord, Stage, Tally, TurnRecord};
use crate::models::role::{Allegiance, RoleId};
use crate::services::{action, scheduler, wincheck};

/// Run the opening stage's entry effects on a freshly set up game and move
/// it to its first action window.
pub fn open(game: &mut Game) {
    match game.stage {
        Stage::Sunset => {
            enter(game, Stage::Sunset);
            advance(game);
        }
        // An Angel game opens with a day vote before any night.
        Stage::VillagesTurn => {
            game.turn = TurnRecord::default();
            game.push_event(Event::StageBegan(Stage::VillagesTurn));
        }
        _ => {}
    }
}

/// Stage resolution, called once the current action window has closed.
/// Consumes the turn-scoped record, applies durable effects and advances
/// to the next action window (or GameOver).
pub fn close_stage(game: &mut Game) {
    match game.stage {
        Stage::WerewolvesTurn => {
            game.night.devour = match tally_votes(&game.turn.votes) {
                Tally::Winner(target) => Some(target),
                // A tied devour vote means no devour this round.
                Tally::Tie | Tally::Empty => None,
            };
            advance(game);
        }
        Stage::VillagesTurn => close_villages(game),
        Stage::ScapegoatsTurn => close_scapegoats(game),
        // The remaining windows fold their effect at action time.
        _ => advance(game),
    }
}

fn close_villages(game: &mut Game) {
    if !game.turn.tallied {
        game.turn.tallied = true;
        // The Scapegoat's restriction only covers this one vote.
        game.allowed_voters = None;
        match tally_votes(&game.turn.votes) {
            Tally::Winner(target) => {
                game.turn.pending_lynch = Some(target.clone());
                let servant = game
                    .players
                    .iter()
                    .find(|p| p.alive && p.role == RoleId::DevotedServant && p.name != target);
                if let Some(servant) = servant {
                    // Hold the elimination open for the Servant's decision.
                    game.turn.awaiting_servant = true;
                    let event = Event::ServantChoice {
                        servant: servant.name.clone(),
                        target,
                    };
                    game.push_event(event);
                }
            }
            Tally::Tie => {
                if let Some(scapegoat) = game.alive_with_role(RoleId::Scapegoat) {
                    let name = scapegoat.name.clone();
                    // Death is deferred until after the Scapegoat's final act.
                    game.scapegoat_dying = true;
                    game.push_event(Event::Lynched(name));
                } else {
                    game.push_event(Event::NoLynch);
                }
            }
            Tally::Empty => game.push_event(Event::NoLynch),
        }
    }
    if game.turn.awaiting_servant {
        return;
    }
    if let Some(target) = game.turn.pending_lynch.take() {
        if game.turn.servant_revealed {
            servant_swap(game, &target);
        }
        apply_lynch(game, &target);
    }
    advance(game);
}

fn close_scapegoats(game: &mut Game) {
    game.allowed_voters = if game.turn.chosen_voters.is_empty() {
        None
    } else {
        Some(game.turn.chosen_voters.clone())
    };
    if game.scapegoat_dying {
        game.scapegoat_dying = false;
        let name = game
            .alive_with_role(RoleId::Scapegoat)
            .map(|p| p.name.clone());
        if let Some(name) = name {
            // The Lynched event went out when the tie was counted.
            kill(game, &name, None);
        }
    }
    advance(game);
}

fn apply_lynch(game: &mut Game, target: &str) {
    let jester_shielded = game
        .player(target)
        .map(|p| p.role == RoleId::Jester && !p.jester_revealed)
        .unwrap_or(false);
    if jester_shielded {
        if let Some(player) = game.player_mut(target) {
            player.jester_revealed = true;
            player.can_vote = false;
        }
        game.push_event(Event::JesterRevealed(target.to_string()));
        return;
    }
    kill(game, target, Some(Event::Lynched(target.to_string())));
}

/// The Devoted Servant takes the lynchee's current role with fresh
/// one-shot flags; the lynchee goes on to die as the Servant.
fn servant_swap(game: &mut Game, target: &str) {
    let servant_idx = game
        .players
        .iter()
        .position(|p| p.alive && p.role == RoleId::DevotedServant);
    let target_idx = game.players.iter().position(|p| p.name == target);
    let (Some(servant_idx), Some(target_idx)) = (servant_idx, target_idx) else {
        return;
    };
    let assumed = game.players[target_idx].role;
    game.players[target_idx].role = RoleId::DevotedServant;
    let before = game.players[servant_idx].allegiance;
    game.players[servant_idx].assume_role(assumed);
    let servant_name = game.players[servant_idx].name.clone();
    let after = game.players[servant_idx].allegiance;
    game.push_event(Event::RoleAssumed {
        player: servant_name.clone(),
        role: assumed,
    });
    if after != before {
        game.push_event(Event::AllegianceChanged {
            player: servant_name,
            allegiance: after,
        });
    }
}

/// Apply one elimination: flip the alive flag, emit `event` if given, run
/// the Wild-child watch and then the win evaluator.
pub fn kill(game: &mut Game, name: &str, event: Option<Event>) {
    match game.player_mut(name) {
        Some(player) if player.alive => player.alive = false,
        _ => return,
    }
    if let Some(event) = event {
        game.push_event(event);
    }
    wild_child_watch(game, name);
    wincheck::after_elimination(game, name);
}

/// If the dead player was a Wild-child's role model, the Wild-child joins
/// the Werewolves before the win evaluator runs.
fn wild_child_watch(game: &mut Game, dead: &str) {
    let converts: Vec<String> = game
        .players
        .iter()
        .filter(|p| {
            p.alive
                && p.role == RoleId::WildChild
                && p.role_model.as_deref() == Some(dead)
                && p.allegiance != Allegiance::Werewolves
        })
        .map(|p| p.name.clone())
        .collect();
    for name in converts {
        if let Some(player) = game.player_mut(&name) {
            player.allegiance = Allegiance::Werewolves;
        }
        game.push_event(Event::AllegianceChanged {
            player: name,
            allegiance: Allegiance::Werewolves,
        });
    }
}

/// Advance through announcement stages until an action window opens or the
/// game ends. Entry into Sunrise applies the night's pending eliminations.
pub fn advance(game: &mut Game) {
    while game.stage != Stage::GameOver {
        let next = scheduler::next(game.stage, game.round, game);
        enter(game, next);
        match game.stage {
            Stage::Sunset | Stage::Sunrise => continue,
            Stage::GameOver => return,
            _ => {
                // A window nobody can act in would never close; resolve
                // it as if every actor had passed. The Werewolves' turn
                // is mandatory even when no werewolf is left alive.
                if action::eligible_actors(game).is_empty() {
                    close_stage(game);
                }
                return;
            }
        }
    }
}

fn enter(game: &mut Game, stage: Stage) {
    debug!("entering stage {} (round {})", stage, game.round);
    game.turn = TurnRecord::default();
    game.stage = stage;
    match stage {
        Stage::Sunset => {
            game.night = NightRecord::default();
            if game.past_first_night {
                game.round += 1;
            } else {
                game.past_first_night = true;
            }
            game.push_event(Event::StageBegan(Stage::Sunset));
            angel_conversion(game);
        }
        Stage::Sunrise => {
            game.push_event(Event::StageBegan(Stage::Sunrise));
            apply_night(game);
        }
        Stage::GameOver => {}
        Stage::VillagesTurn => {
            // A voter restriction whose members all died overnight would
            // leave nobody able to close the window; drop it.
            if game.day_voters().is_empty() {
                game.allowed_voters = None;
            }
            game.push_event(Event::StageBegan(Stage::VillagesTurn));
        }
        other => game.push_event(Event::StageBegan(other)),
    }
}

/// From round 2 on, a surviving Angel permanently joins the Villagers.
fn angel_conversion(game: &mut Game) {
    if game.round < 2 {
        return;
    }
    let angel = game
        .players
        .iter()
        .find(|p| p.alive && p.allegiance == Allegiance::Angel)
        .map(|p| p.name.clone());
    if let Some(name) = angel {
        if let Some(player) = game.player_mut(&name) {
            player.allegiance = Allegiance::Villagers;
        }
        game.push_event(Event::AllegianceChanged {
            player: name,
            allegiance: Allegiance::Villagers,
        });
    }
}

/// End-of-night application: the devour unless healed or protected, then
/// the poison. The win evaluator runs after each elimination.
fn apply_night(game: &mut Game) {
    let night = game.night.clone();
    match night.devour {
        Some(target) => {
            if night.healed {
                game.push_event(Event::Healed);
            } else if night.protected.as_deref() == Some(target.as_str()) {
                game.push_event(Event::Protected(target));
            } else {
                kill(game, &target, Some(Event::Devoured(target.clone())));
            }
        }
        None => game.push_event(Event::NoDevour),
    }
    if game.stage == Stage::GameOver {
        return;
    }
    if let Some(target) = night.poison {
        if game.player(&target).map(|p| p.alive).unwrap_or(false) {
            kill(game, &target, Some(Event::Poisoned(target.clone())));
        }
    }
}
