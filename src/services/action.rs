use log::debug;
use serde::{Deserialize, Serialize};

use crate::models::game::{Event, Game, Stage};
use crate::models::role::{Allegiance, RoleId};
use crate::services::resolve;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Vote,
    Protect,
    See,
    Choose,
    Heal,
    Poison,
    Pass,
    Reveal,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Action {
    pub actor: String,
    pub verb: Verb,
    pub target: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("no game is running")]
    NoGameRunning,
    #[error("the game is already over")]
    GameIsOver,
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("unknown player: {0}")]
    UnknownPlayer(String),
    #[error("this action requires a target")]
    MissingTarget,
    #[error("you have already acted this stage")]
    AlreadyActed,
    #[error("{0} is dead")]
    TargetDead(String),
    #[error("you cannot target yourself")]
    CannotTargetSelf,
    #[error("you cannot protect the same player as last round")]
    CannotTargetSameAsLastRound,
    #[error("you cannot target a member of your own allegiance")]
    CannotTargetSameAllegiance,
}

const SIDE_WEREWOLVES: &str = "werewolves";
const SIDE_VILLAGERS: &str = "villagers";

/// Validate and fold one player action into the running game. On error the
/// game is left untouched; on success the returned events cover everything
/// the action triggered, including stage resolution when it closed the
/// window.
pub fn apply(game: &mut Game, action: &Action) -> Result<Vec<Event>, ActionError> {
    validate(game, action)?;
    let mark = game.events.len();
    record(game, action);
    if window_closed(game) {
        resolve::close_stage(game);
    }
    Ok(game.events_since(mark).to_vec())
}

/// All checks run before any mutation, first violation wins: actor, turn
/// ownership, repeat action, then target legality.
fn validate(game: &Game, action: &Action) -> Result<(), ActionError> {
    if game.stage == Stage::GameOver {
        return Err(ActionError::GameIsOver);
    }
    let actor = game
        .player(&action.actor)
        .ok_or_else(|| ActionError::UnknownPlayer(action.actor.clone()))?;
    if !actor.alive {
        return Err(ActionError::NotYourTurn);
    }

    if game.turn.awaiting_servant {
        // Only the Devoted Servant's decision is accepted here.
        if actor.role != RoleId::DevotedServant
            || !matches!(action.verb, Verb::Reveal | Verb::Pass)
        {
            return Err(ActionError::NotYourTurn);
        }
        return Ok(());
    }

    match game.stage {
        Stage::WolfHoundsTurn => {
            owns_first_night_turn(game, actor.name.as_str(), RoleId::WolfHound)?;
            already_acted(game, &action.actor)?;
            match action.verb {
                Verb::Pass => Ok(()),
                Verb::Choose => {
                    let side = required_target(action)?;
                    if side.eq_ignore_ascii_case(SIDE_WEREWOLVES)
                        || side.eq_ignore_ascii_case(SIDE_VILLAGERS)
                    {
                        Ok(())
                    } else {
                        Err(ActionError::UnknownPlayer(side.to_string()))
                    }
                }
                _ => Err(ActionError::NotYourTurn),
            }
        }
        Stage::WildChildsTurn => {
            owns_first_night_turn(game, actor.name.as_str(), RoleId::WildChild)?;
            already_acted(game, &action.actor)?;
            match action.verb {
                Verb::Pass => Ok(()),
                Verb::Choose => {
                    let target = living_target(game, action)?;
                    if target == action.actor {
                        return Err(ActionError::CannotTargetSelf);
                    }
                    Ok(())
                }
                _ => Err(ActionError::NotYourTurn),
            }
        }
        Stage::SeersTurn => {
            owns_turn(actor.role, RoleId::Seer)?;
            already_acted(game, &action.actor)?;
            match action.verb {
                Verb::Pass => Ok(()),
                Verb::See => {
                    let target = living_target(game, action)?;
                    if target == action.actor {
                        return Err(ActionError::CannotTargetSelf);
                    }
                    Ok(())
                }
                _ => Err(ActionError::NotYourTurn),
            }
        }
        Stage::DefendersTurn => {
            owns_turn(actor.role, RoleId::Defender)?;
            already_acted(game, &action.actor)?;
            match action.verb {
                Verb::Pass => Ok(()),
                Verb::Protect => {
                    let target = living_target(game, action)?;
                    if actor.last_protected.as_deref() == Some(target) {
                        return Err(ActionError::CannotTargetSameAsLastRound);
                    }
                    Ok(())
                }
                _ => Err(ActionError::NotYourTurn),
            }
        }
        Stage::WerewolvesTurn => {
            if actor.allegiance != Allegiance::Werewolves {
                return Err(ActionError::NotYourTurn);
            }
            already_acted(game, &action.actor)?;
            match action.verb {
                Verb::Pass => Ok(()),
                Verb::Vote => {
                    let target = living_target(game, action)?;
                    let same_side = game
                        .player(target)
                        .map(|p| p.allegiance == Allegiance::Werewolves)
                        .unwrap_or(false);
                    if same_side {
                        return Err(ActionError::CannotTargetSameAllegiance);
                    }
                    Ok(())
                }
                _ => Err(ActionError::NotYourTurn),
            }
        }
        Stage::WitchsTurn => {
            owns_turn(actor.role, RoleId::Witch)?;
            if game.turn.acted.contains(&action.actor) {
                return Err(ActionError::AlreadyActed);
            }
            match action.verb {
                Verb::Pass => Ok(()),
                Verb::Heal => {
                    if !actor.heal_available {
                        return Err(ActionError::AlreadyActed);
                    }
                    Ok(())
                }
                Verb::Poison => {
                    if !actor.poison_available {
                        return Err(ActionError::AlreadyActed);
                    }
                    let target = living_target(game, action)?;
                    if target == action.actor {
                        return Err(ActionError::CannotTargetSelf);
                    }
                    Ok(())
                }
                _ => Err(ActionError::NotYourTurn),
            }
        }
        Stage::VillagesTurn => {
            let eligible = game.day_voters().iter().any(|p| p.name == action.actor);
            if !eligible {
                return Err(ActionError::NotYourTurn);
            }
            already_acted(game, &action.actor)?;
            match action.verb {
                Verb::Pass => Ok(()),
                Verb::Vote => {
                    living_target(game, action)?;
                    Ok(())
                }
                _ => Err(ActionError::NotYourTurn),
            }
        }
        Stage::ScapegoatsTurn => {
            owns_turn(actor.role, RoleId::Scapegoat)?;
            match action.verb {
                Verb::Pass => Ok(()),
                Verb::Choose => {
                    living_target(game, action)?;
                    Ok(())
                }
                _ => Err(ActionError::NotYourTurn),
            }
        }
        Stage::Sunset | Stage::Sunrise | Stage::GameOver => Err(ActionError::NotYourTurn),
    }
}

fn owns_turn(actual: RoleId, expected: RoleId) -> Result<(), ActionError> {
    if actual == expected {
        Ok(())
    } else {
        Err(ActionError::NotYourTurn)
    }
}

/// First-night stages are owned by the role holder whose opening turn is
/// still due — either round one, or a re-armed Devoted Servant assumption.
fn owns_first_night_turn(game: &Game, actor: &str, role: RoleId) -> Result<(), ActionError> {
    let due = game
        .players
        .iter()
        .any(|p| p.name == actor && p.role == role && (game.round == 1 || p.first_night_pending));
    if due {
        Ok(())
    } else {
        Err(ActionError::NotYourTurn)
    }
}

fn already_acted(game: &Game, actor: &str) -> Result<(), ActionError> {
    if game.turn.acted.iter().any(|n| n == actor) {
        Err(ActionError::AlreadyActed)
    } else {
        Ok(())
    }
}

fn required_target(action: &Action) -> Result<&str, ActionError> {
    action.target.as_deref().ok_or(ActionError::MissingTarget)
}

/// Target that must name a living player.
fn living_target<'a>(game: &Game, action: &'a Action) -> Result<&'a str, ActionError> {
    let target = required_target(action)?;
    let player = game
        .player(target)
        .ok_or_else(|| ActionError::UnknownPlayer(target.to_string()))?;
    if !player.alive {
        return Err(ActionError::TargetDead(target.to_string()));
    }
    Ok(target)
}

/// Fold a validated action into the turn record. Infallible; validation
/// has already established every precondition.
fn record(game: &mut Game, action: &Action) {
    debug!("{} {:?} {:?}", action.actor, action.verb, action.target);
    let actor = action.actor.clone();
    let target = action.target.clone().unwrap_or_default();

    if game.turn.awaiting_servant {
        game.turn.awaiting_servant = false;
        game.turn.servant_revealed = action.verb == Verb::Reveal;
        game.turn.acted.push(actor);
        return;
    }

    match (game.stage, action.verb) {
        (Stage::WolfHoundsTurn, verb) => {
            if verb == Verb::Choose && target.eq_ignore_ascii_case(SIDE_WEREWOLVES) {
                if let Some(player) = game.player_mut(&actor) {
                    player.allegiance = Allegiance::Werewolves;
                }
                game.push_event(Event::AllegianceChanged {
                    player: actor.clone(),
                    allegiance: Allegiance::Werewolves,
                });
            }
            clear_first_night(game, &actor);
            game.turn.acted.push(actor);
        }
        (Stage::WildChildsTurn, verb) => {
            if verb == Verb::Choose {
                if let Some(player) = game.player_mut(&actor) {
                    player.role_model = Some(target);
                }
            }
            clear_first_night(game, &actor);
            game.turn.acted.push(actor);
        }
        (Stage::SeersTurn, Verb::See) => {
            let role = game.player(&target).map(|p| p.role);
            if let Some(role) = role {
                game.push_event(Event::SeerResult {
                    seer: actor.clone(),
                    target,
                    role,
                });
            }
            game.turn.acted.push(actor);
        }
        (Stage::DefendersTurn, Verb::Protect) => {
            if let Some(player) = game.player_mut(&actor) {
                player.last_protected = Some(target.clone());
            }
            game.night.protected = Some(target);
            game.turn.acted.push(actor);
        }
        (Stage::DefendersTurn, Verb::Pass) => {
            // A skipped protection lifts the no-repeat restriction; it
            // only ever covers the immediately preceding round.
            if let Some(player) = game.player_mut(&actor) {
                player.last_protected = None;
            }
            game.turn.acted.push(actor);
        }
        (Stage::WerewolvesTurn, Verb::Vote) => {
            game.turn.votes.insert(actor.clone(), target.clone());
            game.push_event(Event::DevourVoteCast {
                voter: actor.clone(),
                target,
            });
            game.turn.acted.push(actor);
        }
        (Stage::WitchsTurn, Verb::Heal) => {
            if let Some(player) = game.player_mut(&actor) {
                player.heal_available = false;
            }
            game.night.healed = true;
        }
        (Stage::WitchsTurn, Verb::Poison) => {
            if let Some(player) = game.player_mut(&actor) {
                player.poison_available = false;
            }
            game.night.poison = Some(target);
        }
        (Stage::VillagesTurn, Verb::Vote) => {
            game.turn.votes.insert(actor.clone(), target.clone());
            game.push_event(Event::VoteCast {
                voter: actor.clone(),
                target,
            });
            game.turn.acted.push(actor);
        }
        (Stage::ScapegoatsTurn, Verb::Choose) => {
            if !game.turn.chosen_voters.contains(&target) {
                game.turn.chosen_voters.push(target);
            }
        }
        // A bare pass is terminal for every window.
        (_, Verb::Pass) => game.turn.acted.push(actor),
        _ => {}
    }
}

fn clear_first_night(game: &mut Game, actor: &str) {
    if let Some(player) = game.player_mut(actor) {
        player.first_night_pending = false;
    }
}

/// Whether every currently eligible actor has supplied a terminal action.
fn window_closed(game: &Game) -> bool {
    match game.stage {
        Stage::WitchsTurn => {
            let witch = game.alive_with_role(RoleId::Witch);
            let spent = witch
                .map(|p| !p.heal_available && !p.poison_available)
                .unwrap_or(true);
            spent || all_acted(game)
        }
        Stage::VillagesTurn => {
            // A tallied ballot still parked here was waiting only on
            // the Devoted Servant; their recorded decision is terminal.
            // Re-counting voters would be wrong: the Scapegoat's
            // restriction was already consumed at tally time.
            !game.turn.awaiting_servant && (game.turn.tallied || all_acted(game))
        }
        _ => all_acted(game),
    }
}

fn all_acted(game: &Game) -> bool {
    let eligible = eligible_actors(game);
    !eligible.is_empty() && eligible.iter().all(|name| game.turn.acted.contains(name))
}

pub(crate) fn eligible_actors(game: &Game) -> Vec<String> {
    match game.stage {
        Stage::WolfHoundsTurn | Stage::WildChildsTurn => {
            let role = match game.stage {
                Stage::WolfHoundsTurn => RoleId::WolfHound,
                _ => RoleId::WildChild,
            };
            game.players
                .iter()
                .filter(|p| {
                    p.alive && p.role == role && (game.round == 1 || p.first_night_pending)
                })
                .map(|p| p.name.clone())
                .collect()
        }
        Stage::SeersTurn => role_holders(game, RoleId::Seer),
        Stage::DefendersTurn => role_holders(game, RoleId::Defender),
        Stage::WitchsTurn => role_holders(game, RoleId::Witch),
        Stage::ScapegoatsTurn => role_holders(game, RoleId::Scapegoat),
        Stage::WerewolvesTurn => game.wolf_voters().iter().map(|p| p.name.clone()).collect(),
        Stage::VillagesTurn => {
            if game.turn.awaiting_servant {
                role_holders(game, RoleId::DevotedServant)
            } else {
                game.day_voters().iter().map(|p| p.name.clone()).collect()
            }
        }
        _ => Vec::new(),
    }
}

fn role_holders(game: &Game, role: RoleId) -> Vec<String> {
    game.players
        .iter()
        .filter(|p| p.alive && p.role == role)
        .map(|p| p.name.clone())
        .collect()
}
