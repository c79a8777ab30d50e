use crate::models::game::{Game, Stage};
use crate::models::role::RoleId;

const NIGHT_ORDER: [Stage; 6] = [
    Stage::WolfHoundsTurn,
    Stage::WildChildsTurn,
    Stage::SeersTurn,
    Stage::DefendersTurn,
    Stage::WerewolvesTurn,
    Stage::WitchsTurn,
];

/// Successor of `stage`. Reads the game immutably and consults only the
/// round number, role presence and the tie-routing flag, so identical
/// inputs always give the same answer.
pub fn next(stage: Stage, round: u32, game: &Game) -> Stage {
    match stage {
        Stage::Sunset => night_stage_after(None, round, game),
        Stage::WolfHoundsTurn
        | Stage::WildChildsTurn
        | Stage::SeersTurn
        | Stage::DefendersTurn
        | Stage::WerewolvesTurn
        | Stage::WitchsTurn => night_stage_after(Some(stage), round, game),
        Stage::Sunrise => Stage::VillagesTurn,
        Stage::VillagesTurn => {
            if game.scapegoat_dying && game.role_alive(RoleId::Scapegoat) {
                Stage::ScapegoatsTurn
            } else {
                Stage::Sunset
            }
        }
        Stage::ScapegoatsTurn => Stage::Sunset,
        Stage::GameOver => Stage::GameOver,
    }
}

/// First night stage after `current` (or the start of the night) whose
/// role is actually in play; `Sunrise` once the night order is exhausted.
fn night_stage_after(current: Option<Stage>, round: u32, game: &Game) -> Stage {
    let start = match current {
        Some(stage) => NIGHT_ORDER
            .iter()
            .position(|s| *s == stage)
            .map(|i| i + 1)
            .unwrap_or(NIGHT_ORDER.len()),
        None => 0,
    };
    NIGHT_ORDER[start..]
        .iter()
        .copied()
        .find(|stage| opens(*stage, round, game))
        .unwrap_or(Stage::Sunrise)
}

fn opens(stage: Stage, round: u32, game: &Game) -> bool {
    match stage {
        // First-night-only turns; re-armed for a player who assumed the
        // role mid-game through the Devoted Servant.
        Stage::WolfHoundsTurn | Stage::WildChildsTurn => {
            let role = match stage {
                Stage::WolfHoundsTurn => RoleId::WolfHound,
                _ => RoleId::WildChild,
            };
            game.players
                .iter()
                .any(|p| p.alive && p.role == role && (round == 1 || p.first_night_pending))
        }
        Stage::SeersTurn => game.role_alive(RoleId::Seer),
        Stage::DefendersTurn => game.role_alive(RoleId::Defender),
        Stage::WerewolvesTurn => true,
        Stage::WitchsTurn => game.role_alive(RoleId::Witch),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::player::Player;
    use crate::models::role::RoleId;

    fn game_of(roles: &[RoleId]) -> Game {
        let players = roles
            .iter()
            .enumerate()
            .map(|(i, role)| Player::new(format!("p{}", i), *role))
            .collect();
        Game::new(players, Stage::Sunset)
    }

    #[test]
    fn absent_roles_are_skipped_without_a_window() {
        let game = game_of(&[
            RoleId::SimpleWerewolf,
            RoleId::SimpleVillager,
            RoleId::SimpleVillager,
            RoleId::SimpleVillager,
        ]);
        assert_eq!(next(Stage::Sunset, 1, &game), Stage::WerewolvesTurn);
        assert_eq!(next(Stage::WerewolvesTurn, 1, &game), Stage::Sunrise);
    }

    #[test]
    fn first_night_roles_only_act_in_round_one() {
        let game = game_of(&[
            RoleId::WolfHound,
            RoleId::WildChild,
            RoleId::Seer,
            RoleId::SimpleWerewolf,
        ]);
        assert_eq!(next(Stage::Sunset, 1, &game), Stage::WolfHoundsTurn);
        assert_eq!(next(Stage::WolfHoundsTurn, 1, &game), Stage::WildChildsTurn);
        assert_eq!(next(Stage::Sunset, 2, &game), Stage::SeersTurn);
    }

    #[test]
    fn first_night_replay_reopens_the_turn_in_later_rounds() {
        let mut game = game_of(&[
            RoleId::WolfHound,
            RoleId::SimpleVillager,
            RoleId::SimpleWerewolf,
            RoleId::SimpleVillager,
        ]);
        assert_eq!(next(Stage::Sunset, 3, &game), Stage::WerewolvesTurn);
        game.players[0].first_night_pending = true;
        assert_eq!(next(Stage::Sunset, 3, &game), Stage::WolfHoundsTurn);
    }

    #[test]
    fn dead_roles_do_not_open_their_stage() {
        let mut game = game_of(&[
            RoleId::Seer,
            RoleId::Witch,
            RoleId::SimpleWerewolf,
            RoleId::SimpleVillager,
        ]);
        assert_eq!(next(Stage::WerewolvesTurn, 2, &game), Stage::WitchsTurn);
        game.players[1].alive = false;
        assert_eq!(next(Stage::WerewolvesTurn, 2, &game), Stage::Sunrise);
    }

    #[test]
    fn a_tied_lynch_routes_to_the_scapegoat() {
        let mut game = game_of(&[
            RoleId::Scapegoat,
            RoleId::SimpleVillager,
            RoleId::SimpleWerewolf,
            RoleId::SimpleVillager,
        ]);
        assert_eq!(next(Stage::VillagesTurn, 2, &game), Stage::Sunset);
        game.scapegoat_dying = true;
        assert_eq!(next(Stage::VillagesTurn, 2, &game), Stage::ScapegoatsTurn);
    }

    #[test]
    fn game_over_is_absorbing() {
        let game = game_of(&[
            RoleId::SimpleWerewolf,
            RoleId::SimpleVillager,
            RoleId::SimpleVillager,
            RoleId::SimpleVillager,
        ]);
        assert_eq!(next(Stage::GameOver, 5, &game), Stage::GameOver);
    }
}
