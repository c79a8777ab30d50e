use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::game::{Game, Stage};
use crate::models::player::Player;
use crate::models::role::{restricted_roles, Allegiance, RoleId};
use crate::utils::config::CONFIG;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleSelection {
    /// Baseline roles only.
    None,
    /// A random, roughly balanced draw from the restricted-role pool.
    Random,
    /// Explicitly requested roles, resolved by name.
    Use(Vec<String>),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("a game is already running")]
    GameAlreadyRunning,
    #[error("unknown roles: {}", .0.join(", "))]
    RolesNotFound(Vec<String>),
    #[error("too few players: have {have}, need {need}")]
    TooFewPlayers { have: usize, need: usize },
}

/// Build a fresh game from a roster of distinct player names and an
/// extra-role selection mode. The caller supplies the random source so a
/// seeded run is fully reproducible.
pub fn new_game<R: Rng>(
    names: &[String],
    selection: RoleSelection,
    rng: &mut R,
) -> Result<Game, SetupError> {
    let n = names.len();
    let min = CONFIG.min_players;
    if n < min {
        return Err(SetupError::TooFewPlayers { have: n, need: min });
    }

    let extras = match selection {
        RoleSelection::None => Vec::new(),
        RoleSelection::Random => draw_extras(n, rng),
        RoleSelection::Use(wanted) => resolve_roles(&wanted)?,
    };
    if extras.len() > n {
        return Err(SetupError::TooFewPlayers {
            have: n,
            need: extras.len(),
        });
    }

    // Fill the remaining seats with baselines: one werewolf seat per four
    // players, counting werewolf-allegiance extras toward the quota.
    let mut roles = extras;
    let wolf_quota = (n / 4).max(1);
    let wolves_dealt = roles
        .iter()
        .filter(|r| r.allegiance() == Allegiance::Werewolves)
        .count();
    for _ in wolves_dealt..wolf_quota {
        if roles.len() < n {
            roles.push(RoleId::SimpleWerewolf);
        }
    }
    while roles.len() < n {
        roles.push(RoleId::SimpleVillager);
    }
    roles.shuffle(rng);

    let players: Vec<Player> = names
        .iter()
        .zip(roles.iter())
        .map(|(name, role)| Player::new(name.clone(), *role))
        .collect();

    // An Angel game opens with a day vote before the first night.
    let opening = if roles.contains(&RoleId::Angel) {
        Stage::VillagesTurn
    } else {
        Stage::Sunset
    };
    info!("new game with {} players, opening at {}", n, opening);
    Ok(Game::new(players, opening))
}

/// Draw `⌊n/5⌋+1 ..= ⌊n/5⌋+3` distinct restricted roles. Several candidate
/// draws are sampled and the one whose summed balance sits closest to zero
/// is kept, so the dealt set does not lopsidedly favor one side.
fn draw_extras<R: Rng>(n: usize, rng: &mut R) -> Vec<RoleId> {
    const FAIRNESS_DRAWS: usize = 8;

    let pool = restricted_roles();
    let count = (n / 5 + 1 + rng.gen_range(0..=2)).min(pool.len());

    let mut best: Vec<RoleId> = pool.choose_multiple(rng, count).copied().collect();
    let mut best_spread = balance_spread(&best);
    for _ in 1..FAIRNESS_DRAWS {
        let candidate: Vec<RoleId> = pool.choose_multiple(rng, count).copied().collect();
        let spread = balance_spread(&candidate);
        if spread < best_spread {
            best = candidate;
            best_spread = spread;
        }
    }
    best
}

fn balance_spread(roles: &[RoleId]) -> i32 {
    roles.iter().map(|r| r.balance()).sum::<i32>().abs()
}

/// Resolve requested role names against the catalog. Unknown names are
/// collected and reported together so the whole list can be corrected in
/// one pass.
fn resolve_roles(wanted: &[String]) -> Result<Vec<RoleId>, SetupError> {
    let mut roles = Vec::with_capacity(wanted.len());
    let mut missing = Vec::new();
    for name in wanted {
        match RoleId::lookup(name) {
            Some(role) => roles.push(role),
            None => missing.push(name.clone()),
        }
    }
    if missing.is_empty() {
        Ok(roles)
    } else {
        Err(SetupError::RolesNotFound(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("player{}", i)).collect()
    }

    #[test]
    fn baseline_game_deals_one_role_per_player() {
        let mut rng = StdRng::seed_from_u64(7);
        let game = new_game(&names(8), RoleSelection::None, &mut rng).unwrap();
        assert_eq!(game.players.len(), 8);
        let wolves = game
            .players
            .iter()
            .filter(|p| p.role == RoleId::SimpleWerewolf)
            .count();
        assert_eq!(wolves, 2);
        assert_eq!(game.round, 1);
    }

    #[test]
    fn random_draw_stays_inside_the_count_bounds() {
        for n in 4..=20 {
            for seed in 0..10 {
                let mut rng = StdRng::seed_from_u64(seed);
                let drawn = draw_extras(n, &mut rng);
                let lo = n / 5 + 1;
                let hi = (n / 5 + 3).min(restricted_roles().len());
                assert!(drawn.len() >= lo.min(hi) && drawn.len() <= hi, "n={}", n);
                // all distinct, all restricted
                for (i, role) in drawn.iter().enumerate() {
                    assert!(!role.is_baseline());
                    assert!(!drawn[i + 1..].contains(role));
                }
            }
        }
    }

    #[test]
    fn seeded_draws_are_reproducible() {
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        assert_eq!(draw_extras(10, &mut a), draw_extras(10, &mut b));
    }

    #[test]
    fn unknown_role_names_are_collected_not_fail_fast() {
        let mut rng = StdRng::seed_from_u64(1);
        let wanted = vec![
            "witch".to_string(),
            "Bard".to_string(),
            "seer".to_string(),
            "Minstrel".to_string(),
        ];
        let err = new_game(&names(6), RoleSelection::Use(wanted), &mut rng).unwrap_err();
        assert_eq!(
            err,
            SetupError::RolesNotFound(vec!["Bard".to_string(), "Minstrel".to_string()])
        );
    }

    #[test]
    fn more_extras_than_players_is_too_few_players() {
        let mut rng = StdRng::seed_from_u64(1);
        let wanted = vec![
            "Seer".to_string(),
            "Witch".to_string(),
            "Defender".to_string(),
            "Scapegoat".to_string(),
            "Jester".to_string(),
        ];
        let err = new_game(&names(4), RoleSelection::Use(wanted), &mut rng).unwrap_err();
        assert_eq!(err, SetupError::TooFewPlayers { have: 4, need: 5 });
    }

    #[test]
    fn an_angel_game_opens_with_the_day_vote() {
        let mut rng = StdRng::seed_from_u64(3);
        let game = new_game(
            &names(5),
            RoleSelection::Use(vec!["Angel".to_string()]),
            &mut rng,
        )
        .unwrap();
        assert_eq!(game.stage, Stage::VillagesTurn);

        let game = new_game(&names(5), RoleSelection::None, &mut rng).unwrap();
        assert_eq!(game.stage, Stage::Sunset);
    }

    #[test]
    fn too_few_players_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = new_game(&names(2), RoleSelection::None, &mut rng).unwrap_err();
        assert!(matches!(err, SetupError::TooFewPlayers { have: 2, .. }));
    }
}
