use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::player::Player;
use super::role::{Allegiance, RoleId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Sunset,
    WolfHoundsTurn,
    WildChildsTurn,
    SeersTurn,
    DefendersTurn,
    WerewolvesTurn,
    WitchsTurn,
    Sunrise,
    VillagesTurn,
    ScapegoatsTurn,
    GameOver,
}

impl Stage {
    /// The single role that owns this action window, if any. `WerewolvesTurn`
    /// and `VillagesTurn` are multi-actor windows and return `None`.
    pub fn acting_role(self) -> Option<RoleId> {
        match self {
            Stage::WolfHoundsTurn => Some(RoleId::WolfHound),
            Stage::WildChildsTurn => Some(RoleId::WildChild),
            Stage::SeersTurn => Some(RoleId::Seer),
            Stage::DefendersTurn => Some(RoleId::Defender),
            Stage::WitchsTurn => Some(RoleId::Witch),
            Stage::ScapegoatsTurn => Some(RoleId::Scapegoat),
            _ => None,
        }
    }

    /// Announcement stages carry no action window and auto-advance.
    pub fn is_announcement(self) -> bool {
        matches!(self, Stage::Sunset | Stage::Sunrise)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Sunset => "Sunset",
            Stage::WolfHoundsTurn => "Wolf-hound's turn",
            Stage::WildChildsTurn => "Wild-child's turn",
            Stage::SeersTurn => "Seer's turn",
            Stage::DefendersTurn => "Defender's turn",
            Stage::WerewolvesTurn => "Werewolves' turn",
            Stage::WitchsTurn => "Witch's turn",
            Stage::Sunrise => "Sunrise",
            Stage::VillagesTurn => "Village's turn",
            Stage::ScapegoatsTurn => "Scapegoat's turn",
            Stage::GameOver => "Game over",
        };
        write!(f, "{}", label)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    StageBegan(Stage),
    VoteCast { voter: String, target: String },
    /// A devour vote; addressed to the werewolves only.
    DevourVoteCast { voter: String, target: String },
    /// The Devoted Servant is offered the about-to-be-lynched player's role.
    ServantChoice { servant: String, target: String },
    Devoured(String),
    Healed,
    Poisoned(String),
    Protected(String),
    Lynched(String),
    NoLynch,
    NoDevour,
    JesterRevealed(String),
    SeerResult { seer: String, target: String, role: RoleId },
    RoleAssumed { player: String, role: RoleId },
    AllegianceChanged { player: String, allegiance: Allegiance },
    GameEnded(Option<Allegiance>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    InProgress,
    Won(Allegiance),
    NoWinner,
}

/// Stage-scoped scratch, cleared whenever a new stage is entered.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Actors that have supplied their terminal action this stage.
    pub acted: Vec<String>,
    pub votes: HashMap<String, String>,
    /// Set once the lynch ballot has been counted, so a re-entry after the
    /// Devoted Servant's decision does not tally twice.
    pub tallied: bool,
    /// Lynch nominee awaiting a possible Devoted Servant interception.
    pub pending_lynch: Option<String>,
    pub awaiting_servant: bool,
    pub servant_revealed: bool,
    /// Voter set being assembled during the Scapegoat's turn.
    pub chosen_voters: Vec<String>,
}

/// Night-scoped scratch, cleared at Sunset. Survives the intermediate
/// stage changes between the Defender's turn and dawn.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NightRecord {
    pub protected: Option<String>,
    pub devour: Option<String>,
    pub healed: bool,
    pub poison: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub stage: Stage,
    pub round: u32,
    pub players: Vec<Player>,
    pub turn: TurnRecord,
    pub night: NightRecord,
    /// Voter restriction chosen by the Scapegoat, consumed by the next
    /// Village's turn.
    pub allowed_voters: Option<Vec<String>>,
    /// Set while a tie-lynched Scapegoat still has their final act to take.
    pub scapegoat_dying: bool,
    /// True once the first night has fallen; drives the round counter.
    pub past_first_night: bool,
    pub result: GameResult,
    pub events: Vec<Event>,
}

impl Game {
    pub fn new(players: Vec<Player>, stage: Stage) -> Self {
        Game {
            stage,
            round: 1,
            players,
            turn: TurnRecord::default(),
            night: NightRecord::default(),
            allowed_voters: None,
            scapegoat_dying: false,
            past_first_night: false,
            result: GameResult::InProgress,
            events: Vec::new(),
        }
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn player_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.name == name)
    }

    pub fn alive_with_role(&self, role: RoleId) -> Option<&Player> {
        self.players.iter().find(|p| p.alive && p.role == role)
    }

    pub fn role_alive(&self, role: RoleId) -> bool {
        self.alive_with_role(role).is_some()
    }

    /// Alive players voting at the Werewolves' turn: selection is by current
    /// allegiance, so a converted Wild-child or Wolf-hound is included.
    pub fn wolf_voters(&self) -> Vec<&Player> {
        self.players
            .iter()
            .filter(|p| p.alive && p.allegiance == Allegiance::Werewolves)
            .collect()
    }

    /// Alive players eligible to vote at the Village's turn, under the
    /// current Scapegoat restriction if one is pending.
    pub fn day_voters(&self) -> Vec<&Player> {
        self.players
            .iter()
            .filter(|p| p.alive && p.can_vote)
            .filter(|p| match &self.allowed_voters {
                Some(list) => list.iter().any(|n| n == &p.name),
                None => true,
            })
            .collect()
    }

    pub fn push_event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Events appended since `mark`; used to report a command's outcome.
    pub fn events_since(&self, mark: usize) -> &[Event] {
        &self.events[mark..]
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alive = self.players.iter().filter(|p| p.alive).count();
        write!(
            f,
            "Game {{ stage: {}, round: {}, players: {} ({} alive), result: {:?} }}",
            self.stage,
            self.round,
            self.players.len(),
            alive,
            self.result
        )
    }
}

/// Outcome of a plurality tally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tally {
    Empty,
    Winner(String),
    Tie,
}

/// Plurality over the recorded votes. A shared maximum is a `Tie`.
pub fn tally_votes(votes: &HashMap<String, String>) -> Tally {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for target in votes.values() {
        *counts.entry(target.as_str()).or_insert(0) += 1;
    }
    let Some(max) = counts.values().copied().max() else {
        return Tally::Empty;
    };
    let mut leaders = counts.into_iter().filter(|(_, c)| *c == max);
    let Some((leader, _)) = leaders.next() else {
        return Tally::Empty;
    };
    if leaders.next().is_some() {
        Tally::Tie
    } else {
        Tally::Winner(leader.to_string())
    }
}
