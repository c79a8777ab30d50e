use serde::{Deserialize, Serialize};

use super::role::{Allegiance, RoleId};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    /// Current role; may diverge from the dealt card after a Devoted
    /// Servant swap.
    pub role: RoleId,
    /// Current allegiance; only changed by explicit transformation events,
    /// never recomputed from the catalog default.
    pub allegiance: Allegiance,
    pub alive: bool,
    pub can_vote: bool,
    // One-shot ability scratch. Meaningful only for the matching role.
    pub heal_available: bool,
    pub poison_available: bool,
    pub last_protected: Option<String>,
    pub role_model: Option<String>,
    pub jester_revealed: bool,
    /// Set when this player must still take a first-night-only turn,
    /// e.g. after assuming the Wolf-hound mid-game.
    pub first_night_pending: bool,
}

impl Player {
    pub fn new(name: String, role: RoleId) -> Self {
        Player {
            name,
            role,
            allegiance: role.allegiance(),
            alive: true,
            can_vote: true,
            heal_available: role == RoleId::Witch,
            poison_available: role == RoleId::Witch,
            last_protected: None,
            role_model: None,
            jester_revealed: false,
            first_night_pending: false,
        }
    }

    /// Take over `role` with fresh one-shot flags, as the Devoted Servant
    /// does when intercepting a lynch. First-night-only turns are re-armed
    /// so the assumed role replays its opening choice.
    pub fn assume_role(&mut self, role: RoleId) {
        self.role = role;
        self.allegiance = role.allegiance();
        self.heal_available = role == RoleId::Witch;
        self.poison_available = role == RoleId::Witch;
        self.last_protected = None;
        self.role_model = None;
        self.jester_revealed = false;
        self.first_night_pending = role.first_night_only();
    }
}
