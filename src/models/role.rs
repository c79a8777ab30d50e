use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Allegiance {
    Villagers,
    Werewolves,
    Angel,
}

impl fmt::Display for Allegiance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Allegiance::Villagers => write!(f, "Villagers"),
            Allegiance::Werewolves => write!(f, "Werewolves"),
            Allegiance::Angel => write!(f, "Angel"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleId {
    SimpleVillager,
    SimpleWerewolf,
    Seer,
    Defender,
    Witch,
    Scapegoat,
    Jester,
    WolfHound,
    WildChild,
    Angel,
    DevotedServant,
}

pub const ALL_ROLES: [RoleId; 11] = [
    RoleId::SimpleVillager,
    RoleId::SimpleWerewolf,
    RoleId::Seer,
    RoleId::Defender,
    RoleId::Witch,
    RoleId::Scapegoat,
    RoleId::Jester,
    RoleId::WolfHound,
    RoleId::WildChild,
    RoleId::Angel,
    RoleId::DevotedServant,
];

impl RoleId {
    pub fn name(self) -> &'static str {
        match self {
            RoleId::SimpleVillager => "Simple Villager",
            RoleId::SimpleWerewolf => "Simple Werewolf",
            RoleId::Seer => "Seer",
            RoleId::Defender => "Defender",
            RoleId::Witch => "Witch",
            RoleId::Scapegoat => "Scapegoat",
            RoleId::Jester => "Jester",
            RoleId::WolfHound => "Wolf-hound",
            RoleId::WildChild => "Wild-child",
            RoleId::Angel => "Angel",
            RoleId::DevotedServant => "Devoted Servant",
        }
    }

    /// Default allegiance of the role card. A live player's allegiance may
    /// diverge from this after a transformation event.
    pub fn allegiance(self) -> Allegiance {
        match self {
            RoleId::SimpleWerewolf => Allegiance::Werewolves,
            RoleId::Angel => Allegiance::Angel,
            _ => Allegiance::Villagers,
        }
    }

    /// Fairness weight used by the setup draw. Positive favors the Villagers.
    pub fn balance(self) -> i32 {
        match self {
            RoleId::SimpleVillager => 1,
            RoleId::SimpleWerewolf => -4,
            RoleId::Seer => 3,
            RoleId::Defender => 2,
            RoleId::Witch => 3,
            RoleId::Scapegoat => 1,
            RoleId::Jester => 0,
            RoleId::WolfHound => -1,
            RoleId::WildChild => -1,
            RoleId::Angel => -2,
            RoleId::DevotedServant => 2,
        }
    }

    pub fn is_baseline(self) -> bool {
        matches!(self, RoleId::SimpleVillager | RoleId::SimpleWerewolf)
    }

    /// Roles whose turn only happens on the first night.
    pub fn first_night_only(self) -> bool {
        matches!(self, RoleId::WolfHound | RoleId::WildChild)
    }

    /// Case-insensitive catalog lookup, including display aliases.
    pub fn lookup(name: &str) -> Option<RoleId> {
        let wanted = name.trim();
        ALL_ROLES
            .into_iter()
            .find(|role| {
                role.name().eq_ignore_ascii_case(wanted)
                    || role.aliases().iter().any(|a| a.eq_ignore_ascii_case(wanted))
            })
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            RoleId::SimpleVillager => &["Villager"],
            RoleId::SimpleWerewolf => &["Werewolf"],
            RoleId::Jester => &["Village Idiot"],
            RoleId::WolfHound => &["Wolfhound"],
            RoleId::WildChild => &["Wildchild"],
            _ => &[],
        }
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Catalog minus the two baseline roles; the pool for the extra-role draw.
pub fn restricted_roles() -> Vec<RoleId> {
    ALL_ROLES.into_iter().filter(|r| !r.is_baseline()).collect()
}
