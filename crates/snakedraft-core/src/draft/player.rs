// Draft participants and their filled roles.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use super::roles::Role;

/// Player identifier. Monotonic for the lifetime of the process, never reused.
pub type PlayerId = u32;

/// A character placed into a role.
///
/// Regular picks carry the rank number that was claimed for them; admin
/// corrections store the raw character name with no rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub character_name: String,
    pub rank: Option<u32>,
}

impl Assignment {
    pub fn ranked(character_name: impl Into<String>, rank: u32) -> Self {
        Assignment {
            character_name: character_name.into(),
            rank: Some(rank),
        }
    }

    pub fn unranked(character_name: impl Into<String>) -> Self {
        Assignment {
            character_name: character_name.into(),
            rank: None,
        }
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rank {
            Some(rank) => write!(f, "{} (#{})", self.character_name, rank),
            None => write!(f, "{}", self.character_name),
        }
    }
}

// Clients only ever see the combined display string.
impl Serialize for Assignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A participant in the draft. Roster order is turn order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Filled roles only; an absent key means the role is still open.
    pub roles: BTreeMap<Role, Assignment>,
    pub protected_pick_used: bool,
    pub rerolls_remaining: u32,
}

impl Player {
    /// Create a player with the default display name and a fresh allowance.
    pub fn new(id: PlayerId, rerolls: u32) -> Self {
        Player {
            id,
            name: default_name(id),
            roles: BTreeMap::new(),
            protected_pick_used: false,
            rerolls_remaining: rerolls,
        }
    }

    /// Clear every draft-scoped field, keeping identity and name.
    pub fn reset_for_draft(&mut self, rerolls: u32) {
        self.roles.clear();
        self.protected_pick_used = false;
        self.rerolls_remaining = rerolls;
    }

    /// Apply a rename request. Blank names fall back to the default.
    pub fn rename(&mut self, requested: &str) {
        let trimmed = requested.trim();
        self.name = if trimmed.is_empty() {
            default_name(self.id)
        } else {
            trimmed.to_string()
        };
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains_key(&role)
    }

    pub fn filled_count(&self) -> usize {
        self.roles.len()
    }
}

/// Display name given to a freshly added player.
pub fn default_name(id: PlayerId) -> String {
    format!("Player {id}")
}
