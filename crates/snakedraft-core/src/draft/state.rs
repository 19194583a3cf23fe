// Draft state: pool, roster, turn pointer, pick log.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::info;

use super::player::{Player, PlayerId};
use super::pool::Pool;
use super::roles::Role;
use super::turn::{Direction, TurnState};
use crate::error::DraftError;

/// Largest number of ranks a pool may hold.
pub const MAX_RANGE_SIZE: u32 = 100_000;

/// Range and allowance settings that a reset is driven from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftSettings {
    pub min: u32,
    pub max: u32,
    pub initial_rerolls: u32,
}

impl Default for DraftSettings {
    fn default() -> Self {
        DraftSettings {
            min: 1,
            max: 100,
            initial_rerolls: 2,
        }
    }
}

impl DraftSettings {
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.min < 1 {
            return Err(DraftError::InvalidRange {
                message: format!("minimum must be at least 1, got {}", self.min),
            });
        }
        if self.max <= self.min {
            return Err(DraftError::InvalidRange {
                message: format!(
                    "maximum ({}) must be greater than minimum ({})",
                    self.max, self.min
                ),
            });
        }
        if self.max - self.min >= MAX_RANGE_SIZE {
            return Err(DraftError::InvalidRange {
                message: format!(
                    "range {}-{} holds more than {} numbers",
                    self.min, self.max, MAX_RANGE_SIZE
                ),
            });
        }
        Ok(())
    }

    /// Number of distinct rank values in the range.
    pub fn range_size(&self) -> usize {
        (self.max - self.min) as usize + 1
    }
}

/// One completed pick. Append-only; only a reset clears the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Sequential pick number (1-indexed).
    pub overall_pick: usize,
    pub round: u32,
    pub pick_in_round: usize,
    pub player_id: PlayerId,
    pub player_name: String,
    pub character_name: String,
    pub rank: u32,
    pub role_name: Role,
    pub picked_at: DateTime<Utc>,
}

/// The complete, authoritative state of the draft.
#[derive(Debug, Clone)]
pub struct DraftState {
    pub settings: DraftSettings,
    pub pool: Pool,
    /// Turn order.
    pub players: Vec<Player>,
    pub turn: TurnState,
    /// Number of picks completed so far.
    pub overall_pick_counter: usize,
    pub draft_log: Vec<LogEntry>,
    pub admin_edit_mode: bool,
    next_player_id: PlayerId,
}

impl DraftState {
    pub fn new<R: Rng + ?Sized>(settings: DraftSettings, rng: &mut R) -> Self {
        DraftState {
            settings,
            pool: Pool::new(settings.min, settings.max, rng),
            players: Vec::new(),
            turn: TurnState::default(),
            overall_pick_counter: 0,
            draft_log: Vec::new(),
            admin_edit_mode: false,
            next_player_id: 1,
        }
    }

    /// Reinitialise everything draft-scoped from `settings`.
    ///
    /// The roster and player identities survive; their roles, protected pick
    /// and re-roll allowance do not.
    pub fn reset<R: Rng + ?Sized>(&mut self, settings: DraftSettings, rng: &mut R) {
        info!(
            "Resetting draft state: range {}-{}, {} re-rolls",
            settings.min, settings.max, settings.initial_rerolls
        );
        self.settings = settings;
        self.pool = Pool::new(settings.min, settings.max, rng);
        for player in &mut self.players {
            player.reset_for_draft(settings.initial_rerolls);
        }
        self.turn = TurnState::default();
        self.overall_pick_counter = 0;
        self.draft_log.clear();
        self.admin_edit_mode = false;
    }

    /// Immutable copy of the full state.
    pub fn snapshot(&self) -> DraftState {
        self.clone()
    }

    pub fn draft_started(&self) -> bool {
        self.turn.is_in_progress()
    }

    /// Id of the player on the clock, if a draft is running.
    pub fn current_player_id(&self) -> Option<PlayerId> {
        self.turn
            .current_index()
            .and_then(|idx| self.players.get(idx))
            .map(|p| p.id)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Hand out the next player id.
    pub(crate) fn allocate_player_id(&mut self) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id += 1;
        id
    }

    /// Client-facing view of the state. Pool contents are withheld.
    pub fn view(&self) -> StateView {
        let current = self.pool.current();
        StateView {
            min: self.settings.min,
            max: self.settings.max,
            initial_rerolls: self.settings.initial_rerolls,
            current_number: current.map(|d| d.value),
            current_is_protected: current.is_some_and(|d| d.is_protected),
            claimed_number: self.pool.claimed().map(|d| d.value),
            can_remove: current.is_some(),
            can_add_back: self.pool.claimed().is_some(),
            pool_size: self.pool.size(),
            players: self.players.clone(),
            current_player_id: self.current_player_id(),
            draft_has_started: self.draft_started(),
            current_turn_index: self.turn.current_index(),
            current_round: self.turn.round(),
            direction: self.turn.direction(),
            overall_pick_counter: self.overall_pick_counter,
            draft_log: self.draft_log.clone(),
            admin_edit_mode: self.admin_edit_mode,
        }
    }
}

/// Full state as sent to a connecting or resyncing client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    pub min: u32,
    pub max: u32,
    pub initial_rerolls: u32,
    pub current_number: Option<u32>,
    pub current_is_protected: bool,
    pub claimed_number: Option<u32>,
    pub can_remove: bool,
    pub can_add_back: bool,
    pub pool_size: usize,
    pub players: Vec<Player>,
    pub current_player_id: Option<PlayerId>,
    pub draft_has_started: bool,
    pub current_turn_index: Option<usize>,
    pub current_round: Option<u32>,
    pub direction: Option<Direction>,
    pub overall_pick_counter: usize,
    pub draft_log: Vec<LogEntry>,
    pub admin_edit_mode: bool,
}
