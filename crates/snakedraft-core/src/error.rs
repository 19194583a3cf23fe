// Rejection reasons for draft requests.
//
// Every variant is recoverable: the request is refused, state is untouched,
// and only the requester hears about it.

use thiserror::Error;

use crate::draft::player::PlayerId;
use crate::draft::roles::Role;

/// Broad category of a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// A precondition did not hold (wrong turn, role filled, bad input).
    Validation,
    /// A finite resource ran out (pool, re-rolls, protected candidates).
    ResourceExhausted,
    /// The request referenced something that does not exist.
    NotFound,
}

/// Which error notification a rejection is delivered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorChannel {
    Range,
    PoolEmpty,
    ProtectedPick,
    Reroll,
    General,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    // -- lifecycle gating --
    #[error("Draft has not started yet.")]
    DraftNotStarted,

    #[error("Draft already started.")]
    DraftAlreadyStarted,

    #[error("Cannot {action} after the draft starts.")]
    Locked { action: &'static str },

    #[error("Need at least one player to start.")]
    NoPlayers,

    #[error("Admin edit mode is only available after a draft has finished.")]
    AdminEditUnavailable,

    // -- settings --
    #[error("Invalid range values: {message}")]
    InvalidRange { message: String },

    // -- roster --
    #[error("Maximum players reached ({max}).")]
    RosterFull { max: usize },

    #[error("No players to remove.")]
    RosterEmpty,

    #[error("Player {0} not found.")]
    PlayerNotFound(PlayerId),

    // -- turn --
    #[error("No current player turn.")]
    NoCurrentTurn,

    #[error("It is not your turn.")]
    NotYourTurn,

    // -- pool --
    #[error("A number is already displayed.")]
    AlreadyDisplayed,

    #[error("A claimed number must be assigned or added back first.")]
    ClaimOutstanding,

    #[error("Number pool is empty!")]
    PoolEmpty,

    #[error("No number to claim.")]
    NothingToClaim,

    #[error("No character rank/number has been claimed.")]
    NothingClaimed,

    // -- re-roll --
    #[error("No number to re-roll.")]
    NothingToReroll,

    #[error("No re-rolls left.")]
    NoRerollsLeft,

    // -- protected pick --
    #[error("Protected pick already used.")]
    ProtectedPickUsed,

    #[error("Invalid protected range {low}-{high} (must be within {min}-{max}, low >= 1, high > low).")]
    InvalidProtectedRange { low: u32, high: u32, min: u32, max: u32 },

    #[error("No numbers left in the pool between {low} and {high}.")]
    NoProtectedCandidates { low: u32, high: u32 },

    // -- assignment --
    #[error("Invalid role specified: '{0}'.")]
    UnknownRole(String),

    #[error("Character name cannot be empty.")]
    EmptyCharacterName,

    #[error("Role '{0}' is already filled for this player.")]
    RoleAlreadyFilled(Role),
}

impl DraftError {
    pub fn class(&self) -> ErrorClass {
        match self {
            DraftError::PoolEmpty
            | DraftError::NoRerollsLeft
            | DraftError::NoProtectedCandidates { .. } => ErrorClass::ResourceExhausted,
            DraftError::PlayerNotFound(_) => ErrorClass::NotFound,
            _ => ErrorClass::Validation,
        }
    }

    pub fn channel(&self) -> ErrorChannel {
        match self {
            DraftError::InvalidRange { .. } => ErrorChannel::Range,
            DraftError::PoolEmpty => ErrorChannel::PoolEmpty,
            DraftError::ProtectedPickUsed
            | DraftError::InvalidProtectedRange { .. }
            | DraftError::NoProtectedCandidates { .. } => ErrorChannel::ProtectedPick,
            DraftError::NothingToReroll | DraftError::NoRerollsLeft => ErrorChannel::Reroll,
            _ => ErrorChannel::General,
        }
    }
}
