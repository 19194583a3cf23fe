// Snake-draft turn order.
//
// Order runs 0..n-1, then n-1..0, and so on. The player at either end of the
// roster picks twice in a row: once to finish a round, once to open the next.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::DraftError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Forward,
    Backward,
}

/// Where the draft is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TurnState {
    #[default]
    NotStarted,
    InProgress {
        index: usize,
        round: u32,
        direction: Direction,
    },
    Complete,
}

impl TurnState {
    /// Begin the draft at the head of the roster.
    pub fn start(self, player_count: usize) -> Result<TurnState, DraftError> {
        if self.is_in_progress() {
            return Err(DraftError::DraftAlreadyStarted);
        }
        if player_count == 0 {
            return Err(DraftError::NoPlayers);
        }
        Ok(TurnState::InProgress {
            index: 0,
            round: 1,
            direction: Direction::Forward,
        })
    }

    /// Move to the next turn after a completed pick.
    ///
    /// `picks_made` must already include the pick that triggered the advance.
    /// Once every player has filled every role the draft is complete, whatever
    /// the index bookkeeping says.
    pub fn advance(self, player_count: usize, picks_made: usize, roles_per_player: usize) -> TurnState {
        let TurnState::InProgress {
            index,
            round,
            direction,
        } = self
        else {
            return self;
        };

        if player_count == 0 {
            warn!("Turn advance with an empty roster; clearing current turn");
            return TurnState::NotStarted;
        }

        let next = match direction {
            Direction::Forward if index + 1 >= player_count => {
                info!("End of forward round {}. Reversing direction.", round);
                TurnState::InProgress {
                    index: player_count - 1,
                    round: round + 1,
                    direction: Direction::Backward,
                }
            }
            Direction::Forward => TurnState::InProgress {
                index: index + 1,
                round,
                direction,
            },
            Direction::Backward if index == 0 => {
                info!("End of backward round {}. Reversing direction.", round);
                TurnState::InProgress {
                    index: 0,
                    round: round + 1,
                    direction: Direction::Forward,
                }
            }
            Direction::Backward => TurnState::InProgress {
                index: index - 1,
                round,
                direction,
            },
        };

        if picks_made >= player_count * roles_per_player {
            info!("All {} picks made, draft complete", picks_made);
            return TurnState::Complete;
        }
        next
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, TurnState::InProgress { .. })
    }

    /// Roster index of the player on the clock.
    pub fn current_index(&self) -> Option<usize> {
        match self {
            TurnState::InProgress { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn round(&self) -> Option<u32> {
        match self {
            TurnState::InProgress { round, .. } => Some(*round),
            _ => None,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            TurnState::InProgress { direction, .. } => Some(*direction),
            _ => None,
        }
    }

    /// 1-based position of the current pick within its round.
    pub fn pick_in_round(&self, player_count: usize) -> Option<usize> {
        match self {
            TurnState::InProgress {
                index,
                direction: Direction::Forward,
                ..
            } => Some(index + 1),
            TurnState::InProgress {
                index,
                direction: Direction::Backward,
                ..
            } => Some(player_count - index),
            _ => None,
        }
    }
}
