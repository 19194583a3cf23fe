// Rank number pool: draw, claim, return, re-roll, protected draws.
//
// Every value in `[min, max]` lives in exactly one place: the shuffled
// `remaining` list, the displayed `current` slot, the `claimed` slot, or the
// set of ranks already consumed by role assignment. At most one of
// `current` / `claimed` is occupied at a time.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::error::DraftError;

/// A number taken out of the pool, plus whether it came from a protected draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawnNumber {
    pub value: u32,
    pub is_protected: bool,
}

#[derive(Debug, Clone)]
pub struct Pool {
    min: u32,
    max: u32,
    remaining: Vec<u32>,
    current: Option<DrawnNumber>,
    claimed: Option<DrawnNumber>,
    /// Ranks handed out by `take_claimed`; they never return to the pool.
    assigned: usize,
}

impl Pool {
    /// Fill the pool with every value in `[min, max]` and shuffle it.
    ///
    /// Callers validate the range; an inverted range yields an empty pool.
    pub fn new<R: Rng + ?Sized>(min: u32, max: u32, rng: &mut R) -> Self {
        let mut remaining: Vec<u32> = (min..=max).collect();
        remaining.shuffle(rng);
        debug!("Pool initialized with {} numbers ({}-{})", remaining.len(), min, max);
        Pool {
            min,
            max,
            remaining,
            current: None,
            claimed: None,
            assigned: 0,
        }
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Numbers still available to draw.
    pub fn size(&self) -> usize {
        self.remaining.len()
    }

    pub fn current(&self) -> Option<DrawnNumber> {
        self.current
    }

    pub fn claimed(&self) -> Option<DrawnNumber> {
        self.claimed
    }

    /// Ranks consumed by role assignment since the pool was filled.
    pub fn assigned(&self) -> usize {
        self.assigned
    }

    /// Pool, current and claimed slots, plus assigned ranks. Always equals
    /// the range size.
    pub fn total_accounted(&self) -> usize {
        self.remaining.len()
            + usize::from(self.current.is_some())
            + usize::from(self.claimed.is_some())
            + self.assigned
    }

    fn ensure_slots_free(&self) -> Result<(), DraftError> {
        if self.current.is_some() {
            return Err(DraftError::AlreadyDisplayed);
        }
        if self.claimed.is_some() {
            return Err(DraftError::ClaimOutstanding);
        }
        Ok(())
    }

    /// Take one number from the pool and display it.
    pub fn draw(&mut self) -> Result<u32, DraftError> {
        self.ensure_slots_free()?;
        // The pool is reshuffled on every return, so the tail is uniform.
        let value = self.remaining.pop().ok_or(DraftError::PoolEmpty)?;
        self.current = Some(DrawnNumber {
            value,
            is_protected: false,
        });
        Ok(value)
    }

    /// Move the displayed number into the claimed slot.
    pub fn claim(&mut self) -> Result<DrawnNumber, DraftError> {
        let drawn = self.current.take().ok_or(DraftError::NothingToClaim)?;
        self.claimed = Some(drawn);
        Ok(drawn)
    }

    /// Undo a claim: the claimed number is displayed again, not returned.
    pub fn unclaim(&mut self) -> Result<DrawnNumber, DraftError> {
        if self.current.is_some() {
            return Err(DraftError::AlreadyDisplayed);
        }
        let drawn = self.claimed.take().ok_or(DraftError::NothingClaimed)?;
        self.current = Some(drawn);
        Ok(drawn)
    }

    /// Consume the claimed number. Used by role assignment.
    pub fn take_claimed(&mut self) -> Option<DrawnNumber> {
        let drawn = self.claimed.take()?;
        self.assigned += 1;
        Some(drawn)
    }

    /// Return the displayed number to the pool and draw a replacement.
    ///
    /// The per-player allowance is checked by the caller.
    pub fn reroll<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<u32, DraftError> {
        let returned = self.current.ok_or(DraftError::NothingToReroll)?;
        self.remaining.push(returned.value);
        self.remaining.shuffle(rng);
        let Some(value) = self.remaining.pop() else {
            // Unreachable after the push above.
            return Err(DraftError::PoolEmpty);
        };
        self.current = Some(DrawnNumber {
            value,
            is_protected: false,
        });
        Ok(value)
    }

    /// Draw uniformly from the pool values within `[low, high]`.
    ///
    /// The chosen value is deleted from the pool by value and displayed with
    /// the protected flag set.
    pub fn draw_protected<R: Rng + ?Sized>(
        &mut self,
        low: u32,
        high: u32,
        rng: &mut R,
    ) -> Result<u32, DraftError> {
        self.validate_protected_range(low, high)?;
        self.ensure_slots_free()?;

        let candidates: Vec<u32> = self
            .remaining
            .iter()
            .copied()
            .filter(|v| (low..=high).contains(v))
            .collect();
        let value = *candidates
            .choose(rng)
            .ok_or(DraftError::NoProtectedCandidates { low, high })?;

        self.remaining.retain(|&v| v != value);
        self.current = Some(DrawnNumber {
            value,
            is_protected: true,
        });
        Ok(value)
    }

    pub fn validate_protected_range(&self, low: u32, high: u32) -> Result<(), DraftError> {
        if low < 1 || high <= low || low < self.min || high > self.max {
            return Err(DraftError::InvalidProtectedRange {
                low,
                high,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}
