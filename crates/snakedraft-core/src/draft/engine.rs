// Draft engine: validates and applies every mutating request.
//
// Each operation checks all of its preconditions before touching state, so a
// rejected request leaves the draft exactly as it was. Successful operations
// return the notifications the transport should broadcast.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{info, warn};

use super::player::{Assignment, Player, PlayerId};
use super::roles::{Role, TOTAL_ROLES};
use super::state::{DraftSettings, DraftState, LogEntry};
use crate::error::DraftError;
use crate::protocol::{
    ButtonsPayload, ClientMessage, NumberGeneratedPayload, Outcome, PoolStatusPayload,
    ServerMessage, SettingsPayload, TurnPayload,
};

/// Default roster cap.
pub const DEFAULT_MAX_PLAYERS: usize = 10;

pub struct DraftEngine {
    state: DraftState,
    rng: StdRng,
    max_players: usize,
}

impl DraftEngine {
    /// Create an engine with an entropy-seeded generator.
    pub fn new(settings: DraftSettings, max_players: usize) -> Self {
        Self::with_rng(settings, max_players, StdRng::from_entropy())
    }

    /// Create an engine with a caller-supplied generator (seeded in tests).
    pub fn with_rng(settings: DraftSettings, max_players: usize, mut rng: StdRng) -> Self {
        let state = DraftState::new(settings, &mut rng);
        DraftEngine {
            state,
            rng,
            max_players,
        }
    }

    /// Read-only access to the authoritative state.
    pub fn state(&self) -> &DraftState {
        &self.state
    }

    /// Handle one client request, turning rejections into a requester-only reply.
    pub fn handle(&mut self, msg: ClientMessage) -> Outcome {
        let result = match msg {
            ClientMessage::SetDraftSettingsRequest {
                min,
                max,
                initial_rerolls,
            } => self.set_settings(DraftSettings {
                min,
                max,
                initial_rerolls,
            }),
            ClientMessage::GenerateNumberRequest => self.generate_number(),
            ClientMessage::UseRerollRequest => self.use_reroll(),
            ClientMessage::GenerateProtectedPickRequest { min, max } => {
                self.generate_protected_pick(min, max)
            }
            ClientMessage::RemoveNumberRequest { player_id } => self.request_claim(player_id),
            ClientMessage::AddNumberBackRequest { player_id } => self.request_unclaim(player_id),
            ClientMessage::AddPlayerRequest => self.add_player(),
            ClientMessage::RemovePlayerRequest => self.remove_player(),
            ClientMessage::ShufflePlayersRequest => self.shuffle_players(),
            ClientMessage::UpdatePlayerName { id, name } => self.rename_player(id, &name),
            ClientMessage::StartDraftRequest => self.start_draft(),
            ClientMessage::ToggleAdminEditMode => self.toggle_admin_edit_mode(),
            ClientMessage::AssignRoleRequest {
                player_id,
                role_name,
                character_name,
                is_protected,
            } => self.request_assign_role(player_id, &role_name, &character_name, is_protected),
            ClientMessage::RequestState => return Outcome::reply(self.initial_state()),
        };

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Request rejected: {}", e);
                Outcome::rejected(&e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Settings and lifecycle
    // -----------------------------------------------------------------------

    pub fn set_settings(&mut self, settings: DraftSettings) -> Result<Outcome, DraftError> {
        if self.state.draft_started() {
            return Err(DraftError::Locked {
                action: "change settings",
            });
        }
        settings.validate()?;

        self.state.reset(settings, &mut self.rng);
        info!(
            "Settings set to {}-{} with {} re-rolls; draft reset",
            settings.min, settings.max, settings.initial_rerolls
        );
        Ok(Outcome::broadcast(vec![
            ServerMessage::SettingsSet(SettingsPayload {
                min: settings.min,
                max: settings.max,
                initial_rerolls: settings.initial_rerolls,
            }),
            self.initial_state(),
        ]))
    }

    pub fn start_draft(&mut self) -> Result<Outcome, DraftError> {
        if self.state.draft_started() {
            return Err(DraftError::DraftAlreadyStarted);
        }
        if self.state.players.is_empty() {
            return Err(DraftError::NoPlayers);
        }

        let settings = self.state.settings;
        self.state.reset(settings, &mut self.rng);
        self.state.turn = self.state.turn.start(self.state.players.len())?;
        info!(
            "Draft started with {} players: round 1, direction forward",
            self.state.players.len()
        );
        Ok(Outcome::broadcast(vec![self.initial_state(), self.turn_update()]))
    }

    pub fn toggle_admin_edit_mode(&mut self) -> Result<Outcome, DraftError> {
        if self.state.draft_started() || self.state.overall_pick_counter == 0 {
            return Err(DraftError::AdminEditUnavailable);
        }
        self.state.admin_edit_mode = !self.state.admin_edit_mode;
        info!("Admin edit mode {}", if self.state.admin_edit_mode { "enabled" } else { "disabled" });
        Ok(Outcome::broadcast(vec![ServerMessage::UpdateAdminEditMode(
            self.state.admin_edit_mode,
        )]))
    }

    // -----------------------------------------------------------------------
    // Roster
    // -----------------------------------------------------------------------

    fn ensure_roster_unlocked(&self, action: &'static str) -> Result<(), DraftError> {
        if self.state.draft_started() {
            return Err(DraftError::Locked { action });
        }
        Ok(())
    }

    pub fn add_player(&mut self) -> Result<Outcome, DraftError> {
        self.ensure_roster_unlocked("add players")?;
        if self.state.players.len() >= self.max_players {
            return Err(DraftError::RosterFull {
                max: self.max_players,
            });
        }

        let id = self.state.allocate_player_id();
        let player = Player::new(id, self.state.settings.initial_rerolls);
        info!("Player added: {} (ID: {})", player.name, id);
        self.state.players.push(player);
        Ok(Outcome::broadcast(vec![self.players_update(), self.turn_update()]))
    }

    pub fn remove_player(&mut self) -> Result<Outcome, DraftError> {
        self.ensure_roster_unlocked("remove players")?;
        let removed = self.state.players.pop().ok_or(DraftError::RosterEmpty)?;
        info!("Player removed: {} (ID: {})", removed.name, removed.id);
        Ok(Outcome::broadcast(vec![self.players_update(), self.turn_update()]))
    }

    pub fn shuffle_players(&mut self) -> Result<Outcome, DraftError> {
        self.ensure_roster_unlocked("shuffle players")?;
        self.state.players.shuffle(&mut self.rng);
        info!("Players shuffled");
        Ok(Outcome::broadcast(vec![self.players_update(), self.turn_update()]))
    }

    pub fn rename_player(&mut self, id: PlayerId, name: &str) -> Result<Outcome, DraftError> {
        self.ensure_roster_unlocked("rename players")?;
        let player = self
            .state
            .player_mut(id)
            .ok_or(DraftError::PlayerNotFound(id))?;
        player.rename(name);
        info!("Player {} name updated to: {}", id, player.name);
        Ok(Outcome::broadcast(vec![self.players_update(), self.turn_update()]))
    }

    // -----------------------------------------------------------------------
    // Pool operations
    // -----------------------------------------------------------------------

    fn ensure_started(&self) -> Result<(), DraftError> {
        if !self.state.draft_started() {
            return Err(DraftError::DraftNotStarted);
        }
        Ok(())
    }

    /// Index of the player on the clock, optionally checking the requester.
    fn acting_index(&self, requester: Option<PlayerId>) -> Result<usize, DraftError> {
        let idx = self
            .state
            .turn
            .current_index()
            .filter(|&i| i < self.state.players.len())
            .ok_or(DraftError::NoCurrentTurn)?;
        if let Some(id) = requester {
            if self.state.players[idx].id != id {
                return Err(DraftError::NotYourTurn);
            }
        }
        Ok(idx)
    }

    pub fn generate_number(&mut self) -> Result<Outcome, DraftError> {
        self.ensure_started()?;
        let number = self.state.pool.draw()?;
        info!("Generated number: {} ({} left in pool)", number, self.state.pool.size());
        Ok(Outcome::broadcast(vec![
            self.number_update(),
            self.buttons_update(),
            self.pool_update(),
        ]))
    }

    pub fn use_reroll(&mut self) -> Result<Outcome, DraftError> {
        self.ensure_started()?;
        let idx = self.acting_index(None)?;
        let Some(old) = self.state.pool.current() else {
            return Err(DraftError::NothingToReroll);
        };
        if self.state.players[idx].rerolls_remaining == 0 {
            return Err(DraftError::NoRerollsLeft);
        }

        let number = self.state.pool.reroll(&mut self.rng)?;
        let player = &mut self.state.players[idx];
        player.rerolls_remaining -= 1;
        info!(
            "{} re-rolled {} -> {} ({} re-rolls left)",
            player.name, old.value, number, player.rerolls_remaining
        );
        Ok(Outcome::broadcast(vec![
            self.number_update(),
            self.players_update(),
            self.buttons_update(),
            self.pool_update(),
        ]))
    }

    pub fn generate_protected_pick(&mut self, low: u32, high: u32) -> Result<Outcome, DraftError> {
        self.ensure_started()?;
        let idx = self.acting_index(None)?;
        self.state.pool.validate_protected_range(low, high)?;
        if self.state.players[idx].protected_pick_used {
            return Err(DraftError::ProtectedPickUsed);
        }

        let number = self.state.pool.draw_protected(low, high, &mut self.rng)?;
        info!(
            "Protected pick for {}: {} from {}-{}",
            self.state.players[idx].name, number, low, high
        );
        Ok(Outcome::broadcast(vec![
            self.number_update(),
            self.buttons_update(),
            self.pool_update(),
        ]))
    }

    /// Reserve the displayed number for the player on the clock.
    ///
    /// Claiming does not consume a turn; only assignment does.
    pub fn request_claim(&mut self, requester: Option<PlayerId>) -> Result<Outcome, DraftError> {
        self.ensure_started()?;
        let idx = self.acting_index(requester)?;
        let drawn = self.state.pool.claim()?;
        info!(
            "Number {} claimed by player turn (Index: {}, ID: {})",
            drawn.value, idx, self.state.players[idx].id
        );
        Ok(Outcome::broadcast(vec![
            self.number_update(),
            self.buttons_update(),
            self.pool_update(),
            self.turn_update(),
        ]))
    }

    /// Undo a claim, re-displaying the same number.
    pub fn request_unclaim(&mut self, requester: Option<PlayerId>) -> Result<Outcome, DraftError> {
        self.ensure_started()?;
        if requester.is_some() {
            self.acting_index(requester)?;
        }
        let drawn = self.state.pool.unclaim()?;
        info!("Claim on number {} undone", drawn.value);
        Ok(Outcome::broadcast(vec![
            self.number_update(),
            self.buttons_update(),
            self.pool_update(),
            self.turn_update(),
        ]))
    }

    // -----------------------------------------------------------------------
    // Role assignment
    // -----------------------------------------------------------------------

    pub fn request_assign_role(
        &mut self,
        player_id: PlayerId,
        role_name: &str,
        character_name: &str,
        is_protected: bool,
    ) -> Result<Outcome, DraftError> {
        if self.state.admin_edit_mode {
            return self.admin_assign_role(player_id, role_name, character_name);
        }

        // Preconditions, first failure wins.
        self.ensure_started()?;
        let idx = self.acting_index(Some(player_id))?;
        let claimed = self.state.pool.claimed().ok_or(DraftError::NothingClaimed)?;
        let role =
            Role::from_name(role_name).ok_or_else(|| DraftError::UnknownRole(role_name.to_string()))?;
        let character = character_name.trim();
        if character.is_empty() {
            return Err(DraftError::EmptyCharacterName);
        }
        if self.state.players[idx].has_role(role) {
            return Err(DraftError::RoleAlreadyFilled(role));
        }

        // Captured before the turn moves on.
        let player_count = self.state.players.len();
        let round = self.state.turn.round().unwrap_or(1);
        let pick_in_round = self.state.turn.pick_in_round(player_count).unwrap_or(idx + 1);

        self.state.pool.take_claimed();
        let player = &mut self.state.players[idx];
        player
            .roles
            .insert(role, Assignment::ranked(character, claimed.value));
        if is_protected || claimed.is_protected {
            if player.protected_pick_used {
                warn!(
                    "Protected flag on a pick by {} who already used the protected pick; ignoring",
                    player.name
                );
            } else {
                player.protected_pick_used = true;
            }
        }
        info!(
            "Assigning Rank {} (\"{}\") to Player {} ({}) - Role: {}",
            claimed.value, character, player.id, player.name, role
        );

        let entry = LogEntry {
            overall_pick: self.state.overall_pick_counter + 1,
            round,
            pick_in_round,
            player_id: player.id,
            player_name: player.name.clone(),
            character_name: character.to_string(),
            rank: claimed.value,
            role_name: role,
            picked_at: chrono::Utc::now(),
        };
        self.state.draft_log.push(entry);
        self.state.overall_pick_counter += 1;
        self.state.turn =
            self.state
                .turn
                .advance(player_count, self.state.overall_pick_counter, TOTAL_ROLES);

        match self.state.turn.current_index() {
            Some(next) => info!(
                "Turn advanced. Next turn: round {:?}, index {} (Player ID: {:?})",
                self.state.turn.round(),
                next,
                self.state.current_player_id()
            ),
            None => info!(
                "Draft finished after {} picks",
                self.state.overall_pick_counter
            ),
        }

        Ok(Outcome::broadcast(vec![
            self.players_update(),
            self.turn_update(),
            ServerMessage::UpdateDraftLog(self.state.draft_log.clone()),
            self.buttons_update(),
            self.pool_update(),
        ]))
    }

    /// Post-draft correction: overwrite or clear a role with no turn or claim checks.
    fn admin_assign_role(
        &mut self,
        player_id: PlayerId,
        role_name: &str,
        character_name: &str,
    ) -> Result<Outcome, DraftError> {
        let role =
            Role::from_name(role_name).ok_or_else(|| DraftError::UnknownRole(role_name.to_string()))?;
        let player = self
            .state
            .player_mut(player_id)
            .ok_or(DraftError::PlayerNotFound(player_id))?;

        let character = character_name.trim();
        if character.is_empty() {
            player.roles.remove(&role);
            info!("Admin cleared {} for {}", role, player.name);
        } else {
            player.roles.insert(role, Assignment::unranked(character));
            info!("Admin set {} for {} to \"{}\"", role, player.name, character);
        }
        Ok(Outcome::broadcast(vec![self.players_update()]))
    }

    // -----------------------------------------------------------------------
    // Notification builders
    // -----------------------------------------------------------------------

    pub fn initial_state(&self) -> ServerMessage {
        ServerMessage::InitialState(Box::new(self.state.view()))
    }

    fn number_update(&self) -> ServerMessage {
        let current = self.state.pool.current();
        ServerMessage::NumberGenerated(NumberGeneratedPayload {
            number: current.map(|d| d.value),
            is_protected: current.is_some_and(|d| d.is_protected),
        })
    }

    fn buttons_update(&self) -> ServerMessage {
        ServerMessage::UpdateRemoveAddButtons(ButtonsPayload {
            can_remove: self.state.pool.current().is_some(),
            can_add_back: self.state.pool.claimed().is_some(),
            pool_size: self.state.pool.size(),
        })
    }

    fn pool_update(&self) -> ServerMessage {
        ServerMessage::UpdatePoolStatus(PoolStatusPayload {
            pool_size: self.state.pool.size(),
        })
    }

    fn players_update(&self) -> ServerMessage {
        ServerMessage::UpdatePlayers(self.state.players.clone())
    }

    fn turn_update(&self) -> ServerMessage {
        ServerMessage::UpdateTurn(TurnPayload {
            current_player_id: self.state.current_player_id(),
            draft_has_started: self.state.draft_started(),
            overall_pick_counter: self.state.overall_pick_counter,
            current_round: self.state.turn.round(),
        })
    }
}
