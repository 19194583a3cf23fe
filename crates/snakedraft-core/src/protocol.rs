// Wire protocol between browser clients and the draft server.
//
// Client requests are JSON objects tagged by `type`. Server notifications are
// `{"type": ..., "payload": ...}` envelopes.

use serde::{Deserialize, Serialize};

use crate::draft::player::{Player, PlayerId};
use crate::draft::state::{LogEntry, StateView};
use crate::error::{DraftError, ErrorChannel};

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    SetDraftSettingsRequest {
        min: u32,
        max: u32,
        initial_rerolls: u32,
    },
    GenerateNumberRequest,
    UseRerollRequest,
    GenerateProtectedPickRequest {
        min: u32,
        max: u32,
    },
    /// Claim the displayed number.
    #[serde(rename_all = "camelCase")]
    RemoveNumberRequest {
        #[serde(default)]
        player_id: Option<PlayerId>,
    },
    /// Undo a claim.
    #[serde(rename_all = "camelCase")]
    AddNumberBackRequest {
        #[serde(default)]
        player_id: Option<PlayerId>,
    },
    AddPlayerRequest,
    RemovePlayerRequest,
    ShufflePlayersRequest,
    UpdatePlayerName {
        id: PlayerId,
        name: String,
    },
    StartDraftRequest,
    ToggleAdminEditMode,
    #[serde(rename_all = "camelCase")]
    AssignRoleRequest {
        player_id: PlayerId,
        role_name: String,
        character_name: String,
        #[serde(default)]
        is_protected: bool,
    },
    RequestState,
}

// ---------------------------------------------------------------------------
// Server -> client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberGeneratedPayload {
    pub number: Option<u32>,
    pub is_protected: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPayload {
    pub min: u32,
    pub max: u32,
    pub initial_rerolls: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStatusPayload {
    pub pool_size: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonsPayload {
    pub can_remove: bool,
    pub can_add_back: bool,
    pub pool_size: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnPayload {
    pub current_player_id: Option<PlayerId>,
    pub draft_has_started: bool,
    pub overall_pick_counter: usize,
    pub current_round: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ServerMessage {
    InitialState(Box<StateView>),
    NumberGenerated(NumberGeneratedPayload),
    SettingsSet(SettingsPayload),
    UpdatePoolStatus(PoolStatusPayload),
    UpdateRemoveAddButtons(ButtonsPayload),
    UpdatePlayers(Vec<Player>),
    UpdateTurn(TurnPayload),
    UpdateDraftLog(Vec<LogEntry>),
    UpdateAdminEditMode(bool),
    RangeError(ErrorPayload),
    PoolEmpty(ErrorPayload),
    ProtectedPickError(ErrorPayload),
    RerollError(ErrorPayload),
    Error(ErrorPayload),
}

impl ServerMessage {
    /// Wrap a rejection in the notification its channel calls for.
    pub fn from_error(err: &DraftError) -> Self {
        let payload = ErrorPayload {
            message: err.to_string(),
        };
        match err.channel() {
            ErrorChannel::Range => ServerMessage::RangeError(payload),
            ErrorChannel::PoolEmpty => ServerMessage::PoolEmpty(payload),
            ErrorChannel::ProtectedPick => ServerMessage::ProtectedPickError(payload),
            ErrorChannel::Reroll => ServerMessage::RerollError(payload),
            ErrorChannel::General => ServerMessage::Error(payload),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error(ErrorPayload {
            message: message.into(),
        })
    }

    /// Notification name as it appears in the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::InitialState(_) => "initialState",
            ServerMessage::NumberGenerated(_) => "numberGenerated",
            ServerMessage::SettingsSet(_) => "settingsSet",
            ServerMessage::UpdatePoolStatus(_) => "updatePoolStatus",
            ServerMessage::UpdateRemoveAddButtons(_) => "updateRemoveAddButtons",
            ServerMessage::UpdatePlayers(_) => "updatePlayers",
            ServerMessage::UpdateTurn(_) => "updateTurn",
            ServerMessage::UpdateDraftLog(_) => "updateDraftLog",
            ServerMessage::UpdateAdminEditMode(_) => "updateAdminEditMode",
            ServerMessage::RangeError(_) => "rangeError",
            ServerMessage::PoolEmpty(_) => "poolEmpty",
            ServerMessage::ProtectedPickError(_) => "protectedPickError",
            ServerMessage::RerollError(_) => "rerollError",
            ServerMessage::Error(_) => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ServerMessage::RangeError(_)
                | ServerMessage::PoolEmpty(_)
                | ServerMessage::ProtectedPickError(_)
                | ServerMessage::RerollError(_)
                | ServerMessage::Error(_)
        )
    }
}

// ---------------------------------------------------------------------------
// Outcome of handling one request
// ---------------------------------------------------------------------------

/// What the transport must deliver after a request has been handled.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    /// Sent to every connected client, in order.
    pub broadcast: Vec<ServerMessage>,
    /// Sent only to the client that made the request.
    pub reply: Vec<ServerMessage>,
}

impl Outcome {
    pub fn broadcast(messages: Vec<ServerMessage>) -> Self {
        Outcome {
            broadcast: messages,
            reply: Vec::new(),
        }
    }

    pub fn reply(message: ServerMessage) -> Self {
        Outcome {
            broadcast: Vec::new(),
            reply: vec![message],
        }
    }

    pub fn rejected(err: &DraftError) -> Self {
        Outcome::reply(ServerMessage::from_error(err))
    }

    pub fn is_rejection(&self) -> bool {
        self.broadcast.is_empty() && self.reply.iter().any(ServerMessage::is_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unit_requests() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"generateNumberRequest"}"#).unwrap();
        assert_eq!(msg, ClientMessage::GenerateNumberRequest);
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"toggleAdminEditMode"}"#).unwrap();
        assert_eq!(msg, ClientMessage::ToggleAdminEditMode);
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"requestState"}"#).unwrap();
        assert_eq!(msg, ClientMessage::RequestState);
    }

    #[test]
    fn parses_settings_request() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"setDraftSettingsRequest","min":1,"max":50,"initialRerolls":3}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::SetDraftSettingsRequest {
                min: 1,
                max: 50,
                initial_rerolls: 3
            }
        );
    }

    #[test]
    fn parses_assign_role_with_optional_flag() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"assignRoleRequest","playerId":2,"roleName":"Captain","characterName":"Foo"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::AssignRoleRequest {
                player_id: 2,
                role_name: "Captain".into(),
                character_name: "Foo".into(),
                is_protected: false,
            }
        );

        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"assignRoleRequest","playerId":2,"roleName":"Ace","characterName":"Bar","isProtected":true}"#,
        )
        .unwrap();
        assert!(matches!(
            msg,
            ClientMessage::AssignRoleRequest {
                is_protected: true,
                ..
            }
        ));
    }

    #[test]
    fn claim_request_player_id_is_optional() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"removeNumberRequest"}"#).unwrap();
        assert_eq!(msg, ClientMessage::RemoveNumberRequest { player_id: None });
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"addNumberBackRequest","playerId":4}"#).unwrap();
        assert_eq!(msg, ClientMessage::AddNumberBackRequest { player_id: Some(4) });
    }

    #[test]
    fn rejects_unknown_type() {
        let result: Result<ClientMessage, _> = serde_json::from_str(r#"{"type":"launchRockets"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_negative_range() {
        let result: Result<ClientMessage, _> = serde_json::from_str(
            r#"{"type":"setDraftSettingsRequest","min":-1,"max":5,"initialRerolls":0}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn server_message_envelope() {
        let msg = ServerMessage::NumberGenerated(NumberGeneratedPayload {
            number: Some(12),
            is_protected: true,
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "numberGenerated");
        assert_eq!(json["payload"]["number"], 12);
        assert_eq!(json["payload"]["isProtected"], true);

        let json = serde_json::to_value(ServerMessage::UpdateAdminEditMode(true)).unwrap();
        assert_eq!(json["type"], "updateAdminEditMode");
        assert_eq!(json["payload"], true);
    }

    #[test]
    fn kind_matches_serialized_tag() {
        let messages = vec![
            ServerMessage::UpdatePlayers(vec![]),
            ServerMessage::UpdateDraftLog(vec![]),
            ServerMessage::UpdatePoolStatus(PoolStatusPayload { pool_size: 3 }),
            ServerMessage::error("boom"),
        ];
        for msg in messages {
            let json = serde_json::to_value(&msg).unwrap();
            assert_eq!(json["type"], msg.kind());
        }
    }

    #[test]
    fn errors_map_to_channels() {
        let msg = ServerMessage::from_error(&DraftError::NoRerollsLeft);
        assert_eq!(msg.kind(), "rerollError");
        let msg = ServerMessage::from_error(&DraftError::ProtectedPickUsed);
        assert_eq!(msg.kind(), "protectedPickError");
        let msg = ServerMessage::from_error(&DraftError::PoolEmpty);
        assert_eq!(msg.kind(), "poolEmpty");
        let msg = ServerMessage::from_error(&DraftError::InvalidRange {
            message: "bad".into(),
        });
        assert_eq!(msg.kind(), "rangeError");
        let msg = ServerMessage::from_error(&DraftError::NotYourTurn);
        assert_eq!(msg.kind(), "error");
        assert!(msg.is_error());

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["payload"]["message"], "It is not your turn.");
    }

    #[test]
    fn rejected_outcome_replies_only() {
        let outcome = Outcome::rejected(&DraftError::PoolEmpty);
        assert!(outcome.broadcast.is_empty());
        assert_eq!(outcome.reply.len(), 1);
        assert!(outcome.is_rejection());
    }
}
