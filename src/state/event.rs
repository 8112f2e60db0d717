//! Server events.
//!
//! The transport hands over untyped [`Envelope`]s; [`Event::decode`] turns
//! them into the closed [`Event`] sum type. Unknown kinds and malformed
//! payloads come back as [`EventError`] so the dispatcher can drop them
//! without stopping the stream.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::board::{Board, ColorToken, Grid, Position, ShapeMismatch};
use super::player::{Player, PlayerRef};

/// Raw server frame: `{"event": "...", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,

    #[serde(default)]
    pub data: serde_json::Value,

    /// Stamped locally on receipt; not part of the wire form.
    #[serde(skip, default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

impl Envelope {
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
            received_at: Utc::now(),
        }
    }

    /// Parse one JSON frame as received from the transport.
    pub fn from_json(frame: &str) -> serde_json::Result<Self> {
        serde_json::from_str(frame)
    }
}

/// Every event kind this client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    RoomJoined,
    RoomDoesNotExist,
    PlayerAdded,
    PlayerRemoved,
    PlayersUpdated,
    PlayerUpdated,
    NextPlayerSet,
    BoardCreated,
    GameStarted,
    CellColored,
    TryAgain,
    GameWon,
    GameDraw,
}

impl EventKind {
    pub const ALL: [EventKind; 13] = [
        Self::RoomJoined,
        Self::RoomDoesNotExist,
        Self::PlayerAdded,
        Self::PlayerRemoved,
        Self::PlayersUpdated,
        Self::PlayerUpdated,
        Self::NextPlayerSet,
        Self::BoardCreated,
        Self::GameStarted,
        Self::CellColored,
        Self::TryAgain,
        Self::GameWon,
        Self::GameDraw,
    ];

    /// Name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoomJoined => "roomJoined",
            Self::RoomDoesNotExist => "roomDoesNotExist",
            Self::PlayerAdded => "playerAdded",
            Self::PlayerRemoved => "playerRemoved",
            Self::PlayersUpdated => "playersUpdated",
            Self::PlayerUpdated => "playerUpdated",
            Self::NextPlayerSet => "nextPlayer",
            Self::BoardCreated => "boardCreated",
            Self::GameStarted => "gameStarted",
            Self::CellColored => "colorPlayed",
            Self::TryAgain => "tryAgain",
            Self::GameWon => "gameWon",
            Self::GameDraw => "gameDraw",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed server event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    RoomJoined {
        player_id: String,
        room_id: String,
        board: Option<Board>,
        players: Option<Vec<Player>>,
    },
    RoomDoesNotExist {
        room: Option<String>,
    },
    PlayerAdded {
        player: Player,
    },
    PlayerRemoved {
        player: PlayerRef,
    },
    PlayersUpdated {
        players: Vec<Player>,
    },
    PlayerUpdated {
        player: Player,
    },
    NextPlayerSet {
        player: PlayerRef,
    },
    BoardCreated {
        board: Board,
    },
    GameStarted {
        game_number: Option<u32>,
    },
    CellColored {
        color: ColorToken,
        position: Position,
    },
    TryAgain {
        player: PlayerRef,
        reason: String,
    },
    GameWon {
        winner: Option<PlayerRef>,
        winning_positions: Vec<Position>,
        players: Vec<Player>,
    },
    GameDraw {
        players: Vec<Player>,
    },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::RoomJoined { .. } => EventKind::RoomJoined,
            Self::RoomDoesNotExist { .. } => EventKind::RoomDoesNotExist,
            Self::PlayerAdded { .. } => EventKind::PlayerAdded,
            Self::PlayerRemoved { .. } => EventKind::PlayerRemoved,
            Self::PlayersUpdated { .. } => EventKind::PlayersUpdated,
            Self::PlayerUpdated { .. } => EventKind::PlayerUpdated,
            Self::NextPlayerSet { .. } => EventKind::NextPlayerSet,
            Self::BoardCreated { .. } => EventKind::BoardCreated,
            Self::GameStarted { .. } => EventKind::GameStarted,
            Self::CellColored { .. } => EventKind::CellColored,
            Self::TryAgain { .. } => EventKind::TryAgain,
            Self::GameWon { .. } => EventKind::GameWon,
            Self::GameDraw { .. } => EventKind::GameDraw,
        }
    }

    /// Decode an envelope into a typed event.
    pub fn decode(envelope: &Envelope) -> Result<Self, EventError> {
        let kind = EventKind::from_name(&envelope.event).ok_or_else(|| EventError::UnknownKind {
            name: envelope.event.clone(),
        })?;

        // Kinds without required fields may arrive with no data at all.
        let empty = serde_json::Value::Object(serde_json::Map::new());
        let data = if envelope.data.is_null() {
            &empty
        } else {
            &envelope.data
        };

        let event = match kind {
            EventKind::RoomJoined => {
                let wire: RoomJoinedWire = payload(kind, data)?;
                Self::RoomJoined {
                    player_id: wire.pk,
                    room_id: wire.room,
                    board: wire.board.map(BoardWire::into_board).transpose()?,
                    players: wire.players,
                }
            }
            EventKind::RoomDoesNotExist => {
                let wire: RoomDoesNotExistWire = payload(kind, data)?;
                Self::RoomDoesNotExist { room: wire.room }
            }
            EventKind::PlayerAdded => {
                let wire: PlayerWire = payload(kind, data)?;
                Self::PlayerAdded {
                    player: wire.player,
                }
            }
            EventKind::PlayerRemoved => {
                let wire: PlayerRefWire = payload(kind, data)?;
                Self::PlayerRemoved {
                    player: wire.player,
                }
            }
            EventKind::PlayersUpdated => {
                let wire: PlayersWire = payload(kind, data)?;
                Self::PlayersUpdated {
                    players: wire.players,
                }
            }
            EventKind::PlayerUpdated => {
                let wire: PlayerWire = payload(kind, data)?;
                Self::PlayerUpdated {
                    player: wire.player,
                }
            }
            EventKind::NextPlayerSet => {
                let wire: PlayerRefWire = payload(kind, data)?;
                Self::NextPlayerSet {
                    player: wire.player,
                }
            }
            EventKind::BoardCreated => {
                let wire: BoardCreatedWire = payload(kind, data)?;
                Self::BoardCreated {
                    board: wire.board.into_board()?,
                }
            }
            EventKind::GameStarted => {
                let wire: GameStartedWire = payload(kind, data)?;
                Self::GameStarted {
                    game_number: wire.game_number,
                }
            }
            EventKind::CellColored => {
                let wire: ColorPlayedWire = payload(kind, data)?;
                Self::CellColored {
                    color: wire.color,
                    position: wire.position,
                }
            }
            EventKind::TryAgain => {
                let wire: TryAgainWire = payload(kind, data)?;
                Self::TryAgain {
                    player: wire.player,
                    reason: wire.reason,
                }
            }
            EventKind::GameWon => {
                let wire: GameWonWire = payload(kind, data)?;
                Self::GameWon {
                    winner: wire.winner,
                    winning_positions: wire.winning_positions,
                    players: wire.players,
                }
            }
            EventKind::GameDraw => {
                let wire: PlayersWire = payload(kind, data)?;
                Self::GameDraw {
                    players: wire.players,
                }
            }
        };

        Ok(event)
    }
}

impl TryFrom<&Envelope> for Event {
    type Error = EventError;

    fn try_from(envelope: &Envelope) -> Result<Self, Self::Error> {
        Self::decode(envelope)
    }
}

fn payload<T: DeserializeOwned>(kind: EventKind, data: &serde_json::Value) -> Result<T, EventError> {
    T::deserialize(data).map_err(|source| EventError::Malformed { kind, source })
}

/// Why an event could not be folded into the snapshot.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("unknown event kind '{name}'")]
    UnknownKind { name: String },

    #[error("malformed {kind} payload: {source}")]
    Malformed {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {rows}x{columns} board: {detail}")]
    InvalidBoard {
        rows: usize,
        columns: usize,
        detail: String,
    },

    #[error("position {position} is outside the {rows}x{columns} board")]
    PositionOutOfRange {
        position: Position,
        rows: usize,
        columns: usize,
    },

    #[error("cannot color {position} before a board exists")]
    NoBoard { position: Position },

    #[error("cell {position} is already {color}")]
    CellOccupied {
        position: Position,
        color: ColorToken,
    },
}

impl From<ShapeMismatch> for EventError {
    fn from(mismatch: ShapeMismatch) -> Self {
        Self::InvalidBoard {
            rows: mismatch.rows,
            columns: mismatch.columns,
            detail: mismatch.detail,
        }
    }
}

impl EventError {
    /// Unknown kinds are expected from newer servers and are not a fault.
    pub fn is_unknown_kind(&self) -> bool {
        matches!(self, Self::UnknownKind { .. })
    }
}

// Wire payloads. Field names follow the server's camelCase JSON.

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoardWire {
    num_rows: usize,
    num_columns: usize,
    num_to_win: usize,
    #[serde(default)]
    grid: Option<Grid>,
}

impl BoardWire {
    fn into_board(self) -> Result<Board, EventError> {
        let board = match self.grid {
            None => Board::sized(self.num_rows, self.num_columns, self.num_to_win)?,
            Some(grid) => Board::from_grid(self.num_rows, self.num_columns, self.num_to_win, grid)?,
        };
        Ok(board)
    }
}

#[derive(Deserialize)]
struct RoomJoinedWire {
    pk: String,
    room: String,
    #[serde(default)]
    board: Option<BoardWire>,
    #[serde(default)]
    players: Option<Vec<Player>>,
}

#[derive(Deserialize)]
struct RoomDoesNotExistWire {
    #[serde(default)]
    room: Option<String>,
}

#[derive(Deserialize)]
struct PlayerWire {
    player: Player,
}

#[derive(Deserialize)]
struct PlayerRefWire {
    player: PlayerRef,
}

#[derive(Deserialize)]
struct PlayersWire {
    players: Vec<Player>,
}

#[derive(Deserialize)]
struct BoardCreatedWire {
    board: BoardWire,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameStartedWire {
    #[serde(default)]
    game_number: Option<u32>,
}

#[derive(Deserialize)]
struct ColorPlayedWire {
    color: ColorToken,
    position: Position,
}

#[derive(Deserialize)]
struct TryAgainWire {
    player: PlayerRef,
    reason: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameWonWire {
    #[serde(default)]
    winner: Option<PlayerRef>,
    winning_positions: Vec<Position>,
    players: Vec<Player>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(EventKind::from_name("RoomJoined"), None);
    }

    #[test]
    fn test_envelope_from_json() {
        let env = Envelope::from_json(r#"{"event": "gameStarted"}"#).unwrap();
        assert_eq!(env.event, "gameStarted");
        assert!(env.data.is_null());
        assert_eq!(
            Event::decode(&env).unwrap(),
            Event::GameStarted { game_number: None }
        );
    }

    #[test]
    fn test_decode_room_joined_minimal() {
        let env = Envelope::new("roomJoined", json!({"pk": "p1", "room": "R1"}));
        assert_eq!(
            Event::decode(&env).unwrap(),
            Event::RoomJoined {
                player_id: "p1".to_string(),
                room_id: "R1".to_string(),
                board: None,
                players: None,
            }
        );
    }

    #[test]
    fn test_decode_room_joined_with_null_board() {
        let env = Envelope::new(
            "roomJoined",
            json!({"pk": "p1", "room": "R1", "board": null, "players": []}),
        );
        match Event::decode(&env).unwrap() {
            Event::RoomJoined { board, players, .. } => {
                assert!(board.is_none());
                assert_eq!(players, Some(vec![]));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_decode_board_created() {
        let env = Envelope::new(
            "boardCreated",
            json!({"board": {
                "numRows": 2,
                "numColumns": 3,
                "numToWin": 2,
                "grid": [[null, "red", null], [null, null, null]]
            }}),
        );
        match Event::decode(&env).unwrap() {
            Event::BoardCreated { board } => {
                assert_eq!(board.row_count(), 2);
                assert_eq!(board.column_count(), 3);
                assert_eq!(board.target_run_length(), 2);
                assert_eq!(board.cell(Position::new(0, 1)), Some(&Some("red".into())));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_decode_board_without_grid_is_empty() {
        let env = Envelope::new(
            "boardCreated",
            json!({"board": {"numRows": 6, "numColumns": 7, "numToWin": 4}}),
        );
        match Event::decode(&env).unwrap() {
            Event::BoardCreated { board } => assert_eq!(board, Board::empty(6, 7, 4)),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_decode_board_shape_mismatch() {
        let env = Envelope::new(
            "boardCreated",
            json!({"board": {"numRows": 2, "numColumns": 2, "numToWin": 2, "grid": [[null, null]]}}),
        );
        let err = Event::decode(&env).unwrap_err();
        assert!(matches!(err, EventError::InvalidBoard { rows: 2, columns: 2, .. }));
    }

    #[test]
    fn test_decode_oversized_board_rejected() {
        let env = Envelope::new(
            "boardCreated",
            json!({"board": {"numRows": 1, "numColumns": 4611686018427387904u64, "numToWin": 4}}),
        );
        assert!(matches!(
            Event::decode(&env).unwrap_err(),
            EventError::InvalidBoard { rows: 1, .. }
        ));

        let env = Envelope::new(
            "roomJoined",
            json!({"pk": "p1", "room": "R1", "board": {"numRows": 100000, "numColumns": 100000, "numToWin": 4}}),
        );
        assert!(matches!(
            Event::decode(&env).unwrap_err(),
            EventError::InvalidBoard { rows: 100_000, columns: 100_000, .. }
        ));
    }

    #[test]
    fn test_decode_color_played() {
        let env = Envelope::new("colorPlayed", json!({"color": "red", "position": [5, 3]}));
        assert_eq!(
            Event::decode(&env).unwrap(),
            Event::CellColored {
                color: "red".into(),
                position: Position::new(5, 3),
            }
        );
    }

    #[test]
    fn test_decode_game_won() {
        let env = Envelope::new(
            "gameWon",
            json!({
                "winner": {"pk": "p1", "name": "Alice", "color": "red", "numWins": 1},
                "winningPositions": [[5, 0], [5, 1], [5, 2], [5, 3]],
                "players": [{"pk": "p1", "name": "Alice", "color": "red", "numWins": 1}]
            }),
        );
        match Event::decode(&env).unwrap() {
            Event::GameWon {
                winner,
                winning_positions,
                players,
            } => {
                assert_eq!(winner, Some(PlayerRef::named("p1", "Alice")));
                assert_eq!(winning_positions.len(), 4);
                assert_eq!(players[0].win_count, 1);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_decode_unknown_kind() {
        let env = Envelope::new("spectatorJoined", json!({"who": "x"}));
        let err = Event::decode(&env).unwrap_err();
        assert!(err.is_unknown_kind());
        assert_eq!(err.to_string(), "unknown event kind 'spectatorJoined'");
    }

    #[test]
    fn test_decode_missing_required_field() {
        let env = Envelope::new("colorPlayed", json!({"color": "red"}));
        let err = Event::decode(&env).unwrap_err();
        assert!(matches!(
            err,
            EventError::Malformed {
                kind: EventKind::CellColored,
                ..
            }
        ));

        let env = Envelope::new("playerAdded", serde_json::Value::Null);
        assert!(matches!(
            Event::decode(&env).unwrap_err(),
            EventError::Malformed {
                kind: EventKind::PlayerAdded,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_wrong_type() {
        let env = Envelope::new("colorPlayed", json!({"color": "red", "position": [-1, 3]}));
        assert!(matches!(
            Event::decode(&env).unwrap_err(),
            EventError::Malformed { .. }
        ));
    }
}
