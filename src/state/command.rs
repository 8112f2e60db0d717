//! Outbound commands.
//!
//! What the local player asks the server to do. Commands are
//! fire-and-forget: their effects only show up when the matching events
//! come back through the dispatcher, never by touching the snapshot here.

use serde::Serialize;

/// Request sent to the game server, framed as `{"event": ..., "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum Command {
    /// Join a room, or create one when `room` is omitted.
    #[serde(rename_all = "camelCase")]
    AddUser {
        username: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        room: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    CreateBoard {
        num_rows: usize,
        num_columns: usize,
        num_to_win: usize,
    },

    StartGame {},

    /// Drop a disc in `column`.
    Play { column: usize },
}

impl Command {
    /// Name used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddUser { .. } => "addUser",
            Self::CreateBoard { .. } => "createBoard",
            Self::StartGame {} => "startGame",
            Self::Play { .. } => "play",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_user_wire_shape() {
        let cmd = Command::AddUser {
            username: "Alice".to_string(),
            room: Some("R1".to_string()),
        };
        assert_eq!(
            cmd.to_json(),
            json!({"event": "addUser", "data": {"username": "Alice", "room": "R1"}})
        );

        let cmd = Command::AddUser {
            username: "Alice".to_string(),
            room: None,
        };
        assert_eq!(
            cmd.to_json(),
            json!({"event": "addUser", "data": {"username": "Alice"}})
        );
    }

    #[test]
    fn test_create_board_wire_shape() {
        let cmd = Command::CreateBoard {
            num_rows: 6,
            num_columns: 7,
            num_to_win: 4,
        };
        assert_eq!(
            cmd.to_json(),
            json!({"event": "createBoard", "data": {"numRows": 6, "numColumns": 7, "numToWin": 4}})
        );
    }

    #[test]
    fn test_start_game_and_play() {
        assert_eq!(
            Command::StartGame {}.to_json(),
            json!({"event": "startGame", "data": {}})
        );
        assert_eq!(
            Command::Play { column: 3 }.to_json(),
            json!({"event": "play", "data": {"column": 3}})
        );
    }

    #[test]
    fn test_name_matches_tag() {
        let commands = [
            Command::AddUser {
                username: "a".to_string(),
                room: None,
            },
            Command::CreateBoard {
                num_rows: 1,
                num_columns: 1,
                num_to_win: 1,
            },
            Command::StartGame {},
            Command::Play { column: 0 },
        ];
        for cmd in commands {
            assert_eq!(cmd.to_json()["event"], json!(cmd.name()));
        }
    }
}
