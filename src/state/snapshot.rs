//! Client-visible game state.
//!
//! A [`Snapshot`] is a plain value. The reducer builds a new one per event
//! and the dispatcher shares it with views behind an `Arc`.

use std::collections::BTreeSet;

use serde::Serialize;

use super::board::{Board, ColorToken, Position};
use super::player::{Player, PlayerId, Roster};

/// Who we are and which room we're in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Id the server assigned to this connection
    pub local_player_id: Option<String>,

    pub room_id: Option<String>,

    /// False once the server says the requested room is gone
    pub room_exists: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            local_player_id: None,
            room_id: None,
            room_exists: true,
        }
    }
}

/// Everything the views render from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub session: Session,

    /// Current board, dimensions and cells together
    pub board: Option<Board>,

    /// Winning run to flash; separate from cell colors
    pub blinking: BTreeSet<Position>,

    pub players: Roster,

    /// Player allowed to move next
    pub next_player: Option<PlayerId>,

    pub game_in_progress: bool,

    /// Games started in this room
    pub game_number: u32,

    /// Latest status line
    pub feedback: String,
}

impl Snapshot {
    /// Empty state at session start.
    pub fn initial() -> Self {
        Self::default()
    }

    /// Color at position, if a board exists and the cell is colored.
    pub fn cell(&self, pos: Position) -> Option<&ColorToken> {
        self.board
            .as_ref()
            .and_then(|b| b.cell(pos))
            .and_then(Option::as_ref)
    }

    pub fn is_blinking(&self, pos: Position) -> bool {
        self.blinking.contains(&pos)
    }

    /// The player whose turn it is, if they are in the roster.
    pub fn next_player(&self) -> Option<&Player> {
        self.next_player.as_ref().and_then(|id| self.players.get(id))
    }

    /// The local player's roster entry.
    pub fn local_player(&self) -> Option<&Player> {
        let id = self.session.local_player_id.as_deref()?;
        self.players.iter().find(|p| p.id.as_str() == id)
    }

    /// Whether the local player may act right now.
    pub fn is_local_turn(&self) -> bool {
        match (&self.next_player, &self.session.local_player_id) {
            (Some(next), Some(local)) => self.game_in_progress && next.as_str() == local,
            _ => false,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_snapshot() {
        let snap = Snapshot::initial();
        assert_eq!(snap.session.local_player_id, None);
        assert_eq!(snap.session.room_id, None);
        assert!(snap.session.room_exists);
        assert!(snap.board.is_none());
        assert!(snap.blinking.is_empty());
        assert!(snap.players.is_empty());
        assert_eq!(snap.next_player, None);
        assert!(!snap.game_in_progress);
        assert_eq!(snap.game_number, 0);
        assert_eq!(snap.feedback, "");
    }

    #[test]
    fn test_local_turn() {
        let mut snap = Snapshot::initial();
        snap.session.local_player_id = Some("p1".to_string());
        snap.players = Roster::from_players(vec![Player::new("p1", "Alice", "red")]);
        snap.next_player = Some(PlayerId::new("p1"));
        assert!(!snap.is_local_turn());

        snap.game_in_progress = true;
        assert!(snap.is_local_turn());
        assert_eq!(snap.local_player().map(|p| p.display_name.as_str()), Some("Alice"));
        assert_eq!(snap.next_player().map(|p| p.display_name.as_str()), Some("Alice"));

        snap.next_player = Some(PlayerId::new("p2"));
        assert!(!snap.is_local_turn());
        assert!(snap.next_player().is_none());
    }

    #[test]
    fn test_to_json_shape() {
        let mut snap = Snapshot::initial();
        snap.board = Some(Board::empty(1, 2, 2));
        snap.blinking.insert(Position::new(0, 1));

        let json = snap.to_json();
        assert_eq!(json["session"]["roomExists"], serde_json::json!(true));
        assert_eq!(json["board"]["rowCount"], serde_json::json!(1));
        assert_eq!(json["board"]["grid"], serde_json::json!([[null, null]]));
        assert_eq!(json["blinking"], serde_json::json!([[0, 1]]));
        assert_eq!(json["gameInProgress"], serde_json::json!(false));
    }
}
