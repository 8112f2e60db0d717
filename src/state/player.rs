//! Players and the room roster.
//!
//! The roster is ordered by arrival and keyed by [`PlayerId`]. All updates
//! return a new roster; the old one is left as is.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::board::ColorToken;

/// Server-assigned player identity (the connection's session id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A player in the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    #[serde(rename = "pk")]
    pub id: PlayerId,

    #[serde(rename = "name")]
    pub display_name: String,

    pub color: ColorToken,

    #[serde(rename = "numWins", default)]
    pub win_count: u32,

    #[serde(rename = "numGames", default)]
    pub game_count: u32,
}

impl Player {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, color: &str) -> Self {
        Self {
            id: PlayerId::new(id),
            display_name: display_name.into(),
            color: ColorToken::new(color),
            win_count: 0,
            game_count: 0,
        }
    }
}

/// Reference to a player by id, as sent with turn and result events.
///
/// The server usually sends the full player record here; only `pk` is
/// required and anything beyond `name` is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    #[serde(rename = "pk")]
    pub id: PlayerId,

    #[serde(default)]
    pub name: Option<String>,
}

impl PlayerRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: PlayerId::new(id),
            name: None,
        }
    }

    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: PlayerId::new(id),
            name: Some(name.into()),
        }
    }
}

impl From<&Player> for PlayerRef {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            name: Some(player.display_name.clone()),
        }
    }
}

/// Ordered collection of players in the current room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster from the server's list, verbatim.
    pub fn from_players(players: Vec<Player>) -> Self {
        Self { players }
    }

    /// Append a player. A player already present is replaced in place.
    pub fn with_added(&self, player: Player) -> Self {
        if self.contains(&player.id) {
            return self.with_updated(player);
        }

        let mut players = self.players.clone();
        players.push(player);
        Self { players }
    }

    /// Remove a player by id. Unknown ids leave the roster unchanged.
    pub fn without(&self, id: &PlayerId) -> Self {
        Self {
            players: self
                .players
                .iter()
                .filter(|p| &p.id != id)
                .cloned()
                .collect(),
        }
    }

    /// Replace the entry with the same id. Unknown ids leave the roster unchanged.
    pub fn with_updated(&self, player: Player) -> Self {
        Self {
            players: self
                .players
                .iter()
                .map(|p| {
                    if p.id == player.id {
                        player.clone()
                    } else {
                        p.clone()
                    }
                })
                .collect(),
        }
    }

    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.get(id).is_some()
    }

    /// Display name for an id, if the player is known.
    pub fn name_of(&self, id: &PlayerId) -> Option<&str> {
        self.get(id).map(|p| p.display_name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    pub fn as_slice(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
