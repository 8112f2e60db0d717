//! Pure reducer: `(Snapshot, Event) -> Snapshot`.
//!
//! Every state transition lives in the `match` in [`try_reduce`]. The
//! reducer does no I/O beyond diagnostics and is deterministic, so an event
//! log replayed from [`Snapshot::initial`] always lands on the same state.

use std::collections::BTreeSet;

use tracing::warn;

use super::board::{Board, ColorToken, Position};
use super::event::{Event, EventError};
use super::player::{PlayerRef, Roster};
use super::snapshot::{Session, Snapshot};

/// Fold one event into the snapshot.
///
/// Events that cannot apply to the current board are dropped with a
/// warning and the snapshot comes back unchanged.
pub fn reduce(state: Snapshot, event: Event) -> Snapshot {
    let kind = event.kind();
    match try_reduce(&state, event) {
        Ok(next) => next,
        Err(err) => {
            warn!(%kind, error = %err, "Dropping event");
            state
        }
    }
}

/// Fold one event into the snapshot, reporting events that can't apply.
///
/// The only failures are cell updates outside (or without) a board, or onto
/// a cell that is already colored; every other well-formed event succeeds.
pub fn try_reduce(state: &Snapshot, event: Event) -> Result<Snapshot, EventError> {
    let next = match event {
        Event::RoomJoined {
            player_id,
            room_id,
            board,
            players,
        } => {
            let feedback = format!("Joined room {}", room_id);
            let session = Session {
                local_player_id: Some(player_id),
                room_id: Some(room_id),
                room_exists: true,
            };
            let (board, blinking) = match board {
                Some(board) => (Some(board), BTreeSet::new()),
                None => (state.board.clone(), state.blinking.clone()),
            };
            let players = match players {
                Some(players) => Roster::from_players(players),
                None => state.players.clone(),
            };

            Snapshot {
                session,
                board,
                blinking,
                players,
                feedback,
                ..state.clone()
            }
        }

        Event::RoomDoesNotExist { room } => Snapshot {
            session: Session {
                room_exists: false,
                ..state.session.clone()
            },
            feedback: match room {
                Some(room) => format!("Room {} does not exist", room),
                None => "Room does not exist".to_string(),
            },
            ..state.clone()
        },

        Event::PlayerAdded { player } => Snapshot {
            feedback: format!("Welcome, {}", player.display_name),
            players: state.players.with_added(player),
            ..state.clone()
        },

        Event::PlayerRemoved { player } => match state.players.get(&player.id) {
            Some(seated) => Snapshot {
                feedback: format!("{} left the room", seated.display_name),
                players: state.players.without(&player.id),
                ..state.clone()
            },
            None => state.clone(),
        },

        Event::PlayersUpdated { players } => Snapshot {
            players: Roster::from_players(players),
            ..state.clone()
        },

        Event::PlayerUpdated { player } => Snapshot {
            players: state.players.with_updated(player),
            ..state.clone()
        },

        Event::NextPlayerSet { player } => Snapshot {
            feedback: format!("{}'s turn", display_name(&state.players, &player)),
            next_player: Some(player.id),
            ..state.clone()
        },

        Event::BoardCreated { board } => Snapshot {
            feedback: format!(
                "{} x {} board created",
                board.row_count(),
                board.column_count()
            ),
            board: Some(board),
            blinking: BTreeSet::new(),
            ..state.clone()
        },

        Event::GameStarted { game_number } => {
            let game_number = game_number.unwrap_or(state.game_number.saturating_add(1));
            Snapshot {
                board: state.board.as_ref().map(|b| b.cleared()),
                blinking: BTreeSet::new(),
                game_in_progress: true,
                game_number,
                feedback: format!("Game {} started", game_number),
                ..state.clone()
            }
        }

        Event::CellColored { color, position } => Snapshot {
            board: Some(color_cell(state, position, color)?),
            ..state.clone()
        },

        Event::TryAgain { player, reason } => Snapshot {
            feedback: format!(
                "{} try again ({})",
                display_name(&state.players, &player),
                reason
            ),
            ..state.clone()
        },

        Event::GameWon {
            winner,
            winning_positions,
            players,
        } => {
            let players = Roster::from_players(players);
            let feedback = match &winner {
                Some(winner) => format!("Game won by {}", display_name(&players, winner)),
                None => "Game over".to_string(),
            };
            Snapshot {
                players,
                blinking: winning_positions.into_iter().collect(),
                next_player: None,
                game_in_progress: false,
                feedback,
                ..state.clone()
            }
        }

        Event::GameDraw { players } => Snapshot {
            players: Roster::from_players(players),
            blinking: BTreeSet::new(),
            next_player: None,
            game_in_progress: false,
            feedback: "Game ended in a draw".to_string(),
            ..state.clone()
        },
    };

    Ok(next)
}

fn color_cell(
    state: &Snapshot,
    position: Position,
    color: ColorToken,
) -> Result<Board, EventError> {
    let board = state.board.as_ref().ok_or(EventError::NoBoard { position })?;
    let out_of_range = || EventError::PositionOutOfRange {
        position,
        rows: board.row_count(),
        columns: board.column_count(),
    };

    match board.cell(position) {
        None => Err(out_of_range()),
        Some(Some(existing)) => Err(EventError::CellOccupied {
            position,
            color: existing.clone(),
        }),
        Some(None) => board.with_cell(position, color).ok_or_else(out_of_range),
    }
}

/// Name to show for a referenced player: the name sent with the event,
/// then the roster entry, then the raw id.
fn display_name(roster: &Roster, player: &PlayerRef) -> String {
    player
        .name
        .clone()
        .or_else(|| roster.name_of(&player.id).map(str::to_string))
        .unwrap_or_else(|| player.id.to_string())
}

/// Fold a whole event sequence from `start`.
pub fn replay<I>(start: Snapshot, events: I) -> Snapshot
where
    I: IntoIterator<Item = Event>,
{
    events.into_iter().fold(start, reduce)
}
