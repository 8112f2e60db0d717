//! Client game-state synchronization.
//!
//! - `event` - Server envelopes and the typed event vocabulary
//! - `snapshot` - The immutable state views render from
//! - `board` / `player` - Board grid and room roster
//! - `reducer` - Pure `(Snapshot, Event) -> Snapshot`
//! - `dispatch` - Ordered event queue and subscriber fan-out
//! - `command` - Outbound requests to the server
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           Dispatcher                              │
//! │                                                                   │
//! │  Envelope ──▶ Event::decode ──▶ reduce ──▶ Arc<Snapshot> ──▶ views │
//! │                   │                │                               │
//! │                   ▼                ▼                               │
//! │            unknown/malformed   out-of-range                        │
//! │              (logged, prior snapshot republished)                  │
//! │                                                                   │
//! │  ┌────────────────────────── Snapshot ───────────────────────┐    │
//! │  │ session   board   blinking   players   next_player         │    │
//! │  │ game_in_progress   game_number   feedback                  │    │
//! │  └────────────────────────────────────────────────────────────┘    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust
//! use connectn_sync::state::{Dispatcher, Envelope};
//! use serde_json::json;
//!
//! let mut dispatcher = Dispatcher::default();
//! dispatcher.subscribe(|snapshot| println!("{}", snapshot.feedback));
//!
//! dispatcher.dispatch(&Envelope::new("roomJoined", json!({"pk": "p1", "room": "R1"})));
//! assert_eq!(dispatcher.snapshot().session.room_id.as_deref(), Some("R1"));
//! ```

pub mod board;
pub mod command;
pub mod dispatch;
pub mod event;
pub mod player;
pub mod reducer;
pub mod snapshot;

// Re-export commonly used types
pub use board::{Board, ColorToken, Grid, Position, MAX_CELLS};
pub use command::Command;
pub use dispatch::{
    channel, DispatchError, Dispatcher, Inbox, InboxReceiver, Outcome, RunSummary, Subscription,
};
pub use event::{Envelope, Event, EventError, EventKind};
pub use player::{Player, PlayerId, PlayerRef, Roster};
pub use reducer::{reduce, replay, try_reduce};
pub use snapshot::{Session, Snapshot};
