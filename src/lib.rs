//! Connect-N client state library
//!
//! This crate keeps the client-side view of a networked connect-N room in
//! sync with the authoritative game server.
//!
//! # Overview
//!
//! - **Events** - The server pushes named envelopes (`roomJoined`,
//!   `colorPlayed`, `gameWon`, ...). They decode into a closed `Event` enum;
//!   unknown kinds are ignored so newer servers don't break older clients.
//!
//! - **Snapshot** - One immutable value holding the session, board, win
//!   highlight, roster, turn and status line.
//!
//! - **Reducer** - A pure function folding one event into a snapshot.
//!
//! - **Dispatcher** - Applies queued events strictly in order and publishes
//!   every resulting snapshot to subscribed views.
//!
//! # Design Principles
//!
//! 1. **The server is the authority** - Win detection, move legality and
//!    turn order happen remotely; this crate only renders their effects.
//!
//! 2. **Bad input never stops the stream** - Malformed or unknown events are
//!    logged and dropped, and the prior snapshot is republished.
//!
//! 3. **No networking** - Transports push envelopes into an `Inbox`.
//!
//! 4. **Serialization-ready** - Snapshots serialize to JSON for views.
//!
//! # Example
//!
//! ```rust
//! use connectn_sync::state::{Dispatcher, Envelope, Position};
//! use serde_json::json;
//!
//! let mut dispatcher = Dispatcher::default();
//!
//! dispatcher.dispatch(&Envelope::new("roomJoined", json!({"pk": "p1", "room": "R1"})));
//! dispatcher.dispatch(&Envelope::new(
//!     "boardCreated",
//!     json!({"board": {"numRows": 6, "numColumns": 7, "numToWin": 4}}),
//! ));
//! dispatcher.dispatch(&Envelope::new("gameStarted", json!({})));
//! dispatcher.dispatch(&Envelope::new(
//!     "colorPlayed",
//!     json!({"color": "red", "position": [5, 3]}),
//! ));
//!
//! let snapshot = dispatcher.snapshot();
//! assert!(snapshot.game_in_progress);
//! assert_eq!(snapshot.cell(Position::new(5, 3)).map(|c| c.as_str()), Some("red"));
//! ```

pub mod config;
pub mod logging;
pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
