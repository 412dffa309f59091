//! # worldstate-notifier
//!
//! Polls a live game-status feed, diffs consecutive snapshots and relays
//! what changed to chat subscribers, filtered by the rewards they care
//! about.
//!
//! Each poll cycle fetches every feed category concurrently, normalizes
//! the results into one immutable [`domain::Snapshot`], diffs it against
//! the previous cycle's snapshot and sends each subscriber the notices
//! that pass their filters. A failing category degrades to empty; a
//! failing subscriber never blocks the others.
//!
//! ## Architecture
//!
//! ```text
//! Feed API (HTTP)                Chat platform (HTTP)
//!     │                              │        ▲
//!     ├── HttpFeedClient (feed/)     │        │
//!     ├── Normalizer (feed/)         │        │
//!     │                              │        │
//!     ├── PollLoop (service/) ── diff (domain/)
//!     │       │                      │        │
//!     │       └── Dispatcher ────────┼────────┘
//!     │                              │
//!     │   CommandHandler (chat/) ◄───┘
//!     │       │
//!     └── DocumentStore (store/)  ◄── Status API (api/)
//! ```

pub mod api;
pub mod app_state;
pub mod chat;
pub mod config;
pub mod domain;
pub mod error;
pub mod feed;
pub mod service;
pub mod store;
