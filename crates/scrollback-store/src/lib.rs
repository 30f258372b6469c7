//! # scrollback-store - Log Storage Collaborators
//!
//! Contracts the reconciliation engine consumes from the log-storage side,
//! plus an in-memory reference store used by the headless driver and the
//! integration tests.
//!
//! ## Public API
//!
//! ### Contracts (`service`)
//! - [`WindowFetchService`] - location in, live stream of window updates out
//! - [`ReadStateService`] - fire-and-forget read cursor advancement
//! - [`EffectSink`] - batched view-count / mention-seen acknowledgments
//!
//! ### Reference Store (`memory`)
//! - [`MemoryStore`] - `BTreeMap` log with explicit hole ranges, live
//!   change notification, and unread bookkeeping; implements all three
//!   contracts

pub mod memory;
pub mod service;

pub use memory::MemoryStore;
pub use service::{EffectSink, LocalWindowFetchService, ReadStateService, WindowFetchService};
