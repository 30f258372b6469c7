//! # scrollback-core - Core Domain Types
//!
//! Foundation crate for scrollback. Provides record and key types, window
//! snapshots, renderable entries, transitions, the fetch-stream protocol,
//! error handling, and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on
//! external crates (serde, chrono, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Records (`types`)
//! - [`LogRecord`] - An immutable conversation record
//! - [`RecordKey`] - Composite ordering key `(seq, namespace, local)`
//! - [`Namespace`], [`RecordId`], [`SenderId`], [`Direction`], [`Attribute`]
//!
//! ### Windows (`window`)
//! - [`WindowSnapshot`] - A bounded, ordered slice of the log
//! - [`WindowItem`] - Record or [`KeyRange`] hole marker
//! - [`WindowAux`], [`InitialPayload`] - auxiliary per-window data
//!
//! ### Entries (`entry`)
//! - [`RenderableEntry`] - The projected entry sum type
//! - [`EntryId`], [`EntryKey`] - diff identity and total order
//!
//! ### Locations & Updates (`location`, `update`)
//! - [`WindowLocation`] - Window request descriptors
//! - [`WindowUpdate`], [`UpdateKind`], [`ResolvedScroll`] - fetch protocol
//!
//! ### Transitions (`transition`)
//! - [`Transition`] - minimal insert/update/delete operation set
//! - [`DisplayedRange`] - what the surface reports back
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`

pub mod entry;
pub mod error;
pub mod location;
pub mod logging;
pub mod transition;
pub mod types;
pub mod update;
pub mod window;

/// Prelude for common imports used throughout all scrollback crates
pub mod prelude {
    pub use super::error::{Error, Result};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use entry::{
    EntryId, EntryKey, EntryTie, GroupEntry, GroupIdentity, GroupMember, HoleEntry, MessageEntry,
    RenderableEntry, Selection,
};
pub use error::{Error, Result};
pub use location::{AnchorKey, ScrollPosition, WindowLocation};
pub use transition::{
    ApplyOptions, DirectionHint, DisplayedRange, FillDirection, IndexRange, InsertEntry, ScrollTo,
    Transition, TransitionReason, UpdateEntry,
};
pub use types::{
    Attribute, Direction, LogRecord, Namespace, NetworkClass, PeerKind, RecordId, RecordKey,
    RecordTags, SenderId,
};
pub use update::{ResolvedScroll, UpdateKind, WindowUpdate};
pub use window::{
    CachedPeerPayload, InitialPayload, KeyRange, PeerInfo, ReadStateSummary, WindowAux,
    WindowItem, WindowSnapshot,
};
