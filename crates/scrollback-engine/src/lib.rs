//! # scrollback-engine - Windowed History Reconciliation
//!
//! The engine keeps a live, scrollable view over an append-only,
//! gap-possible record log and incrementally reconciles it against a
//! rendering surface, without ever materializing the whole log.
//!
//! ## Public API
//!
//! ### Pipeline (`pipeline`, `surface`)
//! - [`HistoryEngine`] - serialized single-worker reconciliation pipeline
//! - [`EngineOptions`] - construction-time configuration
//! - [`RenderSurface`] - the structural-application contract
//!
//! ### Projection & Diffing (`project`, `diff`)
//! - [`project()`] - window snapshot to renderable entries
//! - [`prepared_transition()`] - minimal transition between projections
//! - [`apply_to()`] - replay a transition (tests, bookkeeping surfaces)
//!
//! ### Visibility (`visibility`, `cursors`)
//! - [`scan_visible()`] - effects, read maxima, and pagination from the
//!   displayed range
//! - [`ReadCursors`] - per-namespace monotonic read cursors
//!
//! ### Infrastructure (`cell`, `cancel`, `batch`)
//! - [`ValueCell`], [`DistinctCell`] - broadcast state cells
//! - [`CancelHandle`] - replace-cancels-previous cancellation slot
//! - [`BatchCollector`] - debounced batched effect collector
//!
//! ### Configuration (`config`, `state`)
//! - [`Tuning`] - page size, margins, debounce intervals (TOML-loadable)
//! - [`DisplaySettings`], [`LoadState`], [`HistoryState`]

pub mod assoc;
pub mod batch;
pub mod cancel;
pub mod cell;
pub mod config;
pub mod cursors;
pub mod diff;
pub mod pipeline;
pub mod project;
pub mod state;
pub mod surface;
pub mod visibility;

pub use assoc::{extract_associated_data, AssocData, DownloadPeerClass};
pub use batch::BatchCollector;
pub use cancel::CancelHandle;
pub use cell::{DistinctCell, ValueCell};
pub use config::{default_config_path, load_tuning, Tuning};
pub use cursors::ReadCursors;
pub use diff::{apply_to, prepared_transition};
pub use pipeline::{EngineOptions, HistoryEngine};
pub use project::{project, ProjectOptions, Projection};
pub use state::{DisplaySettings, HistoryState, LoadState, ViewMode};
pub use surface::{LocalRenderSurface, RenderSurface};
pub use visibility::{scan_visible, VisibilityContext, VisibilityOutcome};
