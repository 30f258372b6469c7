//! Rendering-surface contract.

use scrollback_core::{DisplayedRange, Transition};

/// The structural-application side of a rendering surface.
///
/// The engine guarantees calls never overlap for one engine instance:
/// `apply` is awaited to completion before the next transition is computed.
/// The returned [`DisplayedRange`] is what the surface shows after layout
/// and immediately re-enters the visibility tracker. Surfaces additionally
/// report plain scrolls (no structural change) through
/// [`HistoryEngine::displayed_range_changed`](crate::HistoryEngine::displayed_range_changed).
#[trait_variant::make(RenderSurface: Send)]
pub trait LocalRenderSurface {
    async fn apply(&mut self, transition: Transition) -> DisplayedRange;
}
