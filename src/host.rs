//! Host panel abstraction.
//!
//! The embedding application owns the actual UI surface; the renderer
//! only needs three things from it: the panel's current logical size, a
//! way to run one closure on the host UI context, and a native
//! presentation slot that accepts the swap-chain binding. Everything
//! else about the host (layout, markup, property systems) stays on the
//! host's side of this trait.

use crate::geometry::Size;

/// The rectangular UI surface the renderer composites into.
///
/// `B` is the chain's opaque swap-chain binding type, so a host is tied
/// to the presentation backend it can actually display.
pub trait HostPanel<B>: Send + Sync + 'static {
    /// Current panel size in logical units.
    ///
    /// May be called from any thread; hosts typically back this with a
    /// cached value updated on layout.
    fn size(&self) -> Size;

    /// Schedule a closure onto the host UI context.
    ///
    /// The closure must eventually run even while other threads block on
    /// its side effects; a host that is already on its UI context may
    /// invoke it inline. Used exactly once per renderer, for the
    /// swap-chain binding rendezvous.
    fn dispatch_on_ui(&self, task: Box<dyn FnOnce() + Send>);

    /// Accept the swap chain into the panel's native presentation slot.
    ///
    /// Called on the host UI context (from within `dispatch_on_ui`),
    /// once, before the first frame is presented.
    fn bind_swap_chain(&self, binding: B) -> Result<(), String>;
}
