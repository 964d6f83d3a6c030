//! Graphics device and presentation chain.
//!
//! The render loop drives presentation through the [`PresentationChain`]
//! trait so the loop, resize reconciliation, and target caching can be
//! exercised without a GPU. The real Direct3D/Direct2D chain lives in
//! `d3d` and is only compiled on Windows.
//!
//! ## Components
//! - `PresentationChain`: device + swap chain + drawing context behind one seam
//! - `TargetCache`: per-backbuffer drawable targets, invalidated on resize
//! - `d3d`: D3D11/DXGI/Direct2D implementation (Windows only)

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::SurfaceResult;
use crate::scene::Indicator;

#[cfg(windows)]
pub mod d3d;

/// Fixed frame interval used when no latency waitable is available
/// (approximates a 60Hz cadence).
pub const FIXED_FRAME_TICK: Duration = Duration::from_millis(16);

/// How a chain paces the render loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePacing {
    /// `wait_frame` blocks on a swap-chain frame-latency waitable,
    /// bounding queued-frame depth.
    GpuPaced,
    /// `wait_frame` sleeps a fixed tick between frames.
    FixedTick(Duration),
}

/// GPU device, swap chain, and 2D drawing context behind one interface.
///
/// A chain is created exactly once per renderer, on the render thread,
/// and every method is only ever called from that thread. The binding
/// handle is the single value that leaves the render thread: it crosses
/// to the host UI context once, for the panel's native presentation slot.
pub trait PresentationChain {
    /// Opaque swap-chain handle accepted by the host panel.
    type Binding: Send + 'static;

    /// Drawable view of one backbuffer. Cached per buffer index by the
    /// render loop; entries go stale when the buffer set is resized.
    type Target;

    /// Handle for the host panel's native presentation slot.
    fn binding(&self) -> Self::Binding;

    /// The pacing this chain settled on at creation.
    fn pacing(&self) -> FramePacing;

    /// Block until the next frame slot is available.
    fn wait_frame(&mut self);

    /// Index of the backbuffer that the next draw targets.
    fn current_buffer(&mut self) -> SurfaceResult<u32>;

    /// Create a drawable target for the given backbuffer.
    fn create_target(&mut self, buffer: u32) -> SurfaceResult<Self::Target>;

    /// Clear the target to the background color and fill one square per
    /// indicator.
    fn draw(&mut self, target: &Self::Target, indicators: &[Indicator]) -> SurfaceResult<()>;

    /// Present the drawn frame with no forced sync interval.
    fn present(&mut self) -> SurfaceResult<()>;

    /// Resize the backbuffer set. All previously created targets must be
    /// dropped before this is called; they reference the old buffers.
    fn resize(&mut self, extent: (u32, u32)) -> SurfaceResult<()>;
}

/// Per-backbuffer drawable targets, keyed by buffer index.
///
/// Backbuffer ownership is transient, so the cache is keyed by the
/// stable buffer index (0/1 of a double-buffered chain) rather than by
/// raw buffer identity. Any resize invalidates the whole cache.
#[derive(Debug)]
pub struct TargetCache<T> {
    entries: HashMap<u32, T>,
}

impl<T> Default for TargetCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> TargetCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the cached target for a buffer, creating it on first use.
    pub fn get_or_create<E>(
        &mut self,
        buffer: u32,
        create: impl FnOnce() -> Result<T, E>,
    ) -> Result<&T, E> {
        match self.entries.entry(buffer) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(create()?)),
        }
    }

    /// Drop every cached target. Called when the backbuffer set changes.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, buffer: u32) -> bool {
        self.entries.contains_key(&buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_creates_once_per_buffer() {
        let mut cache: TargetCache<String> = TargetCache::new();
        let mut created = 0;

        for _ in 0..3 {
            let target = cache
                .get_or_create(0, || -> Result<String, ()> {
                    created += 1;
                    Ok("buffer-0".to_string())
                })
                .unwrap();
            assert_eq!(target, "buffer-0");
        }

        assert_eq!(created, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_keys_by_buffer_index() {
        let mut cache: TargetCache<u32> = TargetCache::new();

        cache.get_or_create(0, || -> Result<u32, ()> { Ok(100) }).unwrap();
        cache.get_or_create(1, || -> Result<u32, ()> { Ok(200) }).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(0));
        assert!(cache.contains(1));
    }

    #[test]
    fn test_cache_clear_forces_recreation() {
        let mut cache: TargetCache<u32> = TargetCache::new();
        let created = std::cell::Cell::new(0u32);

        let create = || -> Result<u32, ()> {
            created.set(created.get() + 1);
            Ok(created.get())
        };

        cache.get_or_create(0, &create).unwrap();
        cache.clear();
        assert!(cache.is_empty());

        cache.get_or_create(0, &create).unwrap();
        assert_eq!(created.get(), 2);
    }

    #[test]
    fn test_cache_create_failure_leaves_no_entry() {
        let mut cache: TargetCache<u32> = TargetCache::new();

        let err = cache.get_or_create(0, || Err("no buffer")).unwrap_err();
        assert_eq!(err, "no buffer");
        assert!(cache.is_empty());
    }
}
