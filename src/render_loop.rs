//! The dedicated render loop.
//!
//! One long-lived worker owns every piece of drawing state: the
//! presentation chain, the contact table, and the per-backbuffer target
//! cache. Each iteration pumps cross-thread commands and pointer input,
//! waits for a frame slot, draws the current contacts, and presents.
//! Nothing in here is shared with another thread except the channels and
//! the running flag, so the hot path takes no locks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use crate::chain::{PresentationChain, TargetCache};
use crate::contact::ContactTable;
use crate::error::SurfaceResult;
use crate::geometry::Size;
use crate::input::{CaptureController, InputSource};
use crate::scene::build_indicators;
use crate::sync::ReadySignal;

/// Lifecycle of the render loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LoopState {
    /// Device/swap-chain setup and input registration.
    Starting,
    /// Setup complete; readiness signal raised.
    Ready,
    /// Pumping, drawing, presenting.
    Running,
    /// Stop flag observed; final iteration finished.
    Stopping,
    /// Worker is about to return; resources unwind after this.
    Stopped,
}

/// A cross-thread operation rendezvoused onto the render loop.
///
/// The sender blocks on `done` until the loop has executed the
/// operation; that completion signal is what makes the dispatch a
/// synchronous call rather than a fire-and-forget message.
pub(crate) enum Command {
    Resize { size: Size, done: Sender<()> },
    SetCaptureOnPress { enabled: bool, done: Sender<()> },
}

pub(crate) struct RenderLoop<C: PresentationChain> {
    chain: C,
    targets: TargetCache<C::Target>,
    table: ContactTable,
    input: InputSource,
    capture: CaptureController,
    commands: Receiver<Command>,
    running: Arc<AtomicBool>,
    ready: Arc<ReadySignal>,
    /// Authoritative panel dimensions; only this thread writes them.
    dims: Size,
    indicator_side: f64,
    state: LoopState,
}

impl<C: PresentationChain> RenderLoop<C> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        chain: C,
        input: InputSource,
        capture: CaptureController,
        commands: Receiver<Command>,
        running: Arc<AtomicBool>,
        ready: Arc<ReadySignal>,
        initial_size: Size,
        indicator_side: f64,
    ) -> Self {
        Self {
            chain,
            targets: TargetCache::new(),
            table: ContactTable::new(),
            input,
            capture,
            commands,
            running,
            ready,
            dims: initial_size,
            indicator_side,
            state: LoopState::Starting,
        }
    }

    fn enter(&mut self, state: LoopState) {
        log::debug!("[RenderLoop] {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Run until the stop flag clears.
    ///
    /// The readiness signal is raised exactly once, before the first
    /// iteration; resize and capture-policy callers park on it so they
    /// can never race device setup.
    pub(crate) fn run(&mut self) -> SurfaceResult<()> {
        self.enter(LoopState::Ready);
        self.ready.set();

        self.enter(LoopState::Running);
        while self.running.load(Ordering::Acquire) {
            self.run_iteration()?;
        }

        self.enter(LoopState::Stopping);
        // Dropping the command receiver disconnects any caller still
        // waiting on a rendezvous; they observe Shutdown instead of
        // blocking forever.
        self.enter(LoopState::Stopped);
        Ok(())
    }

    fn run_iteration(&mut self) -> SurfaceResult<()> {
        self.process_commands()?;
        self.input.pump(&mut self.table, &mut self.capture)?;
        self.chain.wait_frame();
        self.render_frame()
    }

    /// Execute all currently-queued cross-thread commands.
    fn process_commands(&mut self) -> SurfaceResult<()> {
        while let Ok(command) = self.commands.try_recv() {
            match command {
                Command::Resize { size, done } => {
                    let result = self.apply_resize(size);
                    let _ = done.send(());
                    result?;
                }
                Command::SetCaptureOnPress { enabled, done } => {
                    log::debug!("[RenderLoop] capture_on_press <- {}", enabled);
                    self.capture.set_policy(enabled);
                    let _ = done.send(());
                }
            }
        }
        Ok(())
    }

    fn apply_resize(&mut self, size: Size) -> SurfaceResult<()> {
        if size == self.dims {
            log::debug!(
                "[RenderLoop] Resize to unchanged {}x{} skipped",
                size.width,
                size.height
            );
            return Ok(());
        }

        // Every cached bitmap references a buffer that is about to be
        // replaced; the whole cache goes, not individual entries.
        self.targets.clear();
        self.chain.resize(size.to_buffer_extent())?;
        self.dims = size;

        log::info!(
            "[RenderLoop] Swap chain resized to {}x{}",
            size.width,
            size.height
        );
        Ok(())
    }

    fn render_frame(&mut self) -> SurfaceResult<()> {
        let indicators = build_indicators(&self.table, self.indicator_side);

        let chain = &mut self.chain;
        let targets = &mut self.targets;

        let buffer = chain.current_buffer()?;
        let target = targets.get_or_create(buffer, || chain.create_target(buffer))?;

        chain.draw(target, &indicators)?;
        chain.present()
    }

    #[cfg(test)]
    fn state(&self) -> LoopState {
        self.state
    }

    #[cfg(test)]
    fn dimensions(&self) -> Size {
        self.dims
    }

    #[cfg(test)]
    fn cached_targets(&self) -> usize {
        self.targets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::FramePacing;
    use crate::contact::DeviceKind;
    use crate::error::{ProtocolViolation, SurfaceError};
    use crate::geometry::Point;
    use crate::input::{InputInjector, NoCapture, PointerEvent};
    use crate::scene::Indicator;
    use crossbeam_channel::{bounded, unbounded};
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeState {
        frames: Vec<Vec<Indicator>>,
        targets_created: Vec<u32>,
        resizes: Vec<(u32, u32)>,
        presents: u32,
        buffer: u32,
    }

    /// In-memory chain; state is shared so tests can inspect it while
    /// the loop owns the chain.
    struct FakeChain {
        state: Arc<Mutex<FakeState>>,
    }

    impl FakeChain {
        fn new() -> (Self, Arc<Mutex<FakeState>>) {
            let state = Arc::new(Mutex::new(FakeState::default()));
            (
                Self {
                    state: state.clone(),
                },
                state,
            )
        }
    }

    impl PresentationChain for FakeChain {
        type Binding = &'static str;
        type Target = u32;

        fn binding(&self) -> &'static str {
            "fake-swap-chain"
        }

        fn pacing(&self) -> FramePacing {
            FramePacing::FixedTick(Duration::ZERO)
        }

        fn wait_frame(&mut self) {}

        fn current_buffer(&mut self) -> SurfaceResult<u32> {
            Ok(self.state.lock().buffer)
        }

        fn create_target(&mut self, buffer: u32) -> SurfaceResult<u32> {
            self.state.lock().targets_created.push(buffer);
            Ok(buffer)
        }

        fn draw(&mut self, _target: &u32, indicators: &[Indicator]) -> SurfaceResult<()> {
            self.state.lock().frames.push(indicators.to_vec());
            Ok(())
        }

        fn present(&mut self) -> SurfaceResult<()> {
            let mut state = self.state.lock();
            state.presents += 1;
            state.buffer = (state.buffer + 1) % 2;
            Ok(())
        }

        fn resize(&mut self, extent: (u32, u32)) -> SurfaceResult<()> {
            self.state.lock().resizes.push(extent);
            Ok(())
        }
    }

    struct Fixture {
        render_loop: RenderLoop<FakeChain>,
        chain_state: Arc<Mutex<FakeState>>,
        injector: InputInjector,
        commands: Sender<Command>,
        running: Arc<AtomicBool>,
        ready: Arc<ReadySignal>,
    }

    fn fixture() -> Fixture {
        let (chain, chain_state) = FakeChain::new();
        let (injector, source) = InputSource::channel();
        let (command_tx, command_rx) = unbounded();
        let running = Arc::new(AtomicBool::new(true));
        let ready = Arc::new(ReadySignal::new());

        let render_loop = RenderLoop::new(
            chain,
            source,
            CaptureController::new(Box::new(NoCapture), false),
            command_rx,
            running.clone(),
            ready.clone(),
            Size::new(800.0, 600.0),
            40.0,
        );

        Fixture {
            render_loop,
            chain_state,
            injector,
            commands: command_tx,
            running,
            ready,
        }
    }

    #[test]
    fn test_iteration_draws_current_contacts() {
        let mut fx = fixture();

        fx.injector.inject(PointerEvent::Entered {
            id: 1,
            device: DeviceKind::Touch,
            in_contact: false,
            position: Point::new(100.0, 100.0),
        });

        fx.render_loop.run_iteration().unwrap();

        let state = fx.chain_state.lock();
        assert_eq!(state.frames.len(), 1);
        assert_eq!(state.frames[0].len(), 1);
        assert_eq!(state.frames[0][0].rect.center(), Point::new(100.0, 100.0));
        assert_eq!(state.presents, 1);
    }

    #[test]
    fn test_targets_cached_per_buffer_index() {
        let mut fx = fixture();

        // Buffer flips 0 -> 1 -> 0; the third frame must reuse buffer
        // 0's cached target.
        for _ in 0..3 {
            fx.render_loop.run_iteration().unwrap();
        }

        let state = fx.chain_state.lock();
        assert_eq!(state.targets_created, vec![0, 1]);
        assert_eq!(fx.render_loop.cached_targets(), 2);
    }

    #[test]
    fn test_resize_to_same_size_is_noop() {
        let mut fx = fixture();

        // Populate the cache for both buffers.
        fx.render_loop.run_iteration().unwrap();
        fx.render_loop.run_iteration().unwrap();
        assert_eq!(fx.render_loop.cached_targets(), 2);

        let (done_tx, done_rx) = bounded(1);
        fx.commands
            .send(Command::Resize {
                size: Size::new(800.0, 600.0),
                done: done_tx,
            })
            .unwrap();
        fx.render_loop.run_iteration().unwrap();

        done_rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert!(fx.chain_state.lock().resizes.is_empty());
        // Cache survives a no-op resize: no target was recreated.
        assert_eq!(fx.render_loop.cached_targets(), 2);
        assert_eq!(fx.chain_state.lock().targets_created, vec![0, 1]);
        assert_eq!(fx.render_loop.dimensions(), Size::new(800.0, 600.0));
    }

    #[test]
    fn test_resize_clears_cache_and_updates_dimensions() {
        let mut fx = fixture();
        fx.render_loop.run_iteration().unwrap();
        fx.render_loop.run_iteration().unwrap();
        assert_eq!(fx.render_loop.cached_targets(), 2);

        let (done_tx, done_rx) = bounded(1);
        fx.commands
            .send(Command::Resize {
                size: Size::new(1024.0, 768.0),
                done: done_tx,
            })
            .unwrap();
        fx.render_loop.run_iteration().unwrap();

        done_rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(fx.chain_state.lock().resizes, vec![(1024, 768)]);
        assert_eq!(fx.render_loop.dimensions(), Size::new(1024.0, 768.0));

        // The iteration after the resize recreated a target for the
        // current buffer from scratch.
        let recreated = fx.chain_state.lock().targets_created.len();
        assert_eq!(recreated, 3);
    }

    #[test]
    fn test_capture_policy_command_applies() {
        let mut fx = fixture();

        let (done_tx, done_rx) = bounded(1);
        fx.commands
            .send(Command::SetCaptureOnPress {
                enabled: true,
                done: done_tx,
            })
            .unwrap();
        fx.render_loop.run_iteration().unwrap();
        done_rx.recv_timeout(Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn test_protocol_violation_aborts_iteration() {
        let mut fx = fixture();

        fx.injector.inject(PointerEvent::Pressed {
            id: 42,
            in_contact: true,
        });

        let err = fx.render_loop.run_iteration().unwrap_err();
        assert!(matches!(
            err,
            SurfaceError::Protocol(ProtocolViolation::UntrackedContact { id: 42, .. })
        ));
    }

    #[test]
    fn test_run_raises_readiness_and_stops_on_flag() {
        let mut fx = fixture();
        let ready = fx.ready.clone();
        let running = fx.running.clone();
        let chain_state = fx.chain_state.clone();

        assert_eq!(fx.render_loop.state(), LoopState::Starting);

        let worker = std::thread::spawn(move || {
            fx.render_loop.run().unwrap();
            fx.render_loop.state()
        });

        assert!(ready.wait_timeout(Duration::from_secs(5)), "loop never became ready");

        // Let it present at least one frame, then stop.
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while chain_state.lock().presents == 0 {
            assert!(std::time::Instant::now() < deadline, "no frame presented");
            std::thread::sleep(Duration::from_millis(1));
        }

        running.store(false, Ordering::Release);
        let final_state = worker.join().unwrap();
        assert_eq!(final_state, LoopState::Stopped);
    }
}
