//! Pointer renderer: the public handle owning the render thread.
//!
//! Construction spawns the dedicated render thread, which creates the
//! presentation chain, rendezvouses onto the host UI context to bind the
//! swap chain, and then runs the render loop until the handle is
//! dropped. All UI-facing operations (size changes, the capture-on-press
//! attribute) are forwarded onto the render thread as one-shot
//! rendezvous commands; none of them touch render state directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use lazy_static::lazy_static;

use crate::chain::PresentationChain;
use crate::config::SurfaceConfig;
use crate::error::{SurfaceError, SurfaceResult};
use crate::geometry::Size;
use crate::host::HostPanel;
use crate::input::{CaptureController, InputInjector, InputSource, PointerCapture};
use crate::render_loop::{Command, RenderLoop};
use crate::sync::ReadySignal;

#[cfg(windows)]
use crate::chain::d3d::{D3dPresentationChain, SwapChainHandle};

/// Metadata for a host-bindable attribute.
pub struct AttributeRegistration {
    pub name: &'static str,
    pub default: bool,
}

lazy_static! {
    /// Process-wide, one-time registration of the capture-on-press
    /// attribute surfaced to declarative host configuration.
    static ref CAPTURE_ON_PRESS_ATTRIBUTE: AttributeRegistration = AttributeRegistration {
        name: "CaptureInputOnPress",
        default: false,
    };
}

/// The registered capture-on-press attribute metadata.
pub fn capture_on_press_attribute() -> &'static AttributeRegistration {
    &CAPTURE_ON_PRESS_ATTRIBUTE
}

/// A pointer-visualization surface bound to one host panel.
///
/// Dropping the renderer stops the render loop cooperatively and joins
/// the render thread before any GPU resource is released.
pub struct PointerRenderer {
    injector: InputInjector,
    commands: Sender<Command>,
    running: Arc<AtomicBool>,
    ready: Arc<ReadySignal>,
    capture_on_press: Arc<AtomicBool>,
    panel_size: Box<dyn Fn() -> Size + Send + Sync>,
    thread: Option<JoinHandle<()>>,
}

impl PointerRenderer {
    /// Spawn a renderer over an arbitrary presentation chain.
    ///
    /// `make_chain` runs on the render thread with the initial buffer
    /// extent; chain creation failures abort startup.
    pub fn spawn<C, H, F>(
        host: Arc<H>,
        config: SurfaceConfig,
        capture: Box<dyn PointerCapture>,
        make_chain: F,
    ) -> SurfaceResult<Self>
    where
        C: PresentationChain + 'static,
        H: HostPanel<C::Binding>,
        F: FnOnce((u32, u32)) -> SurfaceResult<C> + Send + 'static,
    {
        let attribute = capture_on_press_attribute();
        log::debug!(
            "[PointerRenderer] Attribute '{}' registered (default {})",
            attribute.name,
            attribute.default
        );

        let (injector, source) = InputSource::channel();
        let (command_tx, command_rx) = unbounded();
        let running = Arc::new(AtomicBool::new(true));
        let ready = Arc::new(ReadySignal::new());
        let capture_on_press = Arc::new(AtomicBool::new(config.capture_on_press));

        let size_host = Arc::clone(&host);
        let panel_size: Box<dyn Fn() -> Size + Send + Sync> = Box::new(move || size_host.size());

        let thread = thread::Builder::new()
            .name("pointer-render".into())
            .spawn({
                let running = Arc::clone(&running);
                let ready = Arc::clone(&ready);
                move || {
                    if let Err(e) = render_thread_main(
                        host, config, capture, make_chain, source, command_rx, running, ready,
                    ) {
                        log::error!("[PointerRenderer] Fatal render-loop error: {}", e);
                        // No supervisory restart exists; a broken loop
                        // takes the process down.
                        std::process::abort();
                    }
                }
            })
            .map_err(|e| SurfaceError::Setup(format!("Failed to spawn render thread: {e}")))?;

        Ok(Self {
            injector,
            commands: command_tx,
            running,
            ready,
            capture_on_press,
            panel_size,
            thread: Some(thread),
        })
    }

    /// Spawn a renderer over the Direct3D/Direct2D chain.
    #[cfg(windows)]
    pub fn spawn_d3d<H>(
        host: Arc<H>,
        config: SurfaceConfig,
        capture: Box<dyn PointerCapture>,
    ) -> SurfaceResult<Self>
    where
        H: HostPanel<SwapChainHandle>,
    {
        let palette = config.palette;
        let pacing = config.pacing;
        Self::spawn(host, config, capture, move |extent| {
            D3dPresentationChain::new(extent, &palette, pacing)
        })
    }

    /// Sender half of the input queue, for the host input stack.
    pub fn injector(&self) -> InputInjector {
        self.injector.clone()
    }

    /// Block until device setup has completed and the loop is running.
    pub fn wait_until_ready(&self) {
        self.ready.wait();
    }

    /// Reconcile a host-reported size change with the swap chain.
    ///
    /// Reads the panel's current size, waits for render-loop readiness,
    /// then blocks until the render thread has applied the resize (a
    /// no-op when the dimensions are unchanged). Must not be called from
    /// inside the UI dispatch task that performs the swap-chain binding.
    pub fn notify_size_changed(&self) -> SurfaceResult<()> {
        let size = (self.panel_size)();
        self.ready.wait();
        self.rendezvous(|done| Command::Resize { size, done })
    }

    /// Set the capture-on-press attribute.
    ///
    /// Waits for readiness and blocks until the render thread has stored
    /// the flag; disabling also releases any currently held capture.
    pub fn set_capture_on_press(&self, enabled: bool) -> SurfaceResult<()> {
        self.ready.wait();
        self.rendezvous(|done| Command::SetCaptureOnPress { enabled, done })?;
        self.capture_on_press.store(enabled, Ordering::Release);
        Ok(())
    }

    /// Current value of the capture-on-press attribute.
    pub fn capture_on_press(&self) -> bool {
        self.capture_on_press.load(Ordering::Acquire)
    }

    /// Schedule one command onto the render thread and block until it
    /// has been executed.
    fn rendezvous(&self, command: impl FnOnce(Sender<()>) -> Command) -> SurfaceResult<()> {
        let (done_tx, done_rx) = bounded(1);
        self.commands
            .send(command(done_tx))
            .map_err(|_| SurfaceError::Shutdown)?;
        done_rx.recv().map_err(|_| SurfaceError::Shutdown)
    }
}

impl Drop for PointerRenderer {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            // The loop observes the flag within one frame interval; GPU
            // resources unwind on the render thread after the final
            // iteration, never concurrently with this join.
            if thread.join().is_err() {
                log::error!("[PointerRenderer] Render thread panicked during shutdown");
            }
        }
    }
}

/// Render-thread entry: device setup, panel binding, then the loop.
#[allow(clippy::too_many_arguments)]
fn render_thread_main<C, H, F>(
    host: Arc<H>,
    config: SurfaceConfig,
    capture: Box<dyn PointerCapture>,
    make_chain: F,
    source: InputSource,
    commands: Receiver<Command>,
    running: Arc<AtomicBool>,
    ready: Arc<ReadySignal>,
) -> SurfaceResult<()>
where
    C: PresentationChain,
    H: HostPanel<C::Binding>,
    F: FnOnce((u32, u32)) -> SurfaceResult<C>,
{
    let initial_size = host.size();
    log::debug!(
        "[PointerRenderer] Starting at {}x{}",
        initial_size.width,
        initial_size.height
    );

    let chain = make_chain(initial_size.to_buffer_extent())?;
    bind_to_panel(&host, &chain)?;

    let controller = CaptureController::new(capture, config.capture_on_press);
    let mut render_loop = RenderLoop::new(
        chain,
        source,
        controller,
        commands,
        running,
        ready,
        initial_size,
        config.indicator_side,
    );
    render_loop.run()
}

/// Rendezvous onto the host UI context for the single call that hands
/// the swap chain to the panel's native presentation slot.
fn bind_to_panel<C, H>(host: &Arc<H>, chain: &C) -> SurfaceResult<()>
where
    C: PresentationChain,
    H: HostPanel<C::Binding>,
{
    let (done_tx, done_rx) = bounded(1);
    let binding = chain.binding();
    let ui_host = Arc::clone(host);

    host.dispatch_on_ui(Box::new(move || {
        let result = ui_host.bind_swap_chain(binding);
        let _ = done_tx.send(result);
    }));

    match done_rx.recv() {
        Ok(Ok(())) => {
            log::debug!("[PointerRenderer] Swap chain bound to host panel");
            Ok(())
        }
        Ok(Err(e)) => Err(SurfaceError::Setup(format!("Swap-chain binding failed: {e}"))),
        Err(_) => Err(SurfaceError::Setup(
            "Host UI context dropped the binding task".into(),
        )),
    }
}
