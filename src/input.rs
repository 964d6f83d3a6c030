//! Input source adapter.
//!
//! Pointer events reach the renderer through a dedicated channel instead
//! of the host UI's own event queue, so the render thread can pump input
//! without contending with the UI thread. The host keeps the
//! [`InputInjector`] and feeds it raw events; the render loop drains the
//! matching [`InputSource`] once per iteration, never blocking when the
//! queue is empty.

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::contact::{ContactTable, DeviceKind};
use crate::error::ProtocolViolation;
use crate::geometry::Point;

/// A raw pointer event as reported by the host input stack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Entered {
        id: u32,
        device: DeviceKind,
        in_contact: bool,
        position: Point,
    },
    Exited {
        id: u32,
    },
    Moved {
        id: u32,
        position: Point,
    },
    Pressed {
        id: u32,
        in_contact: bool,
    },
    Released {
        id: u32,
        in_contact: bool,
    },
}

/// Host-side sender half of the input queue. Cheap to clone.
#[derive(Clone)]
pub struct InputInjector {
    tx: Sender<PointerEvent>,
}

impl InputInjector {
    /// Deliver an event to the renderer.
    ///
    /// Returns true when the event was accepted; the host should then
    /// mark the event as handled so it does not bubble further. False
    /// means the renderer has shut down and the host should fall back to
    /// its default routing.
    pub fn inject(&self, event: PointerEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Render-side receiver half of the input queue.
pub struct InputSource {
    rx: Receiver<PointerEvent>,
}

impl InputSource {
    /// Create a connected injector/source pair.
    pub fn channel() -> (InputInjector, InputSource) {
        let (tx, rx) = unbounded();
        (InputInjector { tx }, InputSource { rx })
    }

    /// Drain all currently-queued events into the contact table.
    ///
    /// Processes only events already in the queue; never blocks waiting
    /// for more. Must be called from the render thread only.
    pub fn pump(
        &self,
        table: &mut ContactTable,
        capture: &mut CaptureController,
    ) -> Result<(), ProtocolViolation> {
        for event in self.rx.try_iter() {
            apply_event(table, capture, event)?;
        }
        Ok(())
    }
}

/// Apply one pointer event to the contact table.
///
/// This is the per-event handler body from the adapter registration:
/// runs on the render thread, updates the table, and drives the capture
/// policy on press/release transitions.
pub fn apply_event(
    table: &mut ContactTable,
    capture: &mut CaptureController,
    event: PointerEvent,
) -> Result<(), ProtocolViolation> {
    match event {
        PointerEvent::Entered {
            id,
            device,
            in_contact,
            position,
        } => table.entered(id, device, in_contact, position),
        PointerEvent::Exited { id } => {
            table.exited(id);
            Ok(())
        }
        PointerEvent::Moved { id, position } => table.moved(id, position),
        PointerEvent::Pressed { id, in_contact } => {
            table.pressed(id, in_contact)?;
            capture.on_pressed();
            Ok(())
        }
        PointerEvent::Released { id, in_contact } => {
            table.released(id, in_contact)?;
            capture.on_released(table.pressed_count());
            Ok(())
        }
    }
}

/// Exclusive-capture operations provided by the host input stack.
///
/// Acquiring routes all subsequent pointer events to this input source
/// regardless of on-screen position; releasing restores normal routing.
pub trait PointerCapture: Send {
    fn acquire(&mut self);
    fn release(&mut self);
}

/// Capture backend for hosts without exclusive-capture support.
pub struct NoCapture;

impl PointerCapture for NoCapture {
    fn acquire(&mut self) {}
    fn release(&mut self) {}
}

/// Tracks the capture-on-press policy and whether capture is held.
///
/// Owned by the render thread; the policy flag is only ever changed via
/// the cross-thread rendezvous, so no locking is needed here.
pub struct CaptureController {
    backend: Box<dyn PointerCapture>,
    capture_on_press: bool,
    held: bool,
}

impl CaptureController {
    pub fn new(backend: Box<dyn PointerCapture>, capture_on_press: bool) -> Self {
        Self {
            backend,
            capture_on_press,
            held: false,
        }
    }

    /// Update the capture-on-press policy. Disabling releases any capture
    /// currently held.
    pub fn set_policy(&mut self, enabled: bool) {
        self.capture_on_press = enabled;
        if !enabled && self.held {
            log::debug!("[Capture] Policy disabled, releasing held capture");
            self.backend.release();
            self.held = false;
        }
    }

    /// A contact was pressed: acquire capture if the policy wants it and
    /// none is held yet.
    pub fn on_pressed(&mut self) {
        if self.capture_on_press && !self.held {
            self.backend.acquire();
            self.held = true;
        }
    }

    /// A contact was released: drop capture once no pressed contacts
    /// remain.
    pub fn on_released(&mut self, pressed_remaining: usize) {
        if self.held && pressed_remaining == 0 {
            self.backend.release();
            self.held = false;
        }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }
}
