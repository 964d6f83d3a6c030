//! Pointer-visualization surface composited into a host UI panel.
//!
//! Tracks touch/pen/mouse contacts and renders a colored indicator at
//! each live contact position through a hardware swap chain, driven by a
//! dedicated render thread. The host UI owns the panel; this crate owns
//! the device, the swap chain, the contact table, and the loop.
//!
//! ## Components
//! - `contact`: in-memory table of active contacts
//! - `input`: cross-thread pointer-event ingestion and capture policy
//! - `chain`: graphics device + swap chain + drawing context seam
//! - `render_loop`: the dedicated off-UI-thread render loop
//! - `renderer`: public handle (spawn, resize, capture attribute, drop)
//! - `host`: the trait the embedding UI implements
//! - `config`: palette, indicator size, pacing, capture default

pub mod chain;
pub mod config;
pub mod contact;
pub mod error;
pub mod geometry;
pub mod host;
pub mod input;
pub mod logging;
mod render_loop;
pub mod renderer;
pub mod scene;
pub mod sync;

pub use chain::{FramePacing, PresentationChain, TargetCache, FIXED_FRAME_TICK};
pub use config::{PacingMode, SurfaceConfig};
pub use contact::{Contact, ContactTable, DeviceKind};
pub use error::{ProtocolViolation, SurfaceError, SurfaceResult};
pub use geometry::{Point, Rect, Size};
pub use host::HostPanel;
pub use input::{
    CaptureController, InputInjector, InputSource, NoCapture, PointerCapture, PointerEvent,
};
pub use renderer::{capture_on_press_attribute, AttributeRegistration, PointerRenderer};
pub use scene::{build_indicators, Color, Indicator, Palette, INDICATOR_SIDE};
pub use sync::ReadySignal;

#[cfg(windows)]
pub use chain::d3d::{bind_to_visual, D3dPresentationChain, SwapChainHandle};
