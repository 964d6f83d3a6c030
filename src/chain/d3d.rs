//! Direct3D 11 / DXGI / Direct2D presentation chain.
//!
//! A hardware D3D11 device drives a flip-sequential composition swap
//! chain; Direct2D draws the contact indicators straight into the
//! current backbuffer through a cached per-buffer bitmap. The swap chain
//! handle is handed to the host panel's native presentation slot (for
//! DirectComposition hosts, see [`bind_to_visual`]).
//!
//! Everything here runs on the render thread only; the one value that
//! leaves it is the [`SwapChainHandle`].

use std::mem::ManuallyDrop;
use std::thread;

use windows::core::Interface;
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::Graphics::Direct2D::Common::{
    D2D1_ALPHA_MODE_PREMULTIPLIED, D2D1_COLOR_F, D2D1_PIXEL_FORMAT, D2D_RECT_F,
};
use windows::Win32::Graphics::Direct2D::{
    D2D1CreateFactory, ID2D1Bitmap1, ID2D1Device, ID2D1DeviceContext, ID2D1Factory1, ID2D1Image,
    ID2D1SolidColorBrush, D2D1_BITMAP_OPTIONS_CANNOT_DRAW, D2D1_BITMAP_OPTIONS_TARGET,
    D2D1_BITMAP_PROPERTIES1, D2D1_DEVICE_CONTEXT_OPTIONS_NONE, D2D1_FACTORY_TYPE_SINGLE_THREADED,
};
use windows::Win32::Graphics::Direct3D::D3D_DRIVER_TYPE_HARDWARE;
use windows::Win32::Graphics::Direct3D11::{
    D3D11CreateDevice, ID3D11Device, D3D11_CREATE_DEVICE_BGRA_SUPPORT, D3D11_CREATE_DEVICE_DEBUG,
    D3D11_SDK_VERSION,
};
use windows::Win32::Graphics::DirectComposition::IDCompositionVisual;
use windows::Win32::Graphics::Dxgi::Common::{
    DXGI_ALPHA_MODE_PREMULTIPLIED, DXGI_FORMAT_B8G8R8A8_UNORM, DXGI_FORMAT_UNKNOWN,
    DXGI_SAMPLE_DESC,
};
use windows::Win32::Graphics::Dxgi::{
    CreateDXGIFactory2, IDXGIDevice, IDXGIFactory2, IDXGISurface, IDXGISwapChain1,
    IDXGISwapChain2, IDXGISwapChain3, DXGI_CREATE_FACTORY_FLAGS, DXGI_PRESENT,
    DXGI_SCALING_STRETCH, DXGI_SWAP_CHAIN_DESC1, DXGI_SWAP_CHAIN_FLAG,
    DXGI_SWAP_CHAIN_FLAG_FRAME_LATENCY_WAITABLE_OBJECT, DXGI_SWAP_EFFECT_FLIP_SEQUENTIAL,
    DXGI_USAGE_RENDER_TARGET_OUTPUT,
};
use windows::Win32::System::Threading::WaitForSingleObjectEx;

use super::{FramePacing, PresentationChain, FIXED_FRAME_TICK};
use crate::config::PacingMode;
use crate::error::{SurfaceError, SurfaceResult};
use crate::scene::{Color, Indicator, Palette};

/// Double-buffered flip chain.
const BUFFER_COUNT: u32 = 2;

/// Upper bound on one frame-latency wait; a stalled compositor must not
/// wedge the loop past the stop flag check.
const FRAME_WAIT_TIMEOUT_MS: u32 = 1000;

/// Opaque swap-chain handle for the host panel's presentation slot.
#[derive(Clone)]
pub struct SwapChainHandle(IDXGISwapChain1);

// SAFETY: DXGI swap chains are free-threaded COM objects; the handle only
// crosses to the UI context for the single SetSwapChain/SetContent call
// and all rendering calls stay on the render thread.
unsafe impl Send for SwapChainHandle {}

/// Set the swap chain as the content of a DirectComposition visual.
///
/// Helper for hosts whose presentation slot is a composition visual.
/// Must be called on the host UI context, once, before the first present.
pub fn bind_to_visual(visual: &IDCompositionVisual, handle: &SwapChainHandle) -> Result<(), String> {
    unsafe {
        visual
            .SetContent(&handle.0)
            .map_err(|e| format!("Failed to set swap chain as visual content: {e}"))
    }
}

/// D3D11 device + DXGI composition swap chain + Direct2D context.
pub struct D3dPresentationChain {
    _d3d_device: ID3D11Device,
    swap_chain: IDXGISwapChain1,
    /// Present variant exposing the current backbuffer index; absent on
    /// systems without IDXGISwapChain3.
    swap_chain3: Option<IDXGISwapChain3>,
    /// Frame-latency waitable, owned; invalid when pacing is FixedTick.
    frame_waitable: HANDLE,
    _d2d_device: ID2D1Device,
    d2d_context: ID2D1DeviceContext,
    hover_brush: ID2D1SolidColorBrush,
    pressed_brush: ID2D1SolidColorBrush,
    background: D2D1_COLOR_F,
    pacing: FramePacing,
    /// Creation flags; ResizeBuffers must repeat them exactly.
    swap_chain_flags: u32,
}

fn d2d_color(color: Color) -> D2D1_COLOR_F {
    D2D1_COLOR_F {
        r: color.r,
        g: color.g,
        b: color.b,
        a: color.a,
    }
}

impl D3dPresentationChain {
    /// Create the device, swap chain, drawing context, and brushes.
    ///
    /// Runs on the render thread, exactly once per renderer, before the
    /// render loop starts. Every failure here is fatal to startup.
    pub fn new(extent: (u32, u32), palette: &Palette, pacing: PacingMode) -> SurfaceResult<Self> {
        let (width, height) = extent;

        unsafe {
            // D3D11 hardware device
            let mut d3d_flags = D3D11_CREATE_DEVICE_BGRA_SUPPORT;
            if cfg!(debug_assertions) {
                d3d_flags |= D3D11_CREATE_DEVICE_DEBUG;
            }

            let mut device: Option<ID3D11Device> = None;
            D3D11CreateDevice(
                None,
                D3D_DRIVER_TYPE_HARDWARE,
                None,
                d3d_flags,
                None,
                D3D11_SDK_VERSION,
                Some(&mut device),
                None,
                None,
            )
            .map_err(|e| SurfaceError::Setup(format!("D3D11 device creation failed: {e}")))?;
            let d3d_device =
                device.ok_or_else(|| SurfaceError::Setup("D3D11 device was not returned".into()))?;

            // DXGI swap chain for composition
            let dxgi_device: IDXGIDevice = d3d_device
                .cast()
                .map_err(|e| SurfaceError::Setup(format!("IDXGIDevice cast failed: {e}")))?;
            let factory: IDXGIFactory2 = CreateDXGIFactory2(DXGI_CREATE_FACTORY_FLAGS(0))
                .map_err(|e| SurfaceError::Setup(format!("DXGI factory creation failed: {e}")))?;

            let swap_chain_flags = match pacing {
                PacingMode::LowLatency => {
                    DXGI_SWAP_CHAIN_FLAG_FRAME_LATENCY_WAITABLE_OBJECT.0 as u32
                }
                PacingMode::FixedTick => 0,
            };

            let desc = DXGI_SWAP_CHAIN_DESC1 {
                Width: width.max(1),
                Height: height.max(1),
                Format: DXGI_FORMAT_B8G8R8A8_UNORM,
                Stereo: false.into(),
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: 1,
                    Quality: 0,
                },
                BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
                BufferCount: BUFFER_COUNT,
                Scaling: DXGI_SCALING_STRETCH,
                SwapEffect: DXGI_SWAP_EFFECT_FLIP_SEQUENTIAL,
                AlphaMode: DXGI_ALPHA_MODE_PREMULTIPLIED,
                Flags: swap_chain_flags,
            };

            let swap_chain = factory
                .CreateSwapChainForComposition(&dxgi_device, &desc, None)
                .map_err(|e| SurfaceError::Setup(format!("Swap chain creation failed: {e}")))?;

            // Frame-latency waitable: bounds queued frames to one, so input
            // drained at the top of the loop lands in the very next frame.
            let (frame_waitable, pacing) = match pacing {
                PacingMode::LowLatency => match swap_chain.cast::<IDXGISwapChain2>() {
                    Ok(swap_chain2) => {
                        swap_chain2.SetMaximumFrameLatency(1).map_err(|e| {
                            SurfaceError::Setup(format!("SetMaximumFrameLatency failed: {e}"))
                        })?;
                        let waitable = swap_chain2.GetFrameLatencyWaitableObject();
                        if waitable.is_invalid() {
                            log::warn!(
                                "[D3dChain] No frame-latency waitable, using fixed tick"
                            );
                            (HANDLE::default(), FramePacing::FixedTick(FIXED_FRAME_TICK))
                        } else {
                            (waitable, FramePacing::GpuPaced)
                        }
                    }
                    Err(_) => {
                        log::warn!("[D3dChain] IDXGISwapChain2 unavailable, using fixed tick");
                        (HANDLE::default(), FramePacing::FixedTick(FIXED_FRAME_TICK))
                    }
                },
                PacingMode::FixedTick => {
                    (HANDLE::default(), FramePacing::FixedTick(FIXED_FRAME_TICK))
                }
            };

            let swap_chain3 = swap_chain.cast::<IDXGISwapChain3>().ok();

            // Direct2D context on top of the same device
            let d2d_factory: ID2D1Factory1 =
                D2D1CreateFactory(D2D1_FACTORY_TYPE_SINGLE_THREADED, None)
                    .map_err(|e| SurfaceError::Setup(format!("D2D factory creation failed: {e}")))?;
            let d2d_device = d2d_factory
                .CreateDevice(&dxgi_device)
                .map_err(|e| SurfaceError::Setup(format!("D2D device creation failed: {e}")))?;
            let d2d_context = d2d_device
                .CreateDeviceContext(D2D1_DEVICE_CONTEXT_OPTIONS_NONE)
                .map_err(|e| SurfaceError::Setup(format!("D2D context creation failed: {e}")))?;

            // Solid-color brushes for the two contact states
            let hover_brush = d2d_context
                .CreateSolidColorBrush(&d2d_color(palette.hover), None)
                .map_err(|e| SurfaceError::Setup(format!("Hover brush creation failed: {e}")))?;
            let pressed_brush = d2d_context
                .CreateSolidColorBrush(&d2d_color(palette.pressed), None)
                .map_err(|e| SurfaceError::Setup(format!("Pressed brush creation failed: {e}")))?;

            log::info!(
                "[D3dChain] Initialized {}x{} ({:?})",
                width.max(1),
                height.max(1),
                pacing
            );

            Ok(Self {
                _d3d_device: d3d_device,
                swap_chain,
                swap_chain3,
                frame_waitable,
                _d2d_device: d2d_device,
                d2d_context,
                hover_brush,
                pressed_brush,
                background: d2d_color(palette.background),
                pacing,
                swap_chain_flags,
            })
        }
    }
}

impl PresentationChain for D3dPresentationChain {
    type Binding = SwapChainHandle;
    type Target = ID2D1Bitmap1;

    fn binding(&self) -> SwapChainHandle {
        SwapChainHandle(self.swap_chain.clone())
    }

    fn pacing(&self) -> FramePacing {
        self.pacing
    }

    fn wait_frame(&mut self) {
        match self.pacing {
            FramePacing::GpuPaced => unsafe {
                WaitForSingleObjectEx(self.frame_waitable, FRAME_WAIT_TIMEOUT_MS, false);
            },
            FramePacing::FixedTick(tick) => thread::sleep(tick),
        }
    }

    fn current_buffer(&mut self) -> SurfaceResult<u32> {
        // Without IDXGISwapChain3 the index is unobservable; buffer 0 is
        // the flip-sequential "current" buffer.
        Ok(self
            .swap_chain3
            .as_ref()
            .map(|sc| unsafe { sc.GetCurrentBackBufferIndex() })
            .unwrap_or(0))
    }

    fn create_target(&mut self, buffer: u32) -> SurfaceResult<ID2D1Bitmap1> {
        unsafe {
            let surface: IDXGISurface = self
                .swap_chain
                .GetBuffer(buffer)
                .map_err(|e| SurfaceError::Render(format!("GetBuffer({buffer}) failed: {e}")))?;

            let props = D2D1_BITMAP_PROPERTIES1 {
                pixelFormat: D2D1_PIXEL_FORMAT {
                    format: DXGI_FORMAT_B8G8R8A8_UNORM,
                    alphaMode: D2D1_ALPHA_MODE_PREMULTIPLIED,
                },
                dpiX: 96.0,
                dpiY: 96.0,
                bitmapOptions: D2D1_BITMAP_OPTIONS_TARGET | D2D1_BITMAP_OPTIONS_CANNOT_DRAW,
                colorContext: ManuallyDrop::new(None),
            };

            self.d2d_context
                .CreateBitmapFromDxgiSurface(&surface, Some(&props))
                .map_err(|e| {
                    SurfaceError::Render(format!("Backbuffer bitmap creation failed: {e}"))
                })
        }
    }

    fn draw(&mut self, target: &ID2D1Bitmap1, indicators: &[Indicator]) -> SurfaceResult<()> {
        unsafe {
            self.d2d_context.SetTarget(target);
            self.d2d_context.BeginDraw();

            self.d2d_context.Clear(Some(&self.background));

            for indicator in indicators {
                let rect = D2D_RECT_F {
                    left: indicator.rect.left as f32,
                    top: indicator.rect.top as f32,
                    right: indicator.rect.right as f32,
                    bottom: indicator.rect.bottom as f32,
                };
                let brush = if indicator.pressed {
                    &self.pressed_brush
                } else {
                    &self.hover_brush
                };
                self.d2d_context.FillRectangle(&rect, brush);
            }

            self.d2d_context
                .EndDraw(None, None)
                .map_err(|e| SurfaceError::Render(format!("EndDraw failed: {e}")))
        }
    }

    fn present(&mut self) -> SurfaceResult<()> {
        unsafe {
            self.swap_chain
                .Present(0, DXGI_PRESENT(0))
                .ok()
                .map_err(|e| SurfaceError::Render(format!("Present failed: {e}")))
        }
    }

    fn resize(&mut self, extent: (u32, u32)) -> SurfaceResult<()> {
        let (width, height) = extent;
        unsafe {
            // The context may still reference a backbuffer bitmap; DXGI
            // refuses to resize while any buffer reference is alive.
            self.d2d_context.SetTarget(None::<&ID2D1Image>);

            self.swap_chain
                .ResizeBuffers(
                    BUFFER_COUNT,
                    width.max(1),
                    height.max(1),
                    DXGI_FORMAT_UNKNOWN,
                    DXGI_SWAP_CHAIN_FLAG(self.swap_chain_flags as i32),
                )
                .map_err(|e| SurfaceError::Render(format!("ResizeBuffers failed: {e}")))
        }
    }
}

impl Drop for D3dPresentationChain {
    fn drop(&mut self) {
        unsafe {
            self.d2d_context.SetTarget(None::<&ID2D1Image>);
            if !self.frame_waitable.is_invalid() {
                let _ = CloseHandle(self.frame_waitable);
            }
        }
        log::debug!("[D3dChain] Released");
    }
}
