/// WindowSurface trait - the windowing collaborator seen by the swap chain

use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};
use winit::window::{Fullscreen, Window};

use crate::error::{Error, Result};
use crate::presentation::types::Extent2D;

/// Raw platform handles needed to create a native presentation surface
#[derive(Debug, Clone, Copy)]
pub struct NativeHandle {
    pub window: RawWindowHandle,
    pub display: RawDisplayHandle,
}

/// A window the swap chain can present into
///
/// The swap chain keeps the window alive for its whole lifetime and asks for
/// fresh handles every time the native surface is recreated.
pub trait WindowSurface: Send + Sync {
    /// Raw window and display handles
    fn native_handle(&self) -> Result<NativeHandle>;

    /// Current size of the drawable area in pixels
    fn content_extent(&self) -> Extent2D;

    /// Switch between windowed and borderless fullscreen
    fn set_fullscreen(&self, fullscreen: bool);
}

impl WindowSurface for Window {
    fn native_handle(&self) -> Result<NativeHandle> {
        let window = self
            .window_handle()
            .map_err(|e| Error::InitializationFailed(format!("Window handle unavailable: {}", e)))?
            .as_raw();
        let display = self
            .display_handle()
            .map_err(|e| Error::InitializationFailed(format!("Display handle unavailable: {}", e)))?
            .as_raw();

        Ok(NativeHandle { window, display })
    }

    fn content_extent(&self) -> Extent2D {
        let size = self.inner_size();
        Extent2D::new(size.width, size.height)
    }

    fn set_fullscreen(&self, fullscreen: bool) {
        let mode = fullscreen.then_some(Fullscreen::Borderless(None));
        Window::set_fullscreen(self, mode);
    }
}
