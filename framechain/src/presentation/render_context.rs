/// RenderContext trait - backend-independent view of a window's swap chain
///
/// A render target driving a window only needs these operations, so it can
/// hold a `Box<dyn RenderContext>` whatever backend created it.

use crate::error::Result;
use crate::presentation::backend::PresentationBackend;
use crate::presentation::swap_chain::SwapChain;
use crate::presentation::types::{Extent2D, Format};

pub trait RenderContext {
    /// Present the current frame and acquire the next image
    fn present(&mut self) -> Result<()>;

    /// Change the vsync interval, `Ok(false)` if already active
    fn set_vsync_interval(&mut self, interval: u32) -> Result<bool>;

    /// Resize the swap buffers, `Ok(false)` if the extent is unchanged
    fn resize_buffers(&mut self, resolution: Extent2D) -> Result<bool>;

    fn resolution(&self) -> Extent2D;

    fn samples(&self) -> u32;

    fn color_format(&self) -> Format;

    fn depth_stencil_format(&self) -> Format;

    fn vsync_interval(&self) -> u32;
}

impl<B: PresentationBackend> RenderContext for SwapChain<B> {
    fn present(&mut self) -> Result<()> {
        SwapChain::present(self)
    }

    fn set_vsync_interval(&mut self, interval: u32) -> Result<bool> {
        self.set_presentation_interval(interval)
    }

    fn resize_buffers(&mut self, resolution: Extent2D) -> Result<bool> {
        self.resize(resolution)
    }

    fn resolution(&self) -> Extent2D {
        self.extent()
    }

    fn samples(&self) -> u32 {
        self.sample_count()
    }

    fn color_format(&self) -> Format {
        SwapChain::color_format(self)
    }

    fn depth_stencil_format(&self) -> Format {
        SwapChain::depth_stencil_format(self)
    }

    fn vsync_interval(&self) -> u32 {
        SwapChain::vsync_interval(self)
    }
}
