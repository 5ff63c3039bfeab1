/// Framebuffer - RAII VkFramebuffer
///
/// Binds the swap-chain image view and the off-screen attachments of one
/// swap-chain image to the render-pass slots.

use ash::vk;
use framechain::presentation::Extent2D;

/// Vulkan framebuffer, destroyed when dropped
pub struct Framebuffer {
    /// Vulkan framebuffer handle
    pub(crate) framebuffer: vk::Framebuffer,
    extent: Extent2D,
    /// Vulkan device (for cleanup)
    device: ash::Device,
}

impl Framebuffer {
    pub(crate) fn new(framebuffer: vk::Framebuffer, extent: Extent2D, device: ash::Device) -> Self {
        Self { framebuffer, extent, device }
    }

    /// Raw handle, for `vkCmdBeginRenderPass`
    pub fn handle(&self) -> vk::Framebuffer {
        self.framebuffer
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}
