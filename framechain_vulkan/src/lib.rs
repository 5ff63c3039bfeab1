/*!
# Framechain - Vulkan Backend

Vulkan implementation of the framechain `PresentationBackend` trait.

This crate provides the native objects behind `framechain::SwapChain` using
the Ash library for Vulkan bindings, ash-window for per-platform surface
creation and gpu-allocator for the memory of off-screen attachments.

```no_run
use std::sync::Arc;
use framechain::{BackendConfig, SwapChain, SwapChainDescriptor};
use framechain_vulkan::VulkanBackend;
# fn run(window: Arc<winit::window::Window>) -> framechain::Result<()> {
let backend = Arc::new(VulkanBackend::new(window.as_ref(), BackendConfig::default())?);
let mut swap_chain = SwapChain::new(backend, window, SwapChainDescriptor::default())?;
swap_chain.present()?;
# Ok(())
# }
```
*/

mod debug;
mod vulkan_backend;
mod vulkan_format;
mod vulkan_frame_buffer;
mod vulkan_image;
mod vulkan_render_pass;
mod vulkan_surface;
mod vulkan_swapchain;
mod vulkan_sync;

pub use debug::ValidationStats;
pub use vulkan_backend::VulkanBackend;
pub use vulkan_frame_buffer::Framebuffer;
pub use vulkan_image::{AttachmentImage, ImageView};
pub use vulkan_render_pass::RenderPass;
pub use vulkan_surface::Surface;
pub use vulkan_swapchain::Swapchain;
pub use vulkan_sync::Semaphore;
