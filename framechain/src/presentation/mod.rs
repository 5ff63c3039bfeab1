/// Presentation module - swap chain, render passes and the backend boundary

pub mod types;
pub mod selection;
pub mod render_pass;
pub mod backend;
pub mod surface;
pub mod swap_chain;
pub mod render_context;

#[cfg(test)]
pub mod mock_backend;

pub use types::{
    ColorSpace, Extent2D, Format, FormatAspects, PresentMode, QueueFamilies, SharingMode,
    SurfaceCapabilities, SurfaceFormat, SurfaceTransform,
};
pub use render_pass::{
    attachment_slots, AttachmentDescriptor, AttachmentSlot, LoadOp, RenderPassDescriptor,
    RenderPassKind, StoreOp,
};
pub use backend::{
    AttachmentBufferDescriptor, AttachmentKind, FramebufferAttachment, PresentationBackend,
    SwapChainCreateInfo,
};
pub use surface::{NativeHandle, WindowSurface};
pub use swap_chain::{SwapChain, SwapChainStatus};
pub use render_context::RenderContext;
