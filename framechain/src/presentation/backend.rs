/// PresentationBackend trait - the native boundary of the swap chain
///
/// A backend bundles the collaborators the swap chain needs from the native
/// API: the device and its queues, the surface-capability prober, the
/// per-platform surface factory and the memory manager backing off-screen
/// attachments. Every handle type is owned: dropping it destroys the native
/// object, so the swap chain controls teardown order through ownership alone.

use crate::error::Result;
use crate::presentation::render_pass::{AttachmentSlot, RenderPassDescriptor};
use crate::presentation::surface::WindowSurface;
use crate::presentation::types::{
    Extent2D, Format, PresentMode, QueueFamilies, SharingMode, SurfaceCapabilities,
    SurfaceFormat, SurfaceTransform,
};

/// Parameters for creating a native swap chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapChainCreateInfo {
    /// Minimum number of images (the backend may grant more)
    pub min_image_count: u32,
    /// Image format and color space
    pub surface_format: SurfaceFormat,
    /// Image extent
    pub extent: Extent2D,
    /// Present mode
    pub present_mode: PresentMode,
    /// Pre-transform, taken from the surface capabilities
    pub transform: SurfaceTransform,
    /// Queue family sharing
    pub sharing: SharingMode,
}

/// Role of an off-screen attachment buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    /// Depth-stencil buffer shared by all swap-chain images
    DepthStencil,
    /// Multisample color buffer resolved into a swap-chain image
    MultisampleColor,
}

/// Descriptor for an off-screen attachment buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentBufferDescriptor {
    pub kind: AttachmentKind,
    pub format: Format,
    pub samples: u32,
    pub extent: Extent2D,
}

/// One framebuffer attachment, in render-pass slot order
pub enum FramebufferAttachment<'a, B: PresentationBackend + ?Sized> {
    SwapChainImage(&'a B::ImageView),
    DepthStencil(&'a B::AttachmentBuffer),
    Multisample(&'a B::AttachmentBuffer),
}

impl<'a, B: PresentationBackend + ?Sized> FramebufferAttachment<'a, B> {
    /// Render-pass slot this attachment binds to
    pub fn slot(&self) -> AttachmentSlot {
        match self {
            FramebufferAttachment::SwapChainImage(_) => AttachmentSlot::SwapChainColor,
            FramebufferAttachment::DepthStencil(_) => AttachmentSlot::DepthStencil,
            FramebufferAttachment::Multisample(_) => AttachmentSlot::MultisampleColor,
        }
    }
}

/// Native presentation backend
///
/// All methods are called from the single thread driving a swap chain.
pub trait PresentationBackend: Send + Sync {
    type Surface;
    type NativeSwapChain;
    /// Presentable image, owned by its swap chain
    type Image;
    type ImageView;
    type RenderPass;
    type Framebuffer;
    /// Binary GPU-side semaphore
    type Semaphore;
    /// Allocated off-screen image with its view
    type AttachmentBuffer;

    // ===== SYNCHRONIZATION =====

    /// Create a binary semaphore
    fn create_semaphore(&self) -> Result<Self::Semaphore>;

    /// Block until all work submitted to the graphics queue has completed
    fn wait_graphics_queue_idle(&self) -> Result<()>;

    // ===== SURFACE =====

    /// Create a native surface for a window
    fn create_surface(&self, window: &dyn WindowSurface) -> Result<Self::Surface>;

    /// Probe formats, present modes, image-count and extent bounds
    fn query_surface_capabilities(&self, surface: &Self::Surface) -> Result<SurfaceCapabilities>;

    /// Graphics and present queue families for a surface
    fn queue_families(&self, surface: &Self::Surface) -> Result<QueueFamilies>;

    // ===== DEVICE LIMITS =====

    /// Whether `format` can back an optimal-tiling depth-stencil attachment
    fn supports_depth_stencil_format(&self, format: Format) -> bool;

    /// Largest sample count usable for both color and depth attachments
    fn max_sample_count(&self) -> u32;

    // ===== OBJECTS =====

    fn create_render_pass(&self, desc: &RenderPassDescriptor) -> Result<Self::RenderPass>;

    fn create_swap_chain(
        &self,
        surface: &Self::Surface,
        info: &SwapChainCreateInfo,
    ) -> Result<Self::NativeSwapChain>;

    /// Images actually granted by the swap chain
    fn swap_chain_images(&self, swap_chain: &Self::NativeSwapChain) -> Result<Vec<Self::Image>>;

    fn create_image_view(&self, image: &Self::Image, format: Format) -> Result<Self::ImageView>;

    /// Allocate an off-screen attachment through the memory manager
    fn create_attachment(&self, desc: &AttachmentBufferDescriptor) -> Result<Self::AttachmentBuffer>;

    /// `attachments` are given in render-pass slot order
    fn create_framebuffer(
        &self,
        render_pass: &Self::RenderPass,
        attachments: &[FramebufferAttachment<'_, Self>],
        extent: Extent2D,
    ) -> Result<Self::Framebuffer>;

    // ===== FRAME LOOP =====

    /// Acquire the next presentable image, waiting without timeout
    ///
    /// `signal` is signaled once the image can be rendered into.
    fn acquire_next_image(
        &self,
        swap_chain: &Self::NativeSwapChain,
        signal: &Self::Semaphore,
    ) -> Result<u32>;

    /// Submit an empty batch waiting on `wait` at color-attachment output and
    /// signaling `signal`
    fn submit_present_dependency(&self, wait: &Self::Semaphore, signal: &Self::Semaphore) -> Result<()>;

    /// Queue `image_index` for presentation once `wait` is signaled
    fn queue_present(
        &self,
        swap_chain: &Self::NativeSwapChain,
        image_index: u32,
        wait: &Self::Semaphore,
    ) -> Result<()>;
}
