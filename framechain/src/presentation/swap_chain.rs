/// Swap chain - presentable image chain and its resolution-dependent resources
///
/// Owns everything whose lifetime follows the window surface or its extent:
///
/// - the two presentation semaphores ("image available", "render finished")
/// - the native surface and the capabilities probed from it
/// - the primary (contents undefined) and secondary (contents loaded) render passes
/// - the resolution-dependent set: native swap chain, image views, optional
///   multisample color buffers, optional shared depth-stencil buffer, framebuffers
///
/// The next image is acquired at the end of `present()`, so `current_framebuffer()`
/// stays valid and stable between two presents.
///
/// # State machine
///
/// ```text
/// Uninitialized -> SurfaceReady -> SwapChainReady -> FrameAcquired (present loop)
///                       ^                                  |
///                       +------------ Resizing <-----------+
/// ```
///
/// Any failure while rebuilding leaves the swap chain `Uninitialized`; every
/// operation then fails with `Error::InvalidState`.

use std::sync::Arc;

use crate::config::SwapChainDescriptor;
use crate::error::{Error, Result};
use crate::presentation::backend::{
    AttachmentBufferDescriptor, AttachmentKind, FramebufferAttachment, PresentationBackend,
    SwapChainCreateInfo,
};
use crate::presentation::render_pass::{RenderPassDescriptor, RenderPassKind};
use crate::presentation::selection;
use crate::presentation::surface::WindowSurface;
use crate::presentation::types::{
    Extent2D, Format, PresentMode, QueueFamilies, SurfaceCapabilities, SurfaceFormat,
};
use crate::{render_bail, render_debug, render_error, render_info, render_trace};

const LOG_SOURCE: &str = "framechain::swap_chain";

/// Swap chain lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapChainStatus {
    /// Unusable, a rebuild failed
    Uninitialized,
    /// Surface created and probed, no swap chain yet
    SurfaceReady,
    /// Resources built, no image acquired
    SwapChainReady,
    /// An image is acquired and its framebuffer can be rendered into
    FrameAcquired,
    /// Tearing down for a new extent
    Resizing,
}

/// Resources sized to the current extent
///
/// Fields drop in declaration order: framebuffers first, native swap chain and
/// off-screen buffers last.
struct ResolutionResources<B: PresentationBackend> {
    framebuffers: Vec<B::Framebuffer>,
    image_views: Vec<B::ImageView>,
    images: Vec<B::Image>,
    native: B::NativeSwapChain,
    color_buffers: Vec<B::AttachmentBuffer>,
    depth_stencil: Option<B::AttachmentBuffer>,
}

/// Swap-chain manager for one window
pub struct SwapChain<B: PresentationBackend> {
    // Drop order matters: resources, render passes, surface, semaphores
    resources: Option<ResolutionResources<B>>,
    render_pass: B::RenderPass,
    secondary_render_pass: B::RenderPass,
    surface: Option<B::Surface>,
    image_available: B::Semaphore,
    render_finished: B::Semaphore,

    backend: Arc<B>,
    window: Arc<dyn WindowSurface>,
    descriptor: SwapChainDescriptor,

    capabilities: SurfaceCapabilities,
    queue_families: QueueFamilies,
    surface_format: SurfaceFormat,
    depth_stencil_format: Format,
    samples: u32,
    present_mode: PresentMode,
    vsync_interval: u32,

    extent: Extent2D,
    current_image: u32,
    status: SwapChainStatus,
}

impl<B: PresentationBackend> SwapChain<B> {
    /// Create the swap chain and acquire the first image
    ///
    /// Any native failure aborts construction: whatever was already created is
    /// destroyed and the error is returned.
    pub fn new(
        backend: Arc<B>,
        window: Arc<dyn WindowSurface>,
        descriptor: SwapChainDescriptor,
    ) -> Result<Self> {
        let image_available = backend.create_semaphore()?;
        let render_finished = backend.create_semaphore()?;

        let surface = backend.create_surface(window.as_ref())?;
        let capabilities = backend.query_surface_capabilities(&surface)?;
        let queue_families = backend.queue_families(&surface)?;

        let surface_format = selection::pick_surface_format(&capabilities.formats)?;
        let depth_stencil_format = selection::pick_depth_stencil_format(
            descriptor.depth_bits,
            descriptor.stencil_bits,
            |format| backend.supports_depth_stencil_format(format),
        )?;
        let samples = selection::pick_sample_count(descriptor.samples, backend.max_sample_count());

        let (render_pass, secondary_render_pass) =
            create_render_passes(backend.as_ref(), surface_format.format, depth_stencil_format, samples)?;

        render_info!(
            LOG_SOURCE,
            "Surface format {:?} / {:?}, depth-stencil {:?}, {} sample(s)",
            surface_format.format,
            surface_format.color_space,
            depth_stencil_format,
            samples
        );

        let mut swap_chain = Self {
            resources: None,
            render_pass,
            secondary_render_pass,
            surface: Some(surface),
            image_available,
            render_finished,
            present_mode: selection::pick_present_mode(
                &capabilities.present_modes,
                descriptor.vsync_interval,
            ),
            vsync_interval: descriptor.vsync_interval,
            backend,
            window,
            capabilities,
            queue_families,
            surface_format,
            depth_stencil_format,
            samples,
            extent: Extent2D::default(),
            current_image: 0,
            status: SwapChainStatus::SurfaceReady,
            descriptor,
        };

        swap_chain.build_resolution_resources()?;

        if swap_chain.descriptor.fullscreen {
            swap_chain.window.set_fullscreen(true);
        }
        Ok(swap_chain)
    }

    // ===== LIFECYCLE =====

    /// Present the current image and acquire the next one
    ///
    /// Submits an empty batch waiting on "image available" and signaling
    /// "render finished", presents gated on "render finished", then acquires.
    /// An out-of-date surface fails with `Error::SurfaceOutOfDate`; the caller
    /// may then `resize`.
    pub fn present(&mut self) -> Result<()> {
        if self.status != SwapChainStatus::FrameAcquired {
            render_bail!(LOG_SOURCE, "present() called in state {:?}", self.status);
        }
        // No image is held past this point until the next acquire succeeds
        self.status = SwapChainStatus::SwapChainReady;
        let resources = self.resources()?;

        self.backend
            .submit_present_dependency(&self.image_available, &self.render_finished)
            .map_err(|e| {
                render_error!(LOG_SOURCE, "Present dependency submission failed: {}", e);
                e
            })?;
        self.backend
            .queue_present(&resources.native, self.current_image, &self.render_finished)
            .map_err(|e| {
                render_error!(LOG_SOURCE, "Present of image {} failed: {}", self.current_image, e);
                e
            })?;

        render_trace!(LOG_SOURCE, "Presented image {}", self.current_image);
        self.acquire_next_image()
    }

    /// Resize to `resolution`
    ///
    /// Returns `Ok(false)` without doing anything when the clamped extent is
    /// already current and a frame is acquired. Otherwise waits for the
    /// graphics queue, recreates semaphores and surface, and rebuilds every
    /// resolution-dependent resource.
    pub fn resize(&mut self, resolution: Extent2D) -> Result<bool> {
        self.ensure_usable()?;

        let target = selection::pick_extent(
            resolution,
            self.capabilities.min_image_extent,
            self.capabilities.max_image_extent,
        );
        if target == self.extent && self.status == SwapChainStatus::FrameAcquired {
            return Ok(false);
        }

        render_debug!(
            LOG_SOURCE,
            "Resizing {}x{} -> {}x{}",
            self.extent.width,
            self.extent.height,
            target.width,
            target.height
        );

        self.status = SwapChainStatus::Resizing;
        self.descriptor.resolution = resolution;
        self.guard(Self::rebuild_surface)?;
        Ok(true)
    }

    /// Change the vsync interval
    ///
    /// Returns `Ok(false)` when `interval` is already active. Otherwise the
    /// native swap chain, its views and framebuffers are rebuilt with the new
    /// present mode at the same extent. Multisample buffers are only rebuilt
    /// when the granted image count changes.
    pub fn set_presentation_interval(&mut self, interval: u32) -> Result<bool> {
        self.ensure_usable()?;
        if interval == self.vsync_interval {
            return Ok(false);
        }

        self.vsync_interval = interval;
        self.descriptor.vsync_interval = interval;
        self.present_mode = selection::pick_present_mode(&self.capabilities.present_modes, interval);
        render_debug!(
            LOG_SOURCE,
            "Vsync interval {} -> present mode {:?}",
            interval,
            self.present_mode
        );

        self.guard(Self::rebuild_swap_chain_only)?;
        Ok(true)
    }

    /// Switch the window between windowed and fullscreen
    ///
    /// The new size arrives through the window's resize events.
    pub fn set_fullscreen(&mut self, fullscreen: bool) -> bool {
        if self.descriptor.fullscreen == fullscreen {
            return false;
        }
        self.descriptor.fullscreen = fullscreen;
        self.window.set_fullscreen(fullscreen);
        true
    }

    // ===== ACCESSORS =====

    /// Primary render pass (contents undefined on load)
    pub fn render_pass(&self) -> &B::RenderPass {
        &self.render_pass
    }

    /// Secondary render pass (contents loaded)
    pub fn secondary_render_pass(&self) -> &B::RenderPass {
        &self.secondary_render_pass
    }

    /// Framebuffer of the currently acquired image
    ///
    /// Do not hold on to it across `resize` or `set_presentation_interval`.
    pub fn current_framebuffer(&self) -> Result<&B::Framebuffer> {
        if self.status != SwapChainStatus::FrameAcquired {
            return Err(Error::InvalidState(format!(
                "no acquired image in state {:?}",
                self.status
            )));
        }
        self.resources()?
            .framebuffers
            .get(self.current_image as usize)
            .ok_or_else(|| Error::InvalidState(format!("no framebuffer for image {}", self.current_image)))
    }

    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    pub fn color_format(&self) -> Format {
        self.surface_format.format
    }

    pub fn surface_format(&self) -> SurfaceFormat {
        self.surface_format
    }

    /// `Format::UNDEFINED` when no depth-stencil buffer is used
    pub fn depth_stencil_format(&self) -> Format {
        self.depth_stencil_format
    }

    pub fn sample_count(&self) -> u32 {
        self.samples
    }

    pub fn has_depth_stencil_buffer(&self) -> bool {
        self.depth_stencil_format != Format::UNDEFINED
    }

    pub fn has_multi_sampling(&self) -> bool {
        self.samples > 1
    }

    pub fn current_image_index(&self) -> u32 {
        self.current_image
    }

    /// Number of images granted by the native swap chain
    pub fn image_count(&self) -> usize {
        self.resources
            .as_ref()
            .map_or(0, |resources| resources.images.len())
    }

    pub fn present_mode(&self) -> PresentMode {
        self.present_mode
    }

    pub fn vsync_interval(&self) -> u32 {
        self.vsync_interval
    }

    pub fn status(&self) -> SwapChainStatus {
        self.status
    }

    pub fn capabilities(&self) -> &SurfaceCapabilities {
        &self.capabilities
    }

    pub fn descriptor(&self) -> &SwapChainDescriptor {
        &self.descriptor
    }

    // ===== INTERNALS =====

    fn ensure_usable(&self) -> Result<()> {
        if self.status == SwapChainStatus::Uninitialized {
            return Err(Error::InvalidState(
                "swap chain is unusable after a failed rebuild".to_string(),
            ));
        }
        Ok(())
    }

    fn resources(&self) -> Result<&ResolutionResources<B>> {
        self.resources
            .as_ref()
            .ok_or_else(|| Error::InvalidState("resolution-dependent resources missing".to_string()))
    }

    /// Run a rebuild step, leaving the swap chain unusable if it fails
    fn guard(&mut self, step: fn(&mut Self) -> Result<()>) -> Result<()> {
        step(self).map_err(|e| {
            render_error!(LOG_SOURCE, "Swap chain rebuild failed: {}", e);
            self.resources = None;
            self.status = SwapChainStatus::Uninitialized;
            e
        })
    }

    /// Resize path: new semaphores, new surface, fresh capabilities
    fn rebuild_surface(&mut self) -> Result<()> {
        self.backend.wait_graphics_queue_idle()?;

        // The swap chain must go before the surface it was created from
        self.resources = None;
        self.surface = None;

        self.image_available = self.backend.create_semaphore()?;
        self.render_finished = self.backend.create_semaphore()?;

        let surface = self.backend.create_surface(self.window.as_ref())?;
        self.capabilities = self.backend.query_surface_capabilities(&surface)?;
        self.queue_families = self.backend.queue_families(&surface)?;
        self.surface = Some(surface);
        self.status = SwapChainStatus::SurfaceReady;

        let surface_format = selection::pick_surface_format(&self.capabilities.formats)?;
        if surface_format.format != self.surface_format.format {
            render_info!(
                LOG_SOURCE,
                "Surface format changed {:?} -> {:?}, rebuilding render passes",
                self.surface_format.format,
                surface_format.format
            );
            let (primary, secondary) = create_render_passes(
                self.backend.as_ref(),
                surface_format.format,
                self.depth_stencil_format,
                self.samples,
            )?;
            self.render_pass = primary;
            self.secondary_render_pass = secondary;
        }
        self.surface_format = surface_format;
        self.present_mode =
            selection::pick_present_mode(&self.capabilities.present_modes, self.vsync_interval);

        self.build_resolution_resources()
    }

    /// Vsync path: only the native swap chain, its views and framebuffers
    fn rebuild_swap_chain_only(&mut self) -> Result<()> {
        self.backend.wait_graphics_queue_idle()?;

        let previous = self
            .resources
            .take()
            .ok_or_else(|| Error::InvalidState("resolution-dependent resources missing".to_string()))?;
        let ResolutionResources {
            framebuffers,
            image_views,
            images,
            native,
            color_buffers,
            depth_stencil,
        } = previous;
        drop(framebuffers);
        drop(image_views);
        drop(images);
        drop(native);
        self.status = SwapChainStatus::SurfaceReady;

        // The pending "image available" signal went away with the old swap chain
        self.image_available = self.backend.create_semaphore()?;
        self.render_finished = self.backend.create_semaphore()?;

        let (native, images, image_views) = self.create_swap_chain_objects(self.extent)?;

        let color_buffers = if color_buffers.len() == images.len() || !self.has_multi_sampling() {
            color_buffers
        } else {
            drop(color_buffers);
            self.create_color_buffers(images.len(), self.extent)?
        };

        let framebuffers =
            self.create_framebuffers(&image_views, depth_stencil.as_ref(), &color_buffers, self.extent)?;

        self.resources = Some(ResolutionResources {
            framebuffers,
            image_views,
            images,
            native,
            color_buffers,
            depth_stencil,
        });
        self.status = SwapChainStatus::SwapChainReady;
        self.acquire_next_image()
    }

    /// Build the whole resolution-dependent set at the requested resolution
    /// and acquire the first image (shared by construction and resize)
    fn build_resolution_resources(&mut self) -> Result<()> {
        let extent = selection::pick_extent(
            self.descriptor.resolution,
            self.capabilities.min_image_extent,
            self.capabilities.max_image_extent,
        );

        let (native, images, image_views) = self.create_swap_chain_objects(extent)?;
        let color_buffers = self.create_color_buffers(images.len(), extent)?;
        let depth_stencil = self.create_depth_stencil(extent)?;
        let framebuffers =
            self.create_framebuffers(&image_views, depth_stencil.as_ref(), &color_buffers, extent)?;

        render_info!(
            LOG_SOURCE,
            "Swap chain {}x{}, {} image(s), present mode {:?}",
            extent.width,
            extent.height,
            images.len(),
            self.present_mode
        );

        self.resources = Some(ResolutionResources {
            framebuffers,
            image_views,
            images,
            native,
            color_buffers,
            depth_stencil,
        });
        self.extent = extent;
        self.status = SwapChainStatus::SwapChainReady;
        self.acquire_next_image()
    }

    fn create_swap_chain_objects(
        &self,
        extent: Extent2D,
    ) -> Result<(B::NativeSwapChain, Vec<B::Image>, Vec<B::ImageView>)> {
        let surface = self
            .surface
            .as_ref()
            .ok_or_else(|| Error::InvalidState("no surface".to_string()))?;

        let info = SwapChainCreateInfo {
            min_image_count: selection::pick_buffer_count(
                self.descriptor.swap_buffers,
                self.capabilities.min_image_count,
                self.capabilities.max_image_count,
            ),
            surface_format: self.surface_format,
            extent,
            present_mode: self.present_mode,
            transform: self.capabilities.current_transform,
            sharing: selection::pick_sharing_mode(self.queue_families),
        };

        let native = self.backend.create_swap_chain(surface, &info)?;
        let images = self.backend.swap_chain_images(&native)?;
        if images.is_empty() {
            return Err(Error::InvalidState("swap chain granted no images".to_string()));
        }
        if images.len() as u32 != info.min_image_count {
            render_debug!(
                LOG_SOURCE,
                "Requested {} swap images, granted {}",
                info.min_image_count,
                images.len()
            );
        }

        let image_views = images
            .iter()
            .map(|image| self.backend.create_image_view(image, self.surface_format.format))
            .collect::<Result<Vec<_>>>()?;

        Ok((native, images, image_views))
    }

    fn create_color_buffers(&self, count: usize, extent: Extent2D) -> Result<Vec<B::AttachmentBuffer>> {
        if !self.has_multi_sampling() {
            return Ok(Vec::new());
        }
        let desc = AttachmentBufferDescriptor {
            kind: AttachmentKind::MultisampleColor,
            format: self.surface_format.format,
            samples: self.samples,
            extent,
        };
        (0..count)
            .map(|_| self.backend.create_attachment(&desc))
            .collect()
    }

    fn create_depth_stencil(&self, extent: Extent2D) -> Result<Option<B::AttachmentBuffer>> {
        if !self.has_depth_stencil_buffer() {
            return Ok(None);
        }
        let desc = AttachmentBufferDescriptor {
            kind: AttachmentKind::DepthStencil,
            format: self.depth_stencil_format,
            samples: self.samples,
            extent,
        };
        self.backend.create_attachment(&desc).map(Some)
    }

    /// One framebuffer per image: color view, [depth-stencil], [multisample color]
    fn create_framebuffers(
        &self,
        image_views: &[B::ImageView],
        depth_stencil: Option<&B::AttachmentBuffer>,
        color_buffers: &[B::AttachmentBuffer],
        extent: Extent2D,
    ) -> Result<Vec<B::Framebuffer>> {
        image_views
            .iter()
            .enumerate()
            .map(|(index, view)| {
                let mut attachments = vec![FramebufferAttachment::SwapChainImage(view)];
                if let Some(depth_stencil) = depth_stencil {
                    attachments.push(FramebufferAttachment::DepthStencil(depth_stencil));
                }
                if let Some(color) = color_buffers.get(index) {
                    attachments.push(FramebufferAttachment::Multisample(color));
                }
                self.backend
                    .create_framebuffer(&self.render_pass, &attachments, extent)
            })
            .collect()
    }

    fn acquire_next_image(&mut self) -> Result<()> {
        let resources = self.resources()?;
        let index = self
            .backend
            .acquire_next_image(&resources.native, &self.image_available)
            .map_err(|e| {
                render_error!(LOG_SOURCE, "Image acquisition failed: {}", e);
                e
            })?;

        if index as usize >= resources.framebuffers.len() {
            render_bail!(
                LOG_SOURCE,
                "Acquired image index {} out of range ({} images)",
                index,
                resources.framebuffers.len()
            );
        }

        self.current_image = index;
        self.status = SwapChainStatus::FrameAcquired;
        Ok(())
    }
}

/// Primary and secondary render passes for the given formats
fn create_render_passes<B: PresentationBackend>(
    backend: &B,
    color_format: Format,
    depth_stencil_format: Format,
    samples: u32,
) -> Result<(B::RenderPass, B::RenderPass)> {
    let primary = backend.create_render_pass(&RenderPassDescriptor::for_swap_chain(
        RenderPassKind::Primary,
        color_format,
        depth_stencil_format,
        samples,
    ))?;
    let secondary = backend.create_render_pass(&RenderPassDescriptor::for_swap_chain(
        RenderPassKind::Secondary,
        color_format,
        depth_stencil_format,
        samples,
    ))?;
    Ok((primary, secondary))
}

impl<B: PresentationBackend> Drop for SwapChain<B> {
    fn drop(&mut self) {
        // The last submit and present may still reference the frame resources
        self.backend.wait_graphics_queue_idle().ok();
    }
}

#[cfg(test)]
#[path = "swap_chain_tests.rs"]
mod tests;
