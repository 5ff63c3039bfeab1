/// Image views and off-screen attachment images
///
/// Swap-chain images are owned by their swap chain; only their views are
/// wrapped here. Depth-stencil and multisample color buffers are allocated
/// through gpu-allocator and own their image, memory and view.

use ash::vk;
use framechain::presentation::{AttachmentBufferDescriptor, AttachmentKind, Format};
use framechain::{render_error, Error, Result};
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator};
use gpu_allocator::MemoryLocation;
use std::sync::{Arc, Mutex};

use crate::vulkan_format::{aspect_flags, format_to_vk, sample_count_to_vk, status_code};

/// 2D image view, destroyed when dropped
pub struct ImageView {
    pub(crate) view: vk::ImageView,
    pub(crate) device: ash::Device,
}

impl ImageView {
    pub fn handle(&self) -> vk::ImageView {
        self.view
    }
}

impl Drop for ImageView {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_image_view(self.view, None);
        }
    }
}

/// Create a single-mip, single-layer 2D view of `image`
pub(crate) fn create_image_view(device: &ash::Device, image: vk::Image, format: Format) -> Result<ImageView> {
    Ok(ImageView {
        view: create_view_handle(device, image, format)?,
        device: device.clone(),
    })
}

fn create_view_handle(device: &ash::Device, image: vk::Image, format: Format) -> Result<vk::ImageView> {
    let view_create_info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format_to_vk(format))
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: aspect_flags(format),
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        });

    unsafe { device.create_image_view(&view_create_info, None) }.map_err(|e| {
        render_error!("framechain::vulkan", "Failed to create image view ({:?}): {:?}", format, e);
        Error::backend("vkCreateImageView", status_code(e))
    })
}

/// Off-screen attachment (depth-stencil or multisample color)
pub struct AttachmentImage {
    /// Vulkan image
    pub(crate) image: vk::Image,
    /// Vulkan image view (null until created)
    pub(crate) view: vk::ImageView,
    /// GPU memory allocation
    pub(crate) allocation: Option<Allocation>,
    /// Role of the attachment
    pub(crate) kind: AttachmentKind,
    /// Vulkan device (for cleanup)
    pub(crate) device: ash::Device,
    /// GPU allocator (for cleanup)
    pub(crate) allocator: Arc<Mutex<Allocator>>,
}

impl AttachmentImage {
    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    pub fn kind(&self) -> AttachmentKind {
        self.kind
    }
}

impl Drop for AttachmentImage {
    fn drop(&mut self) {
        unsafe {
            // Destroy image view
            self.device.destroy_image_view(self.view, None);

            // Free GPU memory
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            // Destroy image
            self.device.destroy_image(self.image, None);
        }
    }
}

/// Multisample color is loaded by the secondary pass, so it is never transient
pub(crate) fn attachment_usage(kind: AttachmentKind) -> vk::ImageUsageFlags {
    match kind {
        AttachmentKind::DepthStencil => vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
        AttachmentKind::MultisampleColor => vk::ImageUsageFlags::COLOR_ATTACHMENT,
    }
}

/// Allocate an attachment image in device-local memory and create its view
pub(crate) fn create_attachment_image(
    device: &ash::Device,
    allocator: &Arc<Mutex<Allocator>>,
    desc: &AttachmentBufferDescriptor,
) -> Result<AttachmentImage> {
    let image_create_info = vk::ImageCreateInfo::default()
        .image_type(vk::ImageType::TYPE_2D)
        .format(format_to_vk(desc.format))
        .extent(vk::Extent3D {
            width: desc.extent.width,
            height: desc.extent.height,
            depth: 1,
        })
        .mip_levels(1)
        .array_layers(1)
        .samples(sample_count_to_vk(desc.samples))
        .tiling(vk::ImageTiling::OPTIMAL)
        .usage(attachment_usage(desc.kind))
        .sharing_mode(vk::SharingMode::EXCLUSIVE)
        .initial_layout(vk::ImageLayout::UNDEFINED);

    let image = unsafe { device.create_image(&image_create_info, None) }.map_err(|e| {
        render_error!("framechain::vulkan", "Failed to create {:?} image: {:?}", desc.kind, e);
        Error::backend("vkCreateImage", status_code(e))
    })?;

    // Partially built attachments are released by Drop
    let mut attachment = AttachmentImage {
        image,
        view: vk::ImageView::null(),
        allocation: None,
        kind: desc.kind,
        device: device.clone(),
        allocator: Arc::clone(allocator),
    };

    let requirements = unsafe { device.get_image_memory_requirements(image) };
    let name = match desc.kind {
        AttachmentKind::DepthStencil => "depth_stencil_buffer",
        AttachmentKind::MultisampleColor => "multisample_color_buffer",
    };

    let allocation = allocator
        .lock()
        .map_err(|_| Error::InvalidState("GPU allocator lock poisoned".to_string()))?
        .allocate(&AllocationCreateDesc {
            name,
            requirements,
            location: MemoryLocation::GpuOnly,
            linear: false,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })
        .map_err(|e| {
            let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
            render_error!("framechain::vulkan", "Failed to allocate {} ({:.2} MB): {:?}", name, size_mb, e);
            Error::OutOfMemory
        })?;

    let (memory, offset) = unsafe { (allocation.memory(), allocation.offset()) };
    attachment.allocation = Some(allocation);

    unsafe { device.bind_image_memory(image, memory, offset) }.map_err(|e| {
        render_error!("framechain::vulkan", "Failed to bind {} memory: {:?}", name, e);
        Error::backend("vkBindImageMemory", status_code(e))
    })?;

    attachment.view = create_view_handle(device, image, desc.format)?;

    Ok(attachment)
}
