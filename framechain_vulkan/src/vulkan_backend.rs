/// VulkanBackend - Vulkan implementation of the PresentationBackend trait
///
/// Owns the instance, the logical device with its graphics and present
/// queues, and the GPU memory allocator. Swap chains hold an `Arc` to the
/// backend, so every native object they own is destroyed before the device.

use ash::vk;
use framechain::presentation::{
    AttachmentBufferDescriptor, Extent2D, Format, FramebufferAttachment, PresentationBackend,
    QueueFamilies, RenderPassDescriptor, SurfaceCapabilities, SwapChainCreateInfo, WindowSurface,
};
use framechain::{render_debug, render_error, render_info, render_warn, BackendConfig, Error, Result};
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use rustc_hash::FxHashMap;
use std::ffi::CString;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

use crate::debug::{DebugMessenger, ValidationStats};
use crate::vulkan_format::{format_to_vk, max_sample_count, status_code};
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_image::{create_attachment_image, create_image_view, AttachmentImage, ImageView};
use crate::vulkan_render_pass::{create_render_pass, RenderPass};
use crate::vulkan_surface::{create_surface, query_capabilities, Surface};
use crate::vulkan_swapchain::{create_swapchain, Swapchain};
use crate::vulkan_sync::Semaphore;

/// Vulkan presentation backend
pub struct VulkanBackend {
    /// Vulkan entry (needed for surface creation)
    entry: ash::Entry,
    instance: ash::Instance,
    physical_device: vk::PhysicalDevice,
    device: ash::Device,

    /// Graphics queue
    graphics_queue: vk::Queue,
    graphics_queue_family: u32,
    /// Present queue (may be same as graphics)
    present_queue: vk::Queue,
    present_queue_family: u32,

    surface_loader: ash::khr::surface::Instance,
    swapchain_loader: ash::khr::swapchain::Device,

    /// GPU memory allocator (ManuallyDrop to control destruction order)
    allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    /// Validation messenger, present when validation is enabled
    debug_messenger: ManuallyDrop<Option<DebugMessenger>>,

    /// Depth-stencil format support, queried once per format
    format_cache: Mutex<FxHashMap<vk::Format, bool>>,

    /// Largest sample count usable for color and depth attachments
    max_samples: u32,
}

/// Device-level objects created after the instance
struct DeviceParts {
    physical_device: vk::PhysicalDevice,
    device: ash::Device,
    graphics_queue: vk::Queue,
    graphics_queue_family: u32,
    present_queue: vk::Queue,
    present_queue_family: u32,
    allocator: Allocator,
    max_samples: u32,
}

impl VulkanBackend {
    /// Create a new Vulkan backend able to present to `window`
    ///
    /// # Arguments
    ///
    /// * `window` - Window used to pick instance extensions and a present queue
    /// * `config` - Backend configuration
    pub fn new(window: &dyn WindowSurface, config: BackendConfig) -> Result<Self> {
        let enable_validation = config.enable_validation && cfg!(feature = "vulkan-validation");
        if config.enable_validation && !enable_validation {
            render_warn!(
                "framechain::vulkan",
                "Validation requested but the vulkan-validation feature is disabled"
            );
        }

        // Create Vulkan Entry
        let entry = unsafe { ash::Entry::load() }.map_err(|e| {
            render_error!("framechain::vulkan", "Failed to load Vulkan library: {:?}", e);
            Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
        })?;

        let instance = Self::create_instance(&entry, window, &config, enable_validation)?;

        // Setup debug messenger if validation is enabled
        let debug_messenger = if enable_validation {
            match DebugMessenger::new(&entry, &instance, config.debug_severity) {
                Ok(messenger) => Some(messenger),
                Err(e) => {
                    unsafe { instance.destroy_instance(None) };
                    return Err(e);
                }
            }
        } else {
            None
        };

        let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

        let parts = match Self::create_device(&entry, &instance, &surface_loader, window) {
            Ok(parts) => parts,
            Err(e) => {
                drop(debug_messenger);
                unsafe { instance.destroy_instance(None) };
                return Err(e);
            }
        };

        let swapchain_loader = ash::khr::swapchain::Device::new(&instance, &parts.device);

        render_info!(
            "framechain::vulkan",
            "Vulkan backend ready (graphics family {}, present family {}, max {} samples, validation {})",
            parts.graphics_queue_family,
            parts.present_queue_family,
            parts.max_samples,
            enable_validation
        );

        Ok(Self {
            entry,
            instance,
            physical_device: parts.physical_device,
            device: parts.device,
            graphics_queue: parts.graphics_queue,
            graphics_queue_family: parts.graphics_queue_family,
            present_queue: parts.present_queue,
            present_queue_family: parts.present_queue_family,
            surface_loader,
            swapchain_loader,
            allocator: ManuallyDrop::new(Arc::new(Mutex::new(parts.allocator))),
            debug_messenger: ManuallyDrop::new(debug_messenger),
            format_cache: Mutex::new(FxHashMap::default()),
            max_samples: parts.max_samples,
        })
    }

    fn create_instance(
        entry: &ash::Entry,
        window: &dyn WindowSurface,
        config: &BackendConfig,
        enable_validation: bool,
    ) -> Result<ash::Instance> {
        let app_name = CString::new(config.app_name.as_str()).map_err(|e| {
            Error::InitializationFailed(format!("Invalid application name: {}", e))
        })?;
        let (major, minor, patch) = config.app_version;

        // Application Info
        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, major, minor, patch))
            .engine_name(c"Framechain")
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_3);

        // Get required extensions
        let handle = window.native_handle()?;
        let mut extension_names = ash_window::enumerate_required_extensions(handle.display)
            .map_err(|e| {
                render_error!("framechain::vulkan", "Failed to get required extensions: {}", e);
                Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
            })?
            .to_vec();

        // Add debug utils extension if validation is enabled
        if enable_validation {
            extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
        }

        // Validation layers
        let layer_names = if enable_validation {
            vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
        } else {
            vec![]
        };

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_layer_names(&layer_names)
            .enabled_extension_names(&extension_names);

        unsafe { entry.create_instance(&create_info, None) }.map_err(|e| {
            render_error!("framechain::vulkan", "Failed to create Vulkan instance: {:?}", e);
            Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
        })
    }

    /// Pick a physical device with graphics and present support for
    /// `window`, then create the logical device, its queues and the allocator
    fn create_device(
        entry: &ash::Entry,
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        window: &dyn WindowSurface,
    ) -> Result<DeviceParts> {
        // Temporary surface for queue selection, destroyed on return
        let surface = create_surface(entry, instance, surface_loader, window)?;

        let physical_devices = unsafe { instance.enumerate_physical_devices() }.map_err(|e| {
            render_error!("framechain::vulkan", "Failed to enumerate physical devices: {:?}", e);
            Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
        })?;

        let (physical_device, graphics_family_index, present_family_index) = physical_devices
            .into_iter()
            .find_map(|physical_device| {
                let queue_families =
                    unsafe { instance.get_physical_device_queue_family_properties(physical_device) };

                let graphics = queue_families
                    .iter()
                    .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))?
                    as u32;
                // Prefer presenting from the graphics family
                let present = if surface.supports_present(physical_device, graphics) {
                    graphics
                } else {
                    (0..queue_families.len() as u32)
                        .find(|&i| surface.supports_present(physical_device, i))?
                };

                Some((physical_device, graphics, present))
            })
            .ok_or_else(|| {
                render_error!("framechain::vulkan", "No GPU with graphics and present queues found");
                Error::Configuration("No GPU with graphics and present queues found".to_string())
            })?;

        drop(surface);

        // Create Logical Device
        let queue_priorities = [1.0];
        let queue_create_infos = if graphics_family_index == present_family_index {
            vec![vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_family_index)
                .queue_priorities(&queue_priorities)]
        } else {
            vec![
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(graphics_family_index)
                    .queue_priorities(&queue_priorities),
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(present_family_index)
                    .queue_priorities(&queue_priorities),
            ]
        };

        let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&device_extension_names);

        let device = unsafe { instance.create_device(physical_device, &device_create_info, None) }
            .map_err(|e| {
                render_error!("framechain::vulkan", "Failed to create logical device: {:?}", e);
                Error::InitializationFailed(format!("Failed to create device: {:?}", e))
            })?;

        let graphics_queue = unsafe { device.get_device_queue(graphics_family_index, 0) };
        let present_queue = unsafe { device.get_device_queue(present_family_index, 0) };

        let limits = unsafe { instance.get_physical_device_properties(physical_device) }.limits;
        let max_samples = max_sample_count(
            limits.framebuffer_color_sample_counts & limits.framebuffer_depth_sample_counts,
        );

        // Create GPU allocator
        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.clone(),
            device: device.clone(),
            physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })
        .map_err(|e| {
            render_error!("framechain::vulkan", "Failed to create GPU allocator: {:?}", e);
            unsafe { device.destroy_device(None) };
            Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
        })?;

        Ok(DeviceParts {
            physical_device,
            device,
            graphics_queue,
            graphics_queue_family: graphics_family_index,
            present_queue,
            present_queue_family: present_family_index,
            allocator,
            max_samples,
        })
    }

    /// Logical device, for recording commands against the swap chain's
    /// render passes and framebuffers
    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    pub fn graphics_queue_family(&self) -> u32 {
        self.graphics_queue_family
    }

    /// Validation messages received so far (`None` without validation)
    pub fn validation_stats(&self) -> Option<ValidationStats> {
        self.debug_messenger.as_ref().map(DebugMessenger::stats)
    }

    /// Print the validation statistics report, if validation is enabled
    pub fn print_validation_stats_report(&self) {
        if let Some(messenger) = self.debug_messenger.as_ref() {
            messenger.print_stats_report();
        }
    }
}

impl PresentationBackend for VulkanBackend {
    type Surface = Surface;
    type NativeSwapChain = Swapchain;
    type Image = vk::Image;
    type ImageView = ImageView;
    type RenderPass = RenderPass;
    type Framebuffer = Framebuffer;
    type Semaphore = Semaphore;
    type AttachmentBuffer = AttachmentImage;

    fn create_semaphore(&self) -> Result<Semaphore> {
        Semaphore::new(&self.device)
    }

    fn wait_graphics_queue_idle(&self) -> Result<()> {
        unsafe { self.device.queue_wait_idle(self.graphics_queue) }.map_err(|e| {
            render_error!("framechain::vulkan", "Failed to wait for graphics queue idle: {:?}", e);
            Error::backend("vkQueueWaitIdle", status_code(e))
        })
    }

    fn create_surface(&self, window: &dyn WindowSurface) -> Result<Surface> {
        create_surface(&self.entry, &self.instance, &self.surface_loader, window)
    }

    fn query_surface_capabilities(&self, surface: &Surface) -> Result<SurfaceCapabilities> {
        query_capabilities(self.physical_device, surface)
    }

    fn queue_families(&self, surface: &Surface) -> Result<QueueFamilies> {
        // Only families the device was created with can present
        let present = if surface.supports_present(self.physical_device, self.graphics_queue_family) {
            self.graphics_queue_family
        } else if surface.supports_present(self.physical_device, self.present_queue_family) {
            self.present_queue_family
        } else {
            render_error!("framechain::vulkan", "Surface is not presentable from the device queues");
            return Err(Error::Configuration(
                "Surface is not presentable from the device queues".to_string(),
            ));
        };

        Ok(QueueFamilies {
            graphics: self.graphics_queue_family,
            present,
        })
    }

    fn supports_depth_stencil_format(&self, format: Format) -> bool {
        let vk_format = format_to_vk(format);
        let query = || {
            let properties = unsafe {
                self.instance
                    .get_physical_device_format_properties(self.physical_device, vk_format)
            };
            properties
                .optimal_tiling_features
                .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
        };

        match self.format_cache.lock() {
            Ok(mut cache) => *cache.entry(vk_format).or_insert_with(query),
            Err(_) => query(),
        }
    }

    fn max_sample_count(&self) -> u32 {
        self.max_samples
    }

    fn create_render_pass(&self, desc: &RenderPassDescriptor) -> Result<RenderPass> {
        create_render_pass(&self.device, desc)
    }

    fn create_swap_chain(&self, surface: &Surface, info: &SwapChainCreateInfo) -> Result<Swapchain> {
        create_swapchain(&self.swapchain_loader, surface, info)
    }

    fn swap_chain_images(&self, swap_chain: &Swapchain) -> Result<Vec<vk::Image>> {
        swap_chain.images()
    }

    fn create_image_view(&self, image: &vk::Image, format: Format) -> Result<ImageView> {
        create_image_view(&self.device, *image, format)
    }

    fn create_attachment(&self, desc: &AttachmentBufferDescriptor) -> Result<AttachmentImage> {
        create_attachment_image(&self.device, &self.allocator, desc)
    }

    fn create_framebuffer(
        &self,
        render_pass: &RenderPass,
        attachments: &[FramebufferAttachment<'_, Self>],
        extent: Extent2D,
    ) -> Result<Framebuffer> {
        let views: Vec<vk::ImageView> = attachments
            .iter()
            .map(|attachment| match attachment {
                FramebufferAttachment::SwapChainImage(view) => view.view,
                FramebufferAttachment::DepthStencil(buffer)
                | FramebufferAttachment::Multisample(buffer) => buffer.view,
            })
            .collect();

        let framebuffer_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass.render_pass)
            .attachments(&views)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe { self.device.create_framebuffer(&framebuffer_info, None) }
            .map_err(|e| {
                render_error!("framechain::vulkan", "Failed to create framebuffer: {:?}", e);
                Error::backend("vkCreateFramebuffer", status_code(e))
            })?;

        render_debug!(
            "framechain::vulkan",
            "Framebuffer {:?} created ({}x{}, {} attachment(s))",
            framebuffer,
            extent.width,
            extent.height,
            views.len()
        );

        Ok(Framebuffer::new(framebuffer, extent, self.device.clone()))
    }

    fn acquire_next_image(&self, swap_chain: &Swapchain, signal: &Semaphore) -> Result<u32> {
        swap_chain.acquire_next_image(signal.semaphore)
    }

    fn submit_present_dependency(&self, wait: &Semaphore, signal: &Semaphore) -> Result<()> {
        // Empty batch: only orders "image available" before "render finished"
        let wait_semaphores = [wait.semaphore];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [signal.semaphore];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device
                .queue_submit(self.graphics_queue, &[submit_info], vk::Fence::null())
        }
        .map_err(|e| {
            render_error!("framechain::vulkan", "Failed to submit present dependency: {:?}", e);
            Error::backend("vkQueueSubmit", status_code(e))
        })
    }

    fn queue_present(&self, swap_chain: &Swapchain, image_index: u32, wait: &Semaphore) -> Result<()> {
        swap_chain.present(self.present_queue, image_index, wait.semaphore)
    }
}

impl Drop for VulkanBackend {
    fn drop(&mut self) {
        unsafe {
            // Wait for device to finish
            self.device.device_wait_idle().ok();

            // Drop allocator: free VkDeviceMemory pages BEFORE destroying device
            ManuallyDrop::drop(&mut self.allocator);

            // Destroy debug messenger BEFORE device and instance
            ManuallyDrop::drop(&mut self.debug_messenger);

            // Destroy device and instance
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}
