/// Surface - VkSurfaceKHR creation and capability probing

use ash::vk;
use framechain::presentation::{Extent2D, SurfaceCapabilities, SurfaceFormat, WindowSurface};
use framechain::{render_debug, render_error, Error, Result};

use crate::vulkan_format::{color_space_from_vk, format_from_vk, present_mode_from_vk, status_code, transform_from_vk};

/// Window surface, destroyed when dropped
pub struct Surface {
    pub(crate) surface: vk::SurfaceKHR,
    pub(crate) loader: ash::khr::surface::Instance,
}

impl Surface {
    pub fn handle(&self) -> vk::SurfaceKHR {
        self.surface
    }

    /// Whether `queue_family` of `physical_device` can present to this surface
    pub(crate) fn supports_present(&self, physical_device: vk::PhysicalDevice, queue_family: u32) -> bool {
        unsafe {
            self.loader
                .get_physical_device_surface_support(physical_device, queue_family, self.surface)
                .unwrap_or(false)
        }
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_surface(self.surface, None);
        }
    }
}

/// Create a surface for `window` through the per-platform factory
pub(crate) fn create_surface(
    entry: &ash::Entry,
    instance: &ash::Instance,
    loader: &ash::khr::surface::Instance,
    window: &dyn WindowSurface,
) -> Result<Surface> {
    let handle = window.native_handle()?;

    let surface = unsafe { ash_window::create_surface(entry, instance, handle.display, handle.window, None) }
        .map_err(|e| {
            render_error!("framechain::vulkan", "Failed to create surface: {:?}", e);
            Error::backend("vkCreateSurfaceKHR", status_code(e))
        })?;

    Ok(Surface {
        surface,
        loader: loader.clone(),
    })
}

/// `current_extent` is left to the swap chain when the window system reports
/// the 0xFFFFFFFF sentinel
fn extent_from_vk(extent: vk::Extent2D) -> Option<Extent2D> {
    (extent.width != u32::MAX).then(|| Extent2D::new(extent.width, extent.height))
}

/// Probe formats, present modes and image bounds of `surface`
pub(crate) fn query_capabilities(
    physical_device: vk::PhysicalDevice,
    surface: &Surface,
) -> Result<SurfaceCapabilities> {
    unsafe {
        let capabilities = surface
            .loader
            .get_physical_device_surface_capabilities(physical_device, surface.surface)
            .map_err(|e| {
                render_error!("framechain::vulkan", "Failed to get surface capabilities: {:?}", e);
                Error::backend("vkGetPhysicalDeviceSurfaceCapabilitiesKHR", status_code(e))
            })?;

        let formats = surface
            .loader
            .get_physical_device_surface_formats(physical_device, surface.surface)
            .map_err(|e| {
                render_error!("framechain::vulkan", "Failed to query surface formats: {:?}", e);
                Error::backend("vkGetPhysicalDeviceSurfaceFormatsKHR", status_code(e))
            })?;

        let present_modes = surface
            .loader
            .get_physical_device_surface_present_modes(physical_device, surface.surface)
            .map_err(|e| {
                render_error!("framechain::vulkan", "Failed to query present modes: {:?}", e);
                Error::backend("vkGetPhysicalDeviceSurfacePresentModesKHR", status_code(e))
            })?;

        render_debug!(
            "framechain::vulkan",
            "Surface probe: {} format(s), {} present mode(s), images {}..{}",
            formats.len(),
            present_modes.len(),
            capabilities.min_image_count,
            capabilities.max_image_count
        );

        Ok(SurfaceCapabilities {
            formats: formats
                .iter()
                .map(|f| SurfaceFormat {
                    format: format_from_vk(f.format),
                    color_space: color_space_from_vk(f.color_space),
                })
                .collect(),
            present_modes: present_modes.into_iter().map(present_mode_from_vk).collect(),
            min_image_count: capabilities.min_image_count,
            max_image_count: capabilities.max_image_count,
            current_transform: transform_from_vk(capabilities.current_transform),
            current_extent: extent_from_vk(capabilities.current_extent),
            min_image_extent: Extent2D::new(
                capabilities.min_image_extent.width,
                capabilities.min_image_extent.height,
            ),
            max_image_extent: Extent2D::new(
                capabilities.max_image_extent.width,
                capabilities.max_image_extent.height,
            ),
        })
    }
}
