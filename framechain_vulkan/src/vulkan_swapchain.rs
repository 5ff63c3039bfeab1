/// Swapchain - VkSwapchainKHR and the acquire / present calls
///
/// Only the native object lives here. Image counts, formats, resize and
/// recreation policy belong to `framechain::SwapChain`.

use ash::vk;
use framechain::presentation::{SharingMode, SwapChainCreateInfo};
use framechain::{render_error, render_warn, Error, Result};

use crate::vulkan_format::{color_space_to_vk, format_to_vk, present_mode_to_vk, status_code, transform_to_vk};
use crate::vulkan_surface::Surface;

/// Native swap chain, destroyed when dropped
///
/// Presentable images belong to the swap chain and die with it.
pub struct Swapchain {
    pub(crate) swapchain: vk::SwapchainKHR,
    pub(crate) loader: ash::khr::swapchain::Device,
}

impl Swapchain {
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Images actually granted by the driver
    pub(crate) fn images(&self) -> Result<Vec<vk::Image>> {
        unsafe { self.loader.get_swapchain_images(self.swapchain) }.map_err(|e| {
            render_error!("framechain::vulkan", "Failed to get swapchain images: {:?}", e);
            Error::backend("vkGetSwapchainImagesKHR", status_code(e))
        })
    }

    /// Acquire the next image without timeout
    ///
    /// A suboptimal swap chain is still usable and reported as success.
    pub(crate) fn acquire_next_image(&self, signal: vk::Semaphore) -> Result<u32> {
        let result = unsafe {
            self.loader
                .acquire_next_image(self.swapchain, u64::MAX, signal, vk::Fence::null())
        };

        match result {
            Ok((image_index, _suboptimal)) => Ok(image_index),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                render_warn!("framechain::vulkan", "Swapchain out of date during acquire");
                Err(Error::out_of_date("vkAcquireNextImageKHR"))
            }
            Err(e) => {
                render_error!("framechain::vulkan", "Failed to acquire next image: {:?}", e);
                Err(Error::backend("vkAcquireNextImageKHR", status_code(e)))
            }
        }
    }

    /// Queue `image_index` for presentation after `wait` is signaled
    pub(crate) fn present(&self, queue: vk::Queue, image_index: u32, wait: vk::Semaphore) -> Result<()> {
        let wait_semaphores = [wait];
        let swapchains = [self.swapchain];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        match unsafe { self.loader.queue_present(queue, &present_info) } {
            Ok(_suboptimal) => Ok(()),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                render_warn!("framechain::vulkan", "Swapchain out of date during present");
                Err(Error::out_of_date("vkQueuePresentKHR"))
            }
            Err(e) => {
                render_error!("framechain::vulkan", "Failed to present image {}: {:?}", image_index, e);
                Err(Error::backend("vkQueuePresentKHR", status_code(e)))
            }
        }
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

/// Create a swap chain for `surface` with opaque composition and
/// color-attachment usage
pub(crate) fn create_swapchain(
    loader: &ash::khr::swapchain::Device,
    surface: &Surface,
    info: &SwapChainCreateInfo,
) -> Result<Swapchain> {
    let family_indices = match info.sharing {
        SharingMode::Exclusive => Vec::new(),
        SharingMode::Concurrent { graphics, present } => vec![graphics, present],
    };
    let sharing_mode = if family_indices.is_empty() {
        vk::SharingMode::EXCLUSIVE
    } else {
        vk::SharingMode::CONCURRENT
    };

    let swapchain_create_info = vk::SwapchainCreateInfoKHR::default()
        .surface(surface.surface)
        .min_image_count(info.min_image_count)
        .image_format(format_to_vk(info.surface_format.format))
        .image_color_space(color_space_to_vk(info.surface_format.color_space))
        .image_extent(vk::Extent2D {
            width: info.extent.width,
            height: info.extent.height,
        })
        .image_array_layers(1)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
        .image_sharing_mode(sharing_mode)
        .queue_family_indices(&family_indices)
        .pre_transform(transform_to_vk(info.transform))
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(present_mode_to_vk(info.present_mode))
        .clipped(true);

    let swapchain = unsafe { loader.create_swapchain(&swapchain_create_info, None) }.map_err(|e| {
        render_error!("framechain::vulkan", "Failed to create swapchain: {:?}", e);
        Error::backend("vkCreateSwapchainKHR", status_code(e))
    })?;

    Ok(Swapchain {
        swapchain,
        loader: loader.clone(),
    })
}
