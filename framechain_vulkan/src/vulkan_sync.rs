/// Semaphore - RAII binary semaphore

use ash::vk;
use framechain::{render_error, Error, Result};

use crate::vulkan_format::status_code;

/// Binary semaphore, destroyed when dropped
pub struct Semaphore {
    pub(crate) semaphore: vk::Semaphore,
    device: ash::Device,
}

impl Semaphore {
    pub(crate) fn new(device: &ash::Device) -> Result<Self> {
        let create_info = vk::SemaphoreCreateInfo::default();
        let semaphore = unsafe { device.create_semaphore(&create_info, None) }.map_err(|e| {
            render_error!("framechain::vulkan", "Failed to create semaphore: {:?}", e);
            Error::backend("vkCreateSemaphore", status_code(e))
        })?;

        Ok(Self {
            semaphore,
            device: device.clone(),
        })
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.semaphore, None);
        }
    }
}
