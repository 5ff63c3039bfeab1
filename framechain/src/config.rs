/// Configuration - swap-chain descriptor and backend settings

use crate::presentation::Extent2D;

/// Swap-chain descriptor
///
/// Describes what the application asks for. Every field is a request: the
/// surface capabilities and device limits decide what is actually granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapChainDescriptor {
    /// Requested resolution in pixels
    pub resolution: Extent2D,
    /// Requested number of swap buffers
    pub swap_buffers: u32,
    /// Vsync interval (0 = present as fast as possible, >= 1 = sync to refresh)
    pub vsync_interval: u32,
    /// Requested samples per pixel (1 = no multi-sampling)
    pub samples: u32,
    /// Requested depth bits (0 = no depth)
    pub depth_bits: u32,
    /// Requested stencil bits (0 = no stencil)
    pub stencil_bits: u32,
    /// Fullscreen presentation
    pub fullscreen: bool,
}

impl Default for SwapChainDescriptor {
    fn default() -> Self {
        Self {
            resolution: Extent2D::new(800, 600),
            swap_buffers: 2,
            vsync_interval: 1,
            samples: 1,
            depth_bits: 24,
            stencil_bits: 8,
            fullscreen: false,
        }
    }
}

impl SwapChainDescriptor {
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = Extent2D::new(width, height);
        self
    }

    pub fn with_swap_buffers(mut self, swap_buffers: u32) -> Self {
        self.swap_buffers = swap_buffers;
        self
    }

    pub fn with_vsync_interval(mut self, vsync_interval: u32) -> Self {
        self.vsync_interval = vsync_interval;
        self
    }

    pub fn with_samples(mut self, samples: u32) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_depth_stencil(mut self, depth_bits: u32, stencil_bits: u32) -> Self {
        self.depth_bits = depth_bits;
        self.stencil_bits = stencil_bits;
        self
    }

    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }
}

/// Which validation messages the backend forwards to the logger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugSeverity {
    /// Only errors
    ErrorsOnly,
    /// Errors and warnings
    #[default]
    ErrorsAndWarnings,
    /// Everything, including info and verbose
    All,
}

/// Backend configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Application name
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Validation message filter
    pub debug_severity: DebugSeverity,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "Framechain Application".to_string(),
            app_version: (1, 0, 0),
            debug_severity: DebugSeverity::default(),
        }
    }
}
