/// Presentation types - formats, color spaces, present modes and surface capabilities

use bitflags::bitflags;

/// 2D extent in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent2D {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Extent2D {
    /// Create a new extent
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns true if either dimension is zero (e.g. minimized window)
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Pixel format of presentable images and attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Format {
    /// No format ("any" when reported by a surface, "none" for depth-stencil)
    UNDEFINED,

    // Color formats
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    A2B10G10R10_UNORM,
    R16G16B16A16_SFLOAT,

    // Depth-stencil formats
    D16_UNORM,
    D16_UNORM_S8_UINT,
    D24_UNORM_S8_UINT,
    D32_FLOAT,
    D32_FLOAT_S8_UINT,

    /// Backend format without a portable equivalent (raw native value)
    Native(i32),
}

bitflags! {
    /// Image aspects carried by a format
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FormatAspects: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

impl Format {
    /// Aspects carried by this format (empty for `UNDEFINED`)
    pub fn aspects(&self) -> FormatAspects {
        match self {
            Format::UNDEFINED => FormatAspects::empty(),
            Format::D16_UNORM | Format::D32_FLOAT => FormatAspects::DEPTH,
            Format::D16_UNORM_S8_UINT
            | Format::D24_UNORM_S8_UINT
            | Format::D32_FLOAT_S8_UINT => FormatAspects::DEPTH | FormatAspects::STENCIL,
            _ => FormatAspects::COLOR,
        }
    }

    /// Returns true if the format has a depth component
    pub fn has_depth(&self) -> bool {
        self.aspects().contains(FormatAspects::DEPTH)
    }

    /// Returns true if the format has a stencil component
    pub fn has_stencil(&self) -> bool {
        self.aspects().contains(FormatAspects::STENCIL)
    }

    /// Returns true if the format is a depth and/or stencil format
    pub fn is_depth_stencil(&self) -> bool {
        self.aspects().intersects(FormatAspects::DEPTH | FormatAspects::STENCIL)
    }
}

/// Color space of presentable images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    /// Standard gamma-corrected sRGB
    SrgbNonlinear,
    /// Extended sRGB, linear transfer
    ExtendedSrgbLinear,
    /// HDR10 with the ST2084 (PQ) transfer
    Hdr10St2084,
    /// Backend color space without a portable equivalent
    Native(i32),
}

/// A (format, color space) pair supported by a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceFormat {
    /// Pixel format
    pub format: Format,
    /// Color space
    pub color_space: ColorSpace,
}

impl SurfaceFormat {
    /// Create a new surface format
    pub const fn new(format: Format, color_space: ColorSpace) -> Self {
        Self { format, color_space }
    }
}

/// Presentation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentMode {
    /// No synchronization, may tear
    Immediate,
    /// Low latency, replaces the queued image, never tears
    Mailbox,
    /// Blocking vsync, supported by every conformant backend
    Fifo,
    /// Vsync that tears when a frame is late
    FifoRelaxed,
    /// Backend mode without a portable equivalent
    Native(i32),
}

/// Surface pre-transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceTransform {
    #[default]
    Identity,
    Rotate90,
    Rotate180,
    Rotate270,
    /// Raw backend transform bits
    Native(u32),
}

/// Everything a surface reports about presentation on a given device
///
/// Queried fresh whenever the surface is (re)created; immutable until then.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceCapabilities {
    /// Supported (format, color space) pairs, in backend order
    pub formats: Vec<SurfaceFormat>,
    /// Supported present modes
    pub present_modes: Vec<PresentMode>,
    /// Minimum number of swap-chain images
    pub min_image_count: u32,
    /// Maximum number of swap-chain images (0 = unbounded)
    pub max_image_count: u32,
    /// Current surface transform
    pub current_transform: SurfaceTransform,
    /// Current surface extent, `None` when the swap chain decides
    pub current_extent: Option<Extent2D>,
    /// Smallest supported image extent
    pub min_image_extent: Extent2D,
    /// Largest supported image extent
    pub max_image_extent: Extent2D,
}

/// Queue family indices used by graphics and presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilies {
    /// Family owning the graphics queue
    pub graphics: u32,
    /// Family owning the present queue
    pub present: u32,
}

/// How swap-chain images are shared between queue families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharingMode {
    /// Owned by a single queue family
    Exclusive,
    /// Shared by both families without explicit ownership transfers
    Concurrent {
        graphics: u32,
        present: u32,
    },
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
