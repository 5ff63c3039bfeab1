/// Conversions between framechain enums and Vulkan enums
///
/// Values without a portable equivalent round-trip through the `Native`
/// variants, so nothing reported by the driver is lost.

use ash::vk;
use framechain::presentation::{
    ColorSpace, Format, FormatAspects, LoadOp, PresentMode, StoreOp, SurfaceTransform,
};

pub(crate) fn format_to_vk(format: Format) -> vk::Format {
    match format {
        Format::UNDEFINED => vk::Format::UNDEFINED,
        Format::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        Format::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        Format::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        Format::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        Format::A2B10G10R10_UNORM => vk::Format::A2B10G10R10_UNORM_PACK32,
        Format::R16G16B16A16_SFLOAT => vk::Format::R16G16B16A16_SFLOAT,
        Format::D16_UNORM => vk::Format::D16_UNORM,
        Format::D16_UNORM_S8_UINT => vk::Format::D16_UNORM_S8_UINT,
        Format::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
        Format::D32_FLOAT => vk::Format::D32_SFLOAT,
        Format::D32_FLOAT_S8_UINT => vk::Format::D32_SFLOAT_S8_UINT,
        Format::Native(raw) => vk::Format::from_raw(raw),
    }
}

pub(crate) fn format_from_vk(format: vk::Format) -> Format {
    match format {
        vk::Format::UNDEFINED => Format::UNDEFINED,
        vk::Format::R8G8B8A8_UNORM => Format::R8G8B8A8_UNORM,
        vk::Format::R8G8B8A8_SRGB => Format::R8G8B8A8_SRGB,
        vk::Format::B8G8R8A8_UNORM => Format::B8G8R8A8_UNORM,
        vk::Format::B8G8R8A8_SRGB => Format::B8G8R8A8_SRGB,
        vk::Format::A2B10G10R10_UNORM_PACK32 => Format::A2B10G10R10_UNORM,
        vk::Format::R16G16B16A16_SFLOAT => Format::R16G16B16A16_SFLOAT,
        vk::Format::D16_UNORM => Format::D16_UNORM,
        vk::Format::D16_UNORM_S8_UINT => Format::D16_UNORM_S8_UINT,
        vk::Format::D24_UNORM_S8_UINT => Format::D24_UNORM_S8_UINT,
        vk::Format::D32_SFLOAT => Format::D32_FLOAT,
        vk::Format::D32_SFLOAT_S8_UINT => Format::D32_FLOAT_S8_UINT,
        other => Format::Native(other.as_raw()),
    }
}

pub(crate) fn color_space_to_vk(color_space: ColorSpace) -> vk::ColorSpaceKHR {
    match color_space {
        ColorSpace::SrgbNonlinear => vk::ColorSpaceKHR::SRGB_NONLINEAR,
        ColorSpace::ExtendedSrgbLinear => vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
        ColorSpace::Hdr10St2084 => vk::ColorSpaceKHR::HDR10_ST2084_EXT,
        ColorSpace::Native(raw) => vk::ColorSpaceKHR::from_raw(raw),
    }
}

pub(crate) fn color_space_from_vk(color_space: vk::ColorSpaceKHR) -> ColorSpace {
    match color_space {
        vk::ColorSpaceKHR::SRGB_NONLINEAR => ColorSpace::SrgbNonlinear,
        vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT => ColorSpace::ExtendedSrgbLinear,
        vk::ColorSpaceKHR::HDR10_ST2084_EXT => ColorSpace::Hdr10St2084,
        other => ColorSpace::Native(other.as_raw()),
    }
}

pub(crate) fn present_mode_to_vk(mode: PresentMode) -> vk::PresentModeKHR {
    match mode {
        PresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
        PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
        PresentMode::Fifo => vk::PresentModeKHR::FIFO,
        PresentMode::FifoRelaxed => vk::PresentModeKHR::FIFO_RELAXED,
        PresentMode::Native(raw) => vk::PresentModeKHR::from_raw(raw),
    }
}

pub(crate) fn present_mode_from_vk(mode: vk::PresentModeKHR) -> PresentMode {
    match mode {
        vk::PresentModeKHR::IMMEDIATE => PresentMode::Immediate,
        vk::PresentModeKHR::MAILBOX => PresentMode::Mailbox,
        vk::PresentModeKHR::FIFO => PresentMode::Fifo,
        vk::PresentModeKHR::FIFO_RELAXED => PresentMode::FifoRelaxed,
        other => PresentMode::Native(other.as_raw()),
    }
}

pub(crate) fn transform_to_vk(transform: SurfaceTransform) -> vk::SurfaceTransformFlagsKHR {
    match transform {
        SurfaceTransform::Identity => vk::SurfaceTransformFlagsKHR::IDENTITY,
        SurfaceTransform::Rotate90 => vk::SurfaceTransformFlagsKHR::ROTATE_90,
        SurfaceTransform::Rotate180 => vk::SurfaceTransformFlagsKHR::ROTATE_180,
        SurfaceTransform::Rotate270 => vk::SurfaceTransformFlagsKHR::ROTATE_270,
        SurfaceTransform::Native(bits) => vk::SurfaceTransformFlagsKHR::from_raw(bits),
    }
}

pub(crate) fn transform_from_vk(transform: vk::SurfaceTransformFlagsKHR) -> SurfaceTransform {
    match transform {
        vk::SurfaceTransformFlagsKHR::IDENTITY => SurfaceTransform::Identity,
        vk::SurfaceTransformFlagsKHR::ROTATE_90 => SurfaceTransform::Rotate90,
        vk::SurfaceTransformFlagsKHR::ROTATE_180 => SurfaceTransform::Rotate180,
        vk::SurfaceTransformFlagsKHR::ROTATE_270 => SurfaceTransform::Rotate270,
        other => SurfaceTransform::Native(other.as_raw()),
    }
}

/// Unsupported counts fall back to a single sample
pub(crate) fn sample_count_to_vk(samples: u32) -> vk::SampleCountFlags {
    match samples {
        2 => vk::SampleCountFlags::TYPE_2,
        4 => vk::SampleCountFlags::TYPE_4,
        8 => vk::SampleCountFlags::TYPE_8,
        16 => vk::SampleCountFlags::TYPE_16,
        32 => vk::SampleCountFlags::TYPE_32,
        64 => vk::SampleCountFlags::TYPE_64,
        _ => vk::SampleCountFlags::TYPE_1,
    }
}

/// Highest sample count present in `flags` (1 when empty)
pub(crate) fn max_sample_count(flags: vk::SampleCountFlags) -> u32 {
    [64, 32, 16, 8, 4, 2]
        .into_iter()
        .find(|&count| flags.contains(sample_count_to_vk(count)))
        .unwrap_or(1)
}

pub(crate) fn load_op_to_vk(load_op: LoadOp) -> vk::AttachmentLoadOp {
    match load_op {
        LoadOp::Load => vk::AttachmentLoadOp::LOAD,
        LoadOp::Clear => vk::AttachmentLoadOp::CLEAR,
        LoadOp::DontCare => vk::AttachmentLoadOp::DONT_CARE,
    }
}

pub(crate) fn store_op_to_vk(store_op: StoreOp) -> vk::AttachmentStoreOp {
    match store_op {
        StoreOp::Store => vk::AttachmentStoreOp::STORE,
        StoreOp::DontCare => vk::AttachmentStoreOp::DONT_CARE,
    }
}

pub(crate) fn aspect_flags(format: Format) -> vk::ImageAspectFlags {
    let aspects = format.aspects();
    let mut flags = vk::ImageAspectFlags::empty();
    if aspects.contains(FormatAspects::COLOR) {
        flags |= vk::ImageAspectFlags::COLOR;
    }
    if aspects.contains(FormatAspects::DEPTH) {
        flags |= vk::ImageAspectFlags::DEPTH;
    }
    if aspects.contains(FormatAspects::STENCIL) {
        flags |= vk::ImageAspectFlags::STENCIL;
    }
    flags
}

/// Status code carried by `Error::BackendError`
pub(crate) fn status_code(result: vk::Result) -> i32 {
    result.as_raw()
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
