/// RenderPass - VkRenderPass built from a RenderPassDescriptor
///
/// Attachment indices follow `RenderPassDescriptor::attachment_slots()`. With
/// multi-sampling the swap-chain image becomes the single-sample resolve
/// target and rendering goes to the multisample color attachment.

use ash::vk;
use framechain::presentation::{AttachmentSlot, LoadOp, RenderPassDescriptor, StoreOp};
use framechain::{render_error, Error, Result};

use crate::vulkan_format::{format_to_vk, load_op_to_vk, sample_count_to_vk, status_code, store_op_to_vk};

/// Vulkan render pass, destroyed when dropped
pub struct RenderPass {
    /// Vulkan render pass handle
    pub(crate) render_pass: vk::RenderPass,
    /// Vulkan device (for cleanup)
    pub(crate) device: ash::Device,
}

impl RenderPass {
    /// Raw handle, for `vkCmdBeginRenderPass` and pipeline creation
    pub fn handle(&self) -> vk::RenderPass {
        self.render_pass
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_render_pass(self.render_pass, None);
        }
    }
}

fn initial_layout(load_op: LoadOp, loaded_layout: vk::ImageLayout) -> vk::ImageLayout {
    if load_op == LoadOp::Load {
        loaded_layout
    } else {
        vk::ImageLayout::UNDEFINED
    }
}

/// Attachment descriptions in slot order
pub(crate) fn attachment_descriptions(desc: &RenderPassDescriptor) -> Vec<vk::AttachmentDescription> {
    let samples = sample_count_to_vk(desc.samples);
    let color = desc.color_attachment;

    desc.attachment_slots()
        .into_iter()
        .map(|slot| match slot {
            AttachmentSlot::SwapChainColor if desc.is_multisampled() => {
                // Resolve target: fully overwritten by the resolve
                vk::AttachmentDescription::default()
                    .format(format_to_vk(color.format))
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .store_op(store_op_to_vk(color.store_op))
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(vk::ImageLayout::UNDEFINED)
                    .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)
            }
            AttachmentSlot::SwapChainColor => vk::AttachmentDescription::default()
                .format(format_to_vk(color.format))
                .samples(vk::SampleCountFlags::TYPE_1)
                .load_op(load_op_to_vk(color.load_op))
                .store_op(store_op_to_vk(color.store_op))
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(initial_layout(color.load_op, vk::ImageLayout::PRESENT_SRC_KHR))
                .final_layout(vk::ImageLayout::PRESENT_SRC_KHR),
            AttachmentSlot::DepthStencil => {
                let depth = desc.depth_attachment;
                let stencil = desc.stencil_attachment;
                let format = desc
                    .depth_stencil_format()
                    .unwrap_or(framechain::Format::UNDEFINED);
                let loads = depth.map(|d| d.load_op).or(stencil.map(|s| s.load_op));

                vk::AttachmentDescription::default()
                    .format(format_to_vk(format))
                    .samples(samples)
                    .load_op(depth.map_or(vk::AttachmentLoadOp::DONT_CARE, |d| load_op_to_vk(d.load_op)))
                    .store_op(depth.map_or(vk::AttachmentStoreOp::DONT_CARE, |d| store_op_to_vk(d.store_op)))
                    .stencil_load_op(stencil.map_or(vk::AttachmentLoadOp::DONT_CARE, |s| load_op_to_vk(s.load_op)))
                    .stencil_store_op(stencil.map_or(vk::AttachmentStoreOp::DONT_CARE, |s| store_op_to_vk(s.store_op)))
                    .initial_layout(initial_layout(
                        loads.unwrap_or(LoadOp::DontCare),
                        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
                    ))
                    .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
            }
            AttachmentSlot::MultisampleColor => vk::AttachmentDescription::default()
                .format(format_to_vk(color.format))
                .samples(samples)
                .load_op(load_op_to_vk(color.load_op))
                .store_op(store_op_to_vk(StoreOp::Store))
                .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                .initial_layout(initial_layout(color.load_op, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL))
                .final_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL),
        })
        .collect()
}

/// Create the render pass described by `desc`
pub(crate) fn create_render_pass(device: &ash::Device, desc: &RenderPassDescriptor) -> Result<RenderPass> {
    let slots = desc.attachment_slots();
    let index_of = |slot: AttachmentSlot| slots.iter().position(|s| *s == slot).map(|i| i as u32);

    let attachments = attachment_descriptions(desc);

    let swap_index = index_of(AttachmentSlot::SwapChainColor).unwrap_or(0);
    let (color_index, resolve_index) = match index_of(AttachmentSlot::MultisampleColor) {
        Some(msaa_index) => (msaa_index, Some(swap_index)),
        None => (swap_index, None),
    };

    let color_refs = [vk::AttachmentReference::default()
        .attachment(color_index)
        .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)];
    let resolve_refs: Vec<vk::AttachmentReference> = resolve_index
        .map(|index| {
            vk::AttachmentReference::default()
                .attachment(index)
                .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
        })
        .into_iter()
        .collect();
    let depth_ref = index_of(AttachmentSlot::DepthStencil).map(|index| {
        vk::AttachmentReference::default()
            .attachment(index)
            .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
    });

    let mut subpass = vk::SubpassDescription::default()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(&color_refs);
    if !resolve_refs.is_empty() {
        subpass = subpass.resolve_attachments(&resolve_refs);
    }
    if let Some(ref depth_ref) = depth_ref {
        subpass = subpass.depth_stencil_attachment(depth_ref);
    }

    // Include depth stages when a depth-stencil attachment is present
    let (stage_mask, access_mask) = if depth_ref.is_some() {
        (
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        )
    } else {
        (
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
        )
    };

    let dependency = vk::SubpassDependency::default()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(stage_mask)
        .src_access_mask(vk::AccessFlags::empty())
        .dst_stage_mask(stage_mask)
        .dst_access_mask(access_mask);

    let render_pass_info = vk::RenderPassCreateInfo::default()
        .attachments(&attachments)
        .subpasses(std::slice::from_ref(&subpass))
        .dependencies(std::slice::from_ref(&dependency));

    let render_pass = unsafe { device.create_render_pass(&render_pass_info, None) }.map_err(|e| {
        render_error!("framechain::vulkan", "Failed to create render pass: {:?}", e);
        Error::backend("vkCreateRenderPass", status_code(e))
    })?;

    Ok(RenderPass {
        render_pass,
        device: device.clone(),
    })
}
