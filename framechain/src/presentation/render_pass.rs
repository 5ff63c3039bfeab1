/// Render-pass descriptors and the positional attachment layout
///
/// Render passes and framebuffers address attachments by index, so both sides
/// derive their layout from `attachment_slots`:
///
/// ```text
/// 0: swap-chain color image (resolve target when multisampled)
/// 1: depth-stencil buffer      (only with a depth-stencil format)
/// n: multisample color buffer  (only with samples > 1, always last)
/// ```

use crate::presentation::types::Format;

/// Load operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    /// Keep the existing content
    Load,
    /// Clear the content
    Clear,
    /// Contents are undefined, the caller overwrites every pixel
    DontCare,
}

/// Store operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    /// Store the rendered content
    Store,
    /// Discard the rendered content
    DontCare,
}

/// Format and load/store behavior of one attachment aspect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentDescriptor {
    pub format: Format,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
}

/// Which variant of the swap-chain render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPassKind {
    /// Contents are not preserved (first pass of a frame)
    Primary,
    /// Contents are loaded (resume rendering without clearing)
    Secondary,
}

impl RenderPassKind {
    fn load_op(self) -> LoadOp {
        match self {
            RenderPassKind::Primary => LoadOp::DontCare,
            RenderPassKind::Secondary => LoadOp::Load,
        }
    }
}

/// Role of an attachment at a given framebuffer index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentSlot {
    /// Swap-chain image view
    SwapChainColor,
    /// Shared depth-stencil buffer
    DepthStencil,
    /// Per-image multisample color buffer, resolved into `SwapChainColor`
    MultisampleColor,
}

/// Ordered attachment roles for a render pass / framebuffer pair
pub fn attachment_slots(has_depth_stencil: bool, multisampled: bool) -> Vec<AttachmentSlot> {
    let mut slots = vec![AttachmentSlot::SwapChainColor];
    if has_depth_stencil {
        slots.push(AttachmentSlot::DepthStencil);
    }
    if multisampled {
        slots.push(AttachmentSlot::MultisampleColor);
    }
    slots
}

/// Descriptor for creating a render pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPassDescriptor {
    /// Samples per pixel (1 = no multi-sampling)
    pub samples: u32,
    /// Color attachment
    pub color_attachment: AttachmentDescriptor,
    /// Depth aspect of the depth-stencil attachment
    pub depth_attachment: Option<AttachmentDescriptor>,
    /// Stencil aspect of the depth-stencil attachment
    pub stencil_attachment: Option<AttachmentDescriptor>,
}

impl RenderPassDescriptor {
    /// Build the descriptor for one of the two swap-chain render passes
    ///
    /// Depth and stencil descriptors are only present when `depth_stencil_format`
    /// carries the matching component. Color is always stored.
    pub fn for_swap_chain(
        kind: RenderPassKind,
        color_format: Format,
        depth_stencil_format: Format,
        samples: u32,
    ) -> Self {
        let load_op = kind.load_op();
        let aspect = |format: Format| AttachmentDescriptor {
            format,
            load_op,
            store_op: StoreOp::Store,
        };

        Self {
            samples,
            color_attachment: aspect(color_format),
            depth_attachment: depth_stencil_format
                .has_depth()
                .then(|| aspect(depth_stencil_format)),
            stencil_attachment: depth_stencil_format
                .has_stencil()
                .then(|| aspect(depth_stencil_format)),
        }
    }

    /// Format of the combined depth-stencil attachment, if any
    pub fn depth_stencil_format(&self) -> Option<Format> {
        self.depth_attachment
            .or(self.stencil_attachment)
            .map(|attachment| attachment.format)
    }

    /// Returns true if a depth-stencil attachment is part of the pass
    pub fn has_depth_stencil(&self) -> bool {
        self.depth_stencil_format().is_some()
    }

    /// Returns true if the pass renders into multisample buffers
    pub fn is_multisampled(&self) -> bool {
        self.samples > 1
    }

    /// Positional attachment layout of this pass
    pub fn attachment_slots(&self) -> Vec<AttachmentSlot> {
        attachment_slots(self.has_depth_stencil(), self.is_multisampled())
    }
}

#[cfg(test)]
#[path = "render_pass_tests.rs"]
mod tests;
