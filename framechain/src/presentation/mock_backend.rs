/// Mock presentation backend for unit tests (no GPU required)
///
/// Every native call is recorded in order. Handles are counted while alive and
/// log their destruction, so tests can check both what was built and in which
/// order it was torn down.

use std::collections::HashMap;
use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::{Arc, Mutex, MutexGuard};

use raw_window_handle::{RawDisplayHandle, RawWindowHandle, XlibDisplayHandle, XlibWindowHandle};

use crate::error::{Error, Result};
use crate::presentation::backend::{
    AttachmentBufferDescriptor, FramebufferAttachment, PresentationBackend, SwapChainCreateInfo,
};
use crate::presentation::render_pass::{AttachmentSlot, RenderPassDescriptor};
use crate::presentation::surface::{NativeHandle, WindowSurface};
use crate::presentation::types::{
    ColorSpace, Extent2D, Format, PresentMode, QueueFamilies, SurfaceCapabilities,
    SurfaceFormat, SurfaceTransform,
};

// ============================================================================
// Recorded calls
// ============================================================================

/// Kind of native object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockKind {
    Semaphore,
    Surface,
    RenderPass,
    SwapChain,
    Image,
    ImageView,
    Attachment,
    Framebuffer,
}

/// Native operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    CreateSemaphore,
    CreateSurface,
    QueryCapabilities,
    CreateRenderPass,
    CreateSwapChain,
    CreateImageView,
    CreateAttachment,
    CreateFramebuffer,
    Acquire,
    Submit,
    Present,
    WaitIdle,
}

impl MockOp {
    fn name(self) -> &'static str {
        match self {
            MockOp::CreateSemaphore => "create semaphore",
            MockOp::CreateSurface => "create surface",
            MockOp::QueryCapabilities => "query surface capabilities",
            MockOp::CreateRenderPass => "create render pass",
            MockOp::CreateSwapChain => "create swap chain",
            MockOp::CreateImageView => "create image view",
            MockOp::CreateAttachment => "create attachment",
            MockOp::CreateFramebuffer => "create framebuffer",
            MockOp::Acquire => "acquire next image",
            MockOp::Submit => "submit present dependency",
            MockOp::Present => "queue present",
            MockOp::WaitIdle => "wait graphics queue idle",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    CreateSemaphore { id: u64 },
    CreateSurface { id: u64 },
    QueryCapabilities { surface: u64 },
    CreateRenderPass { id: u64, desc: RenderPassDescriptor },
    CreateSwapChain { id: u64, surface: u64, info: SwapChainCreateInfo },
    CreateImageView { id: u64, image: u64, format: Format },
    CreateAttachment { id: u64, desc: AttachmentBufferDescriptor },
    CreateFramebuffer {
        id: u64,
        render_pass: u64,
        attachments: Vec<(AttachmentSlot, u64)>,
        extent: Extent2D,
    },
    Acquire { swap_chain: u64, signal: u64, index: u32 },
    Submit { wait: u64, signal: u64 },
    Present { swap_chain: u64, index: u32, wait: u64 },
    WaitIdle,
    Destroy { kind: MockKind, id: u64 },
}

// ============================================================================
// Shared state
// ============================================================================

struct MockState {
    calls: Vec<MockCall>,
    live: HashMap<MockKind, usize>,
    next_id: u64,
    capabilities: SurfaceCapabilities,
    queue_families: QueueFamilies,
    depth_formats: Vec<Format>,
    max_samples: u32,
    granted_image_count: Option<u32>,
    swap_chain_images: HashMap<u64, u32>,
    acquire_counter: u32,
    failures: Vec<MockOp>,
    out_of_date: Vec<MockOp>,
}

impl MockState {
    fn create(&mut self, kind: MockKind, state: &Arc<Mutex<MockState>>) -> MockHandle {
        self.next_id += 1;
        *self.live.entry(kind).or_insert(0) += 1;
        MockHandle {
            kind,
            id: self.next_id,
            state: Arc::clone(state),
        }
    }

    fn check(&mut self, op: MockOp) -> Result<()> {
        if let Some(pos) = self.failures.iter().position(|f| *f == op) {
            self.failures.remove(pos);
            return Err(Error::backend(op.name(), -1));
        }
        if let Some(pos) = self.out_of_date.iter().position(|f| *f == op) {
            self.out_of_date.remove(pos);
            return Err(Error::out_of_date(op.name()));
        }
        Ok(())
    }
}

/// Owned mock object, logs its destruction when dropped
#[derive(Debug)]
pub struct MockHandle {
    pub kind: MockKind,
    pub id: u64,
    state: Arc<Mutex<MockState>>,
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(count) = state.live.get_mut(&self.kind) {
                *count = count.saturating_sub(1);
            }
            state.calls.push(MockCall::Destroy { kind: self.kind, id: self.id });
        }
    }
}

impl std::fmt::Debug for MockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockState").field("calls", &self.calls.len()).finish()
    }
}

// ============================================================================
// Mock backend
// ============================================================================

/// Default capabilities: one BGRA8/sRGB format, FIFO + mailbox + immediate,
/// 2..3 images, extents 1x1..4096x4096
pub fn default_capabilities() -> SurfaceCapabilities {
    SurfaceCapabilities {
        formats: vec![SurfaceFormat::new(Format::B8G8R8A8_UNORM, ColorSpace::SrgbNonlinear)],
        present_modes: vec![PresentMode::Fifo, PresentMode::Mailbox, PresentMode::Immediate],
        min_image_count: 2,
        max_image_count: 3,
        current_transform: SurfaceTransform::Identity,
        current_extent: None,
        min_image_extent: Extent2D::new(1, 1),
        max_image_extent: Extent2D::new(4096, 4096),
    }
}

#[derive(Debug)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                calls: Vec::new(),
                live: HashMap::new(),
                next_id: 0,
                capabilities: default_capabilities(),
                queue_families: QueueFamilies { graphics: 0, present: 0 },
                depth_formats: vec![
                    Format::D16_UNORM,
                    Format::D24_UNORM_S8_UINT,
                    Format::D32_FLOAT,
                    Format::D32_FLOAT_S8_UINT,
                ],
                max_samples: 8,
                granted_image_count: None,
                swap_chain_images: HashMap::new(),
                acquire_counter: 0,
                failures: Vec::new(),
                out_of_date: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    // ===== CONFIGURATION =====

    /// Capabilities reported by surfaces queried from now on
    pub fn set_capabilities(&self, capabilities: SurfaceCapabilities) {
        self.lock().capabilities = capabilities;
    }

    pub fn set_queue_families(&self, families: QueueFamilies) {
        self.lock().queue_families = families;
    }

    pub fn set_depth_formats(&self, formats: Vec<Format>) {
        self.lock().depth_formats = formats;
    }

    pub fn set_max_samples(&self, samples: u32) {
        self.lock().max_samples = samples;
    }

    /// Grant this many images regardless of the requested minimum
    pub fn set_granted_image_count(&self, count: Option<u32>) {
        self.lock().granted_image_count = count;
    }

    /// Next call of `op` fails with a backend error
    pub fn fail_next(&self, op: MockOp) {
        self.lock().failures.push(op);
    }

    /// Next call of `op` reports an out-of-date surface
    pub fn out_of_date_next(&self, op: MockOp) {
        self.lock().out_of_date.push(op);
    }

    // ===== INSPECTION =====

    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Number of recorded calls matching `pred`
    pub fn count<F: Fn(&MockCall) -> bool>(&self, pred: F) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    /// Number of live objects of `kind`
    pub fn live(&self, kind: MockKind) -> usize {
        self.lock().live.get(&kind).copied().unwrap_or(0)
    }

    /// Framebuffer creations, in call order
    pub fn framebuffers(&self) -> Vec<Vec<(AttachmentSlot, u64)>> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                MockCall::CreateFramebuffer { attachments, .. } => Some(attachments.clone()),
                _ => None,
            })
            .collect()
    }

    /// Swap-chain creations, in call order
    pub fn swap_chain_infos(&self) -> Vec<SwapChainCreateInfo> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                MockCall::CreateSwapChain { info, .. } => Some(*info),
                _ => None,
            })
            .collect()
    }

    /// Attachment creations, in call order
    pub fn attachments(&self) -> Vec<AttachmentBufferDescriptor> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                MockCall::CreateAttachment { desc, .. } => Some(*desc),
                _ => None,
            })
            .collect()
    }

    /// Index of the first call matching `pred`
    pub fn position<F: Fn(&MockCall) -> bool>(&self, pred: F) -> Option<usize> {
        self.lock().calls.iter().position(pred)
    }
}

impl PresentationBackend for MockBackend {
    type Surface = MockHandle;
    type NativeSwapChain = MockHandle;
    type Image = MockHandle;
    type ImageView = MockHandle;
    type RenderPass = MockHandle;
    type Framebuffer = MockHandle;
    type Semaphore = MockHandle;
    type AttachmentBuffer = MockHandle;

    fn create_semaphore(&self) -> Result<MockHandle> {
        let mut state = self.lock();
        state.check(MockOp::CreateSemaphore)?;
        let handle = state.create(MockKind::Semaphore, &self.state);
        state.calls.push(MockCall::CreateSemaphore { id: handle.id });
        Ok(handle)
    }

    fn wait_graphics_queue_idle(&self) -> Result<()> {
        let mut state = self.lock();
        state.check(MockOp::WaitIdle)?;
        state.calls.push(MockCall::WaitIdle);
        Ok(())
    }

    fn create_surface(&self, window: &dyn WindowSurface) -> Result<MockHandle> {
        window.native_handle()?;
        let mut state = self.lock();
        state.check(MockOp::CreateSurface)?;
        let handle = state.create(MockKind::Surface, &self.state);
        state.calls.push(MockCall::CreateSurface { id: handle.id });
        Ok(handle)
    }

    fn query_surface_capabilities(&self, surface: &MockHandle) -> Result<SurfaceCapabilities> {
        let mut state = self.lock();
        state.check(MockOp::QueryCapabilities)?;
        state.calls.push(MockCall::QueryCapabilities { surface: surface.id });
        Ok(state.capabilities.clone())
    }

    fn queue_families(&self, _surface: &MockHandle) -> Result<QueueFamilies> {
        Ok(self.lock().queue_families)
    }

    fn supports_depth_stencil_format(&self, format: Format) -> bool {
        self.lock().depth_formats.contains(&format)
    }

    fn max_sample_count(&self) -> u32 {
        self.lock().max_samples
    }

    fn create_render_pass(&self, desc: &RenderPassDescriptor) -> Result<MockHandle> {
        let mut state = self.lock();
        state.check(MockOp::CreateRenderPass)?;
        let handle = state.create(MockKind::RenderPass, &self.state);
        state.calls.push(MockCall::CreateRenderPass { id: handle.id, desc: desc.clone() });
        Ok(handle)
    }

    fn create_swap_chain(&self, surface: &MockHandle, info: &SwapChainCreateInfo) -> Result<MockHandle> {
        let mut state = self.lock();
        state.check(MockOp::CreateSwapChain)?;
        let handle = state.create(MockKind::SwapChain, &self.state);
        let granted = state.granted_image_count.unwrap_or(info.min_image_count);
        state.swap_chain_images.insert(handle.id, granted);
        state.calls.push(MockCall::CreateSwapChain {
            id: handle.id,
            surface: surface.id,
            info: *info,
        });
        Ok(handle)
    }

    fn swap_chain_images(&self, swap_chain: &MockHandle) -> Result<Vec<MockHandle>> {
        let mut state = self.lock();
        let count = state.swap_chain_images.get(&swap_chain.id).copied().unwrap_or(0);
        Ok((0..count)
            .map(|_| state.create(MockKind::Image, &self.state))
            .collect())
    }

    fn create_image_view(&self, image: &MockHandle, format: Format) -> Result<MockHandle> {
        let mut state = self.lock();
        state.check(MockOp::CreateImageView)?;
        let handle = state.create(MockKind::ImageView, &self.state);
        state.calls.push(MockCall::CreateImageView { id: handle.id, image: image.id, format });
        Ok(handle)
    }

    fn create_attachment(&self, desc: &AttachmentBufferDescriptor) -> Result<MockHandle> {
        let mut state = self.lock();
        state.check(MockOp::CreateAttachment)?;
        let handle = state.create(MockKind::Attachment, &self.state);
        state.calls.push(MockCall::CreateAttachment { id: handle.id, desc: *desc });
        Ok(handle)
    }

    fn create_framebuffer(
        &self,
        render_pass: &MockHandle,
        attachments: &[FramebufferAttachment<'_, Self>],
        extent: Extent2D,
    ) -> Result<MockHandle> {
        let attachments = attachments
            .iter()
            .map(|attachment| {
                let id = match attachment {
                    FramebufferAttachment::SwapChainImage(view) => view.id,
                    FramebufferAttachment::DepthStencil(buffer)
                    | FramebufferAttachment::Multisample(buffer) => buffer.id,
                };
                (attachment.slot(), id)
            })
            .collect();

        let mut state = self.lock();
        state.check(MockOp::CreateFramebuffer)?;
        let handle = state.create(MockKind::Framebuffer, &self.state);
        state.calls.push(MockCall::CreateFramebuffer {
            id: handle.id,
            render_pass: render_pass.id,
            attachments,
            extent,
        });
        Ok(handle)
    }

    fn acquire_next_image(&self, swap_chain: &MockHandle, signal: &MockHandle) -> Result<u32> {
        let mut state = self.lock();
        state.check(MockOp::Acquire)?;
        let count = state.swap_chain_images.get(&swap_chain.id).copied().unwrap_or(1).max(1);
        let index = state.acquire_counter % count;
        state.acquire_counter += 1;
        state.calls.push(MockCall::Acquire {
            swap_chain: swap_chain.id,
            signal: signal.id,
            index,
        });
        Ok(index)
    }

    fn submit_present_dependency(&self, wait: &MockHandle, signal: &MockHandle) -> Result<()> {
        let mut state = self.lock();
        state.check(MockOp::Submit)?;
        state.calls.push(MockCall::Submit { wait: wait.id, signal: signal.id });
        Ok(())
    }

    fn queue_present(&self, swap_chain: &MockHandle, image_index: u32, wait: &MockHandle) -> Result<()> {
        let mut state = self.lock();
        state.check(MockOp::Present)?;
        state.calls.push(MockCall::Present {
            swap_chain: swap_chain.id,
            index: image_index,
            wait: wait.id,
        });
        Ok(())
    }
}

// ============================================================================
// Mock window
// ============================================================================

#[derive(Debug)]
pub struct MockWindow {
    pub extent: Mutex<Extent2D>,
    pub fullscreen: Mutex<bool>,
}

impl MockWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            extent: Mutex::new(Extent2D::new(width, height)),
            fullscreen: Mutex::new(false),
        }
    }
}

impl WindowSurface for MockWindow {
    fn native_handle(&self) -> Result<NativeHandle> {
        let window = XlibWindowHandle::new(1);
        let display = XlibDisplayHandle::new(Some(NonNull::<c_void>::dangling()), 0);
        Ok(NativeHandle {
            window: RawWindowHandle::Xlib(window),
            display: RawDisplayHandle::Xlib(display),
        })
    }

    fn content_extent(&self) -> Extent2D {
        *self.extent.lock().unwrap()
    }

    fn set_fullscreen(&self, fullscreen: bool) {
        *self.fullscreen.lock().unwrap() = fullscreen;
    }
}
