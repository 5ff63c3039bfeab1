//! Unit tests for swap_chain.rs
//!
//! Drives SwapChain through MockBackend: construction, the present loop,
//! resize and vsync rebuilds, failure handling and teardown order.

use std::sync::Arc;

use crate::config::SwapChainDescriptor;
use crate::error::Error;
use crate::presentation::mock_backend::*;
use crate::presentation::render_context::RenderContext;
use crate::presentation::render_pass::{AttachmentSlot, LoadOp};
use crate::presentation::surface::WindowSurface;
use crate::presentation::backend::AttachmentKind;
use crate::presentation::swap_chain::{SwapChain, SwapChainStatus};
use crate::presentation::types::*;

fn create(
    desc: SwapChainDescriptor,
) -> (Arc<MockBackend>, Arc<MockWindow>, SwapChain<MockBackend>) {
    create_with(MockBackend::new(), desc)
}

fn create_with(
    backend: MockBackend,
    desc: SwapChainDescriptor,
) -> (Arc<MockBackend>, Arc<MockWindow>, SwapChain<MockBackend>) {
    let backend = Arc::new(backend);
    let window = Arc::new(MockWindow::new(desc.resolution.width, desc.resolution.height));
    let surface: Arc<dyn WindowSurface> = window.clone();
    let swap_chain = SwapChain::new(backend.clone(), surface, desc).unwrap();
    (backend, window, swap_chain)
}

fn try_create(backend: &Arc<MockBackend>, desc: SwapChainDescriptor) -> crate::Result<SwapChain<MockBackend>> {
    let window: Arc<dyn WindowSurface> = Arc::new(MockWindow::new(800, 600));
    SwapChain::new(backend.clone(), window, desc)
}

const ALL_KINDS: [MockKind; 8] = [
    MockKind::Semaphore,
    MockKind::Surface,
    MockKind::RenderPass,
    MockKind::SwapChain,
    MockKind::Image,
    MockKind::ImageView,
    MockKind::Attachment,
    MockKind::Framebuffer,
];

fn assert_nothing_alive(backend: &MockBackend) {
    for kind in ALL_KINDS {
        assert_eq!(backend.live(kind), 0, "{:?} still alive", kind);
    }
}

fn semaphore_ids(backend: &MockBackend) -> Vec<u64> {
    backend
        .calls()
        .iter()
        .filter_map(|c| match c {
            MockCall::CreateSemaphore { id } => Some(*id),
            _ => None,
        })
        .collect()
}

fn destroy_position(backend: &MockBackend, kind: MockKind) -> usize {
    backend
        .position(|c| matches!(c, MockCall::Destroy { kind: k, .. } if *k == kind))
        .unwrap()
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn test_new_with_default_descriptor() {
    let (backend, _window, swap_chain) = create(SwapChainDescriptor::default());

    assert_eq!(swap_chain.status(), SwapChainStatus::FrameAcquired);
    assert_eq!(swap_chain.extent(), Extent2D::new(800, 600));
    assert_eq!(swap_chain.image_count(), 2);
    assert_eq!(swap_chain.color_format(), Format::B8G8R8A8_UNORM);
    assert_eq!(swap_chain.depth_stencil_format(), Format::D24_UNORM_S8_UINT);
    assert!(swap_chain.has_depth_stencil_buffer());
    assert!(!swap_chain.has_multi_sampling());
    assert_eq!(swap_chain.present_mode(), PresentMode::Fifo);
    assert!(swap_chain.current_framebuffer().is_ok());

    assert_eq!(backend.live(MockKind::Semaphore), 2);
    assert_eq!(backend.live(MockKind::Surface), 1);
    assert_eq!(backend.live(MockKind::RenderPass), 2);
    assert_eq!(backend.live(MockKind::SwapChain), 1);
    assert_eq!(backend.live(MockKind::ImageView), 2);
    assert_eq!(backend.live(MockKind::Attachment), 1);
    assert_eq!(backend.live(MockKind::Framebuffer), 2);
    assert_eq!(backend.count(|c| matches!(c, MockCall::Acquire { .. })), 1);
}

#[test]
fn test_new_builds_primary_and_secondary_render_passes() {
    let (backend, _window, _swap_chain) = create(SwapChainDescriptor::default());

    let passes: Vec<_> = backend
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            MockCall::CreateRenderPass { desc, .. } => Some(desc),
            _ => None,
        })
        .collect();

    assert_eq!(passes.len(), 2);
    assert_eq!(passes[0].color_attachment.load_op, LoadOp::DontCare);
    assert_eq!(passes[1].color_attachment.load_op, LoadOp::Load);
    for pass in &passes {
        assert!(pass.depth_attachment.is_some());
        assert!(pass.stencil_attachment.is_some());
    }
}

#[test]
fn test_end_to_end_buffer_count_format_and_mode() {
    let backend = MockBackend::new();
    backend.set_capabilities(SurfaceCapabilities {
        formats: vec![SurfaceFormat::new(Format::B8G8R8A8_UNORM, ColorSpace::SrgbNonlinear)],
        present_modes: vec![PresentMode::Fifo],
        min_image_count: 2,
        max_image_count: 3,
        ..default_capabilities()
    });
    let desc = SwapChainDescriptor::default()
        .with_swap_buffers(4)
        .with_vsync_interval(1);

    let (backend, _window, swap_chain) = create_with(backend, desc);

    let info = backend.swap_chain_infos()[0];
    assert_eq!(info.min_image_count, 3);
    assert_eq!(swap_chain.image_count(), 3);
    assert_eq!(
        swap_chain.surface_format(),
        SurfaceFormat::new(Format::B8G8R8A8_UNORM, ColorSpace::SrgbNonlinear)
    );
    assert_eq!(swap_chain.present_mode(), PresentMode::Fifo);
}

#[test]
fn test_end_to_end_depth_stencil_selection() {
    let backend = MockBackend::new();
    backend.set_depth_formats(vec![Format::D24_UNORM_S8_UINT]);
    let desc = SwapChainDescriptor::default().with_depth_stencil(24, 8);

    let (backend, _window, swap_chain) = create_with(backend, desc);

    assert_eq!(swap_chain.depth_stencil_format(), Format::D24_UNORM_S8_UINT);
    assert!(swap_chain.has_depth_stencil_buffer());
    let attachments = backend.attachments();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].kind, AttachmentKind::DepthStencil);
    assert_eq!(attachments[0].format, Format::D24_UNORM_S8_UINT);
}

#[test]
fn test_single_sample_without_depth_has_color_only_framebuffers() {
    let desc = SwapChainDescriptor::default()
        .with_samples(1)
        .with_depth_stencil(0, 0);
    let (backend, _window, swap_chain) = create(desc);

    assert!(!swap_chain.has_multi_sampling());
    assert!(!swap_chain.has_depth_stencil_buffer());
    assert_eq!(swap_chain.depth_stencil_format(), Format::UNDEFINED);
    assert!(backend.attachments().is_empty());
    for framebuffer in backend.framebuffers() {
        assert_eq!(framebuffer.len(), 1);
        assert_eq!(framebuffer[0].0, AttachmentSlot::SwapChainColor);
    }
}

#[test]
fn test_single_sample_with_depth_has_two_attachments() {
    let (backend, _window, _swap_chain) = create(SwapChainDescriptor::default().with_samples(1));

    assert!(backend
        .attachments()
        .iter()
        .all(|a| a.kind != AttachmentKind::MultisampleColor));
    for framebuffer in backend.framebuffers() {
        let slots: Vec<_> = framebuffer.iter().map(|(slot, _)| *slot).collect();
        assert_eq!(slots, vec![AttachmentSlot::SwapChainColor, AttachmentSlot::DepthStencil]);
    }
}

#[test]
fn test_multisampling_attachment_order_and_sharing() {
    let desc = SwapChainDescriptor::default().with_samples(4);
    let (backend, _window, swap_chain) = create(desc);

    assert!(swap_chain.has_multi_sampling());
    assert_eq!(swap_chain.sample_count(), 4);

    let framebuffers = backend.framebuffers();
    assert_eq!(framebuffers.len(), swap_chain.image_count());

    let depth_id = framebuffers[0][1].1;
    let mut msaa_ids = Vec::new();
    for framebuffer in &framebuffers {
        let slots: Vec<_> = framebuffer.iter().map(|(slot, _)| *slot).collect();
        assert_eq!(
            slots,
            vec![
                AttachmentSlot::SwapChainColor,
                AttachmentSlot::DepthStencil,
                AttachmentSlot::MultisampleColor,
            ]
        );
        // One depth-stencil buffer shared by every image
        assert_eq!(framebuffer[1].1, depth_id);
        msaa_ids.push(framebuffer[2].1);
    }
    msaa_ids.sort();
    msaa_ids.dedup();
    assert_eq!(msaa_ids.len(), framebuffers.len());

    let attachments = backend.attachments();
    let msaa: Vec<_> = attachments
        .iter()
        .filter(|a| a.kind == AttachmentKind::MultisampleColor)
        .collect();
    assert_eq!(msaa.len(), swap_chain.image_count());
    assert!(msaa.iter().all(|a| a.samples == 4 && a.format == Format::B8G8R8A8_UNORM));
}

#[test]
fn test_sample_count_limited_by_device() {
    let backend = MockBackend::new();
    backend.set_max_samples(8);
    let (_backend, _window, swap_chain) =
        create_with(backend, SwapChainDescriptor::default().with_samples(16));
    assert_eq!(swap_chain.sample_count(), 8);
}

#[test]
fn test_granted_image_count_is_re_read() {
    let backend = MockBackend::new();
    backend.set_granted_image_count(Some(4));
    let (backend, _window, swap_chain) = create_with(backend, SwapChainDescriptor::default());

    assert_eq!(swap_chain.image_count(), 4);
    assert_eq!(backend.framebuffers().len(), 4);
    assert_eq!(backend.live(MockKind::ImageView), 4);
}

#[test]
fn test_swap_chain_info_carries_transform_and_sharing() {
    let backend = MockBackend::new();
    backend.set_capabilities(SurfaceCapabilities {
        current_transform: SurfaceTransform::Rotate90,
        ..default_capabilities()
    });
    backend.set_queue_families(QueueFamilies { graphics: 0, present: 1 });

    let (backend, _window, _swap_chain) = create_with(backend, SwapChainDescriptor::default());

    let info = backend.swap_chain_infos()[0];
    assert_eq!(info.transform, SurfaceTransform::Rotate90);
    assert_eq!(info.sharing, SharingMode::Concurrent { graphics: 0, present: 1 });
}

#[test]
fn test_fullscreen_descriptor_switches_window() {
    let (_backend, window, mut swap_chain) =
        create(SwapChainDescriptor::default().with_fullscreen(true));
    assert!(*window.fullscreen.lock().unwrap());

    assert!(swap_chain.set_fullscreen(false));
    assert!(!*window.fullscreen.lock().unwrap());
    assert!(!swap_chain.set_fullscreen(false));
}

// ============================================================================
// CONSTRUCTION FAILURES
// ============================================================================

#[test]
fn test_no_surface_formats_is_configuration_error() {
    let backend = Arc::new(MockBackend::new());
    backend.set_capabilities(SurfaceCapabilities {
        formats: Vec::new(),
        ..default_capabilities()
    });

    let result = try_create(&backend, SwapChainDescriptor::default());
    assert!(matches!(result, Err(Error::Configuration(_))));
    assert_nothing_alive(&backend);
}

#[test]
fn test_no_depth_stencil_format_is_configuration_error() {
    let backend = Arc::new(MockBackend::new());
    backend.set_depth_formats(Vec::new());

    let result = try_create(&backend, SwapChainDescriptor::default());
    assert!(matches!(result, Err(Error::Configuration(_))));
    assert_nothing_alive(&backend);
}

#[test]
fn test_failed_construction_leaves_window_windowed() {
    let backend = Arc::new(MockBackend::new());
    backend.fail_next(MockOp::CreateFramebuffer);
    let window = Arc::new(MockWindow::new(800, 600));
    let surface: Arc<dyn WindowSurface> = window.clone();

    let result = SwapChain::new(
        backend.clone(),
        surface,
        SwapChainDescriptor::default().with_fullscreen(true),
    );
    assert!(result.is_err());
    assert!(!*window.fullscreen.lock().unwrap());
    assert_nothing_alive(&backend);
}

#[test]
fn test_drop_after_present_waits_before_destroying() {
    let (backend, _window, mut swap_chain) = create(SwapChainDescriptor::default().with_samples(4));
    swap_chain.present().unwrap();
    backend.clear_calls();

    drop(swap_chain);

    let calls = backend.calls();
    assert!(matches!(calls.first(), Some(MockCall::WaitIdle)));
    assert_eq!(backend.count(|c| matches!(c, MockCall::WaitIdle)), 1);
}

#[test]
fn test_any_native_failure_aborts_construction() {
    for op in [
        MockOp::CreateSemaphore,
        MockOp::CreateSurface,
        MockOp::QueryCapabilities,
        MockOp::CreateRenderPass,
        MockOp::CreateSwapChain,
        MockOp::CreateImageView,
        MockOp::CreateAttachment,
        MockOp::CreateFramebuffer,
        MockOp::Acquire,
    ] {
        let backend = Arc::new(MockBackend::new());
        backend.fail_next(op);

        let result = try_create(&backend, SwapChainDescriptor::default().with_samples(4));
        assert!(
            matches!(result, Err(Error::BackendError { .. })),
            "{:?} did not abort construction",
            op
        );
        assert_nothing_alive(&backend);
    }
}

// ============================================================================
// PRESENT
// ============================================================================

#[test]
fn test_present_submits_presents_then_acquires() {
    let (backend, _window, mut swap_chain) = create(SwapChainDescriptor::default());
    let semaphores = semaphore_ids(&backend);
    let (image_available, render_finished) = (semaphores[0], semaphores[1]);
    let presented = swap_chain.current_image_index();
    backend.clear_calls();

    swap_chain.present().unwrap();

    let calls = backend.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls[0],
        MockCall::Submit { wait: image_available, signal: render_finished }
    );
    assert!(matches!(
        calls[1],
        MockCall::Present { index, wait, .. } if index == presented && wait == render_finished
    ));
    assert!(matches!(
        calls[2],
        MockCall::Acquire { signal, .. } if signal == image_available
    ));
}

#[test]
fn test_image_index_valid_after_every_present() {
    let (_backend, _window, mut swap_chain) =
        create(SwapChainDescriptor::default().with_swap_buffers(3));

    for _ in 0..10 {
        swap_chain.present().unwrap();
        assert!((swap_chain.current_image_index() as usize) < swap_chain.image_count());
        assert!(swap_chain.current_framebuffer().is_ok());
        assert_eq!(swap_chain.status(), SwapChainStatus::FrameAcquired);
    }
}

#[test]
fn test_present_failure_is_propagated() {
    let (backend, _window, mut swap_chain) = create(SwapChainDescriptor::default());
    backend.fail_next(MockOp::Submit);
    backend.clear_calls();

    let result = swap_chain.present();
    assert!(matches!(result, Err(Error::BackendError { .. })));
    assert_eq!(backend.count(|c| matches!(c, MockCall::Present { .. })), 0);
    assert!(swap_chain.current_framebuffer().is_err());
    assert!(matches!(swap_chain.present(), Err(Error::InvalidState(_))));
}

#[test]
fn test_out_of_date_present_then_resize_recovers() {
    let (backend, _window, mut swap_chain) = create(SwapChainDescriptor::default());
    backend.out_of_date_next(MockOp::Present);

    let err = swap_chain.present().unwrap_err();
    assert!(err.is_out_of_date());
    assert_eq!(swap_chain.status(), SwapChainStatus::SwapChainReady);

    // Same extent: still rebuilt because no image is held
    assert!(swap_chain.resize(Extent2D::new(800, 600)).unwrap());
    assert_eq!(swap_chain.status(), SwapChainStatus::FrameAcquired);
    swap_chain.present().unwrap();
}

#[test]
fn test_out_of_date_acquire_is_propagated() {
    let (backend, _window, mut swap_chain) = create(SwapChainDescriptor::default());
    backend.out_of_date_next(MockOp::Acquire);

    assert!(matches!(
        swap_chain.present(),
        Err(Error::SurfaceOutOfDate { .. })
    ));
    assert_eq!(backend.count(|c| matches!(c, MockCall::Present { .. })), 1);
}

// ============================================================================
// RESIZE
// ============================================================================

#[test]
fn test_resize_same_extent_is_noop() {
    let (backend, _window, mut swap_chain) = create(SwapChainDescriptor::default());
    backend.clear_calls();

    assert!(!swap_chain.resize(Extent2D::new(800, 600)).unwrap());
    assert!(backend.calls().is_empty());
}

#[test]
fn test_resize_twice_rebuilds_once() {
    let (backend, _window, mut swap_chain) = create(SwapChainDescriptor::default());
    backend.clear_calls();

    assert!(swap_chain.resize(Extent2D::new(1024, 768)).unwrap());
    assert!(!swap_chain.resize(Extent2D::new(1024, 768)).unwrap());

    assert_eq!(backend.count(|c| matches!(c, MockCall::CreateSwapChain { .. })), 1);
    assert_eq!(backend.count(|c| matches!(c, MockCall::WaitIdle)), 1);
    assert_eq!(swap_chain.extent(), Extent2D::new(1024, 768));
}

#[test]
fn test_resize_clamped_extent_is_compared() {
    let (backend, _window, mut swap_chain) = create(SwapChainDescriptor::default());

    assert!(swap_chain.resize(Extent2D::new(5000, 5000)).unwrap());
    assert_eq!(swap_chain.extent(), Extent2D::new(4096, 4096));
    backend.clear_calls();

    assert!(!swap_chain.resize(Extent2D::new(4096, 9000)).unwrap());
    assert!(backend.calls().is_empty());
}

#[test]
fn test_resize_waits_idle_before_teardown() {
    let (backend, _window, mut swap_chain) = create(SwapChainDescriptor::default());
    backend.clear_calls();

    swap_chain.resize(Extent2D::new(640, 480)).unwrap();

    let wait = backend.position(|c| matches!(c, MockCall::WaitIdle)).unwrap();
    assert_eq!(wait, 0);
    assert!(destroy_position(&backend, MockKind::Framebuffer) > wait);
    // Swap chain before the surface it was created from
    assert!(destroy_position(&backend, MockKind::SwapChain) < destroy_position(&backend, MockKind::Surface));
}

#[test]
fn test_resize_recreates_surface_and_semaphores() {
    let (backend, _window, mut swap_chain) = create(SwapChainDescriptor::default());
    backend.clear_calls();

    swap_chain.resize(Extent2D::new(640, 480)).unwrap();

    assert_eq!(backend.count(|c| matches!(c, MockCall::CreateSemaphore { .. })), 2);
    assert_eq!(backend.count(|c| matches!(c, MockCall::CreateSurface { .. })), 1);
    assert_eq!(backend.count(|c| matches!(c, MockCall::QueryCapabilities { .. })), 1);
    // Same format: render passes are kept
    assert_eq!(backend.count(|c| matches!(c, MockCall::CreateRenderPass { .. })), 0);

    assert_eq!(backend.live(MockKind::Semaphore), 2);
    assert_eq!(backend.live(MockKind::Surface), 1);
    assert_eq!(backend.live(MockKind::SwapChain), 1);
    assert_eq!(backend.live(MockKind::Framebuffer), 2);
    assert_eq!(backend.live(MockKind::Attachment), 1);

    let info = backend.swap_chain_infos()[0];
    assert_eq!(info.extent, Extent2D::new(640, 480));
    for attachment in backend.attachments() {
        assert_eq!(attachment.extent, Extent2D::new(640, 480));
    }
}

#[test]
fn test_resize_uses_same_build_path_as_construction() {
    let desc = SwapChainDescriptor::default().with_samples(4);
    let (backend, _window, mut swap_chain) = create(desc.clone());
    let fresh = backend.framebuffers();
    backend.clear_calls();

    swap_chain.resize(Extent2D::new(1280, 720)).unwrap();

    let resized = backend.framebuffers();
    assert_eq!(resized.len(), fresh.len());
    for (a, b) in fresh.iter().zip(resized.iter()) {
        let slots_a: Vec<_> = a.iter().map(|(slot, _)| *slot).collect();
        let slots_b: Vec<_> = b.iter().map(|(slot, _)| *slot).collect();
        assert_eq!(slots_a, slots_b);
    }
}

#[test]
fn test_resize_rebuilds_render_passes_on_format_change() {
    let (backend, _window, mut swap_chain) = create(SwapChainDescriptor::default());
    backend.set_capabilities(SurfaceCapabilities {
        formats: vec![SurfaceFormat::new(Format::R8G8B8A8_UNORM, ColorSpace::SrgbNonlinear)],
        ..default_capabilities()
    });
    backend.clear_calls();

    swap_chain.resize(Extent2D::new(640, 480)).unwrap();

    assert_eq!(swap_chain.color_format(), Format::R8G8B8A8_UNORM);
    assert_eq!(backend.count(|c| matches!(c, MockCall::CreateRenderPass { .. })), 2);
    assert_eq!(backend.live(MockKind::RenderPass), 2);
}

#[test]
fn test_failed_resize_leaves_swap_chain_unusable() {
    let (backend, _window, mut swap_chain) = create(SwapChainDescriptor::default());
    backend.fail_next(MockOp::CreateSwapChain);

    assert!(matches!(
        swap_chain.resize(Extent2D::new(640, 480)),
        Err(Error::BackendError { .. })
    ));
    assert_eq!(swap_chain.status(), SwapChainStatus::Uninitialized);
    assert_eq!(backend.live(MockKind::SwapChain), 0);
    assert_eq!(backend.live(MockKind::Framebuffer), 0);

    assert!(matches!(swap_chain.present(), Err(Error::InvalidState(_))));
    assert!(matches!(swap_chain.resize(Extent2D::new(320, 240)), Err(Error::InvalidState(_))));
    assert!(matches!(swap_chain.set_presentation_interval(0), Err(Error::InvalidState(_))));
    assert!(swap_chain.current_framebuffer().is_err());
}

// ============================================================================
// PRESENTATION INTERVAL
// ============================================================================

#[test]
fn test_same_interval_is_noop() {
    let (backend, _window, mut swap_chain) = create(SwapChainDescriptor::default());
    backend.clear_calls();

    assert!(!swap_chain.set_presentation_interval(1).unwrap());
    assert!(backend.calls().is_empty());
}

#[test]
fn test_interval_change_rebuilds_swap_chain_only() {
    let (backend, _window, mut swap_chain) = create(SwapChainDescriptor::default());
    backend.clear_calls();

    assert!(swap_chain.set_presentation_interval(0).unwrap());

    assert_eq!(swap_chain.present_mode(), PresentMode::Mailbox);
    assert_eq!(swap_chain.vsync_interval(), 0);
    assert_eq!(swap_chain.extent(), Extent2D::new(800, 600));
    assert_eq!(backend.swap_chain_infos()[0].present_mode, PresentMode::Mailbox);

    assert_eq!(backend.count(|c| matches!(c, MockCall::CreateSurface { .. })), 0);
    assert_eq!(backend.count(|c| matches!(c, MockCall::CreateAttachment { .. })), 0);
    assert_eq!(backend.count(|c| matches!(c, MockCall::CreateRenderPass { .. })), 0);
    assert_eq!(backend.count(|c| matches!(c, MockCall::CreateFramebuffer { .. })), 2);
    assert_eq!(swap_chain.status(), SwapChainStatus::FrameAcquired);
    assert_eq!(backend.live(MockKind::SwapChain), 1);
}

#[test]
fn test_interval_change_keeps_multisample_buffers_when_count_unchanged() {
    let (backend, _window, mut swap_chain) =
        create(SwapChainDescriptor::default().with_samples(4));
    backend.clear_calls();

    swap_chain.set_presentation_interval(0).unwrap();

    assert!(backend.attachments().is_empty());
    assert_eq!(backend.live(MockKind::Attachment), 1 + swap_chain.image_count());
}

#[test]
fn test_interval_change_rebuilds_multisample_buffers_when_count_changes() {
    let (backend, _window, mut swap_chain) =
        create(SwapChainDescriptor::default().with_samples(4));
    assert_eq!(swap_chain.image_count(), 2);
    backend.set_granted_image_count(Some(3));
    backend.clear_calls();

    swap_chain.set_presentation_interval(0).unwrap();

    assert_eq!(swap_chain.image_count(), 3);
    let attachments = backend.attachments();
    assert_eq!(attachments.len(), 3);
    assert!(attachments.iter().all(|a| a.kind == AttachmentKind::MultisampleColor));
    assert_eq!(backend.live(MockKind::Attachment), 1 + 3);
    for framebuffer in backend.framebuffers() {
        assert_eq!(framebuffer.len(), 3);
    }
}

#[test]
fn test_failed_interval_change_leaves_swap_chain_unusable() {
    let (backend, _window, mut swap_chain) = create(SwapChainDescriptor::default());
    backend.fail_next(MockOp::CreateFramebuffer);

    assert!(swap_chain.set_presentation_interval(0).is_err());
    assert_eq!(swap_chain.status(), SwapChainStatus::Uninitialized);
    assert!(matches!(swap_chain.present(), Err(Error::InvalidState(_))));
}

// ============================================================================
// TEARDOWN
// ============================================================================

#[test]
fn test_drop_releases_everything_in_order() {
    let (backend, _window, swap_chain) =
        create(SwapChainDescriptor::default().with_samples(4));
    backend.clear_calls();

    drop(swap_chain);

    assert_nothing_alive(&backend);
    let wait = backend.position(|c| matches!(c, MockCall::WaitIdle)).unwrap();
    let first_destroy = backend.position(|c| matches!(c, MockCall::Destroy { .. })).unwrap();
    assert!(wait < first_destroy);
    let framebuffer = destroy_position(&backend, MockKind::Framebuffer);
    let view = destroy_position(&backend, MockKind::ImageView);
    let native = destroy_position(&backend, MockKind::SwapChain);
    let attachment = destroy_position(&backend, MockKind::Attachment);
    let render_pass = destroy_position(&backend, MockKind::RenderPass);
    let surface = destroy_position(&backend, MockKind::Surface);
    assert!(framebuffer < view);
    assert!(view < native);
    assert!(framebuffer < attachment);
    assert!(attachment < render_pass);
    assert!(native < surface);
}

// ============================================================================
// RENDER CONTEXT
// ============================================================================

#[test]
fn test_render_context_trait_object() {
    let (_backend, _window, swap_chain) = create(SwapChainDescriptor::default().with_samples(2));
    let mut context: Box<dyn RenderContext> = Box::new(swap_chain);

    assert_eq!(context.resolution(), Extent2D::new(800, 600));
    assert_eq!(context.samples(), 2);
    assert_eq!(context.color_format(), Format::B8G8R8A8_UNORM);
    assert_eq!(context.depth_stencil_format(), Format::D24_UNORM_S8_UINT);

    context.present().unwrap();
    assert!(context.set_vsync_interval(0).unwrap());
    assert_eq!(context.vsync_interval(), 0);
    assert!(context.resize_buffers(Extent2D::new(320, 200)).unwrap());
    assert_eq!(context.resolution(), Extent2D::new(320, 200));
}
