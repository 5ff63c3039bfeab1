/*!
# Framechain

Backend-agnostic swap-chain and presentation layer.

This crate owns the presentation logic shared by every graphics backend:
surface format and present-mode selection, the primary/secondary render-pass
pair, the resolution-dependent resource set and the acquire/present cycle.
Backend implementations (Vulkan, ...) only provide native objects through the
`PresentationBackend` trait.

## Architecture

- **SwapChain**: swap-chain manager state machine, generic over the backend
- **RenderContext**: object-safe view of a swap chain for render targets
- **PresentationBackend**: native boundary (device, queues, surfaces, memory)
- **WindowSurface**: windowing collaborator providing raw platform handles
- **selection**: pure format / mode / extent / buffer-count policies
*/

mod error;
pub mod config;
pub mod log;
pub mod presentation;

pub use error::{Error, Result};
pub use config::{BackendConfig, DebugSeverity, SwapChainDescriptor};
pub use presentation::{
    Extent2D, Format, PresentMode, PresentationBackend, RenderContext, SwapChain,
    SwapChainStatus, WindowSurface,
};
