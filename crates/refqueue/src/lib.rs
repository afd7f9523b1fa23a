//! Deferred drawing operations for surfaces the caller cannot touch directly.
//!
//! Application code records an [`OperationQueue`] during an update, freezes it
//! and hands it to whoever owns the surface. Draining resolves placeholders
//! against the surface's [`ReferenceTable`] right before each primitive runs:
//!
//! ```text
//!   update ──▶ OperationQueue ──freeze──▶ FrozenQueue
//!                                             │ drain
//!                                             ▼
//!   ReferenceTable ◀──capture── resolve_params ──▶ Surface::invoke
//!          ▲                                            │
//!          └────────────── addRef / dropRef ◀───────────┘
//! ```
//!
//! Values a surface hands back (gradients and the like) never leave the
//! process; they live in the table as [`Handle`]s and are referenced by id
//! from later operations with `#ref:<id>` or `#spreadRef:<id>`.

mod canvas;
mod error;
mod host;
mod queue;
mod refs;
mod resolve;
mod surface;
mod value;

pub use canvas::{
    CanvasState, CanvasSurface, ColorStop, Gradient, PathSegment, Style, SurfaceCall,
};
pub use error::{ErrorKind, OpError};
pub use host::{HostError, SurfaceHost, SurfaceId};
pub use queue::{
    DrainPolicy, DrainReport, FrozenQueue, OpResult, Operation, OperationQueue, ADD_REF, DROP_REF,
};
pub use refs::ReferenceTable;
pub use resolve::{resolve_params, REF_PREFIX, SPREAD_PREFIX};
pub use surface::{Surface, SurfaceError};
pub use value::{Handle, RefValue};
