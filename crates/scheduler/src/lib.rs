mod frame;
mod pacer;
mod signal;

pub use frame::FrameScheduler;
pub use pacer::WakePacer;
pub use signal::{render_channel, RenderRequests, RenderSignal, RenderWake};
