pub(crate) mod dispatch;
pub(crate) mod three_d;

pub use dispatch::RenderDispatcher;
pub use three_d::{RasterDefaults, ThreeDPipeline};
