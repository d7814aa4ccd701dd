//! Viewpoint snapshots: capture, instantaneous restore, animated restore.

pub mod fly;
pub mod snapshot;

pub use fly::FlyAnimation;
pub use snapshot::{capture, Lens, ModelTransform, SectionState, ViewpointSnapshot};
