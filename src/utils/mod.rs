//! Utility helpers: generational handles, spatial algebra, math extensions,
//! numeric-or-symbolic parameters and logging.

pub mod allocator;
pub mod logging;
pub mod math;
pub mod numeric;
pub mod profiling;
pub mod spatial;

pub use spatial::{SpatialInertia, SpatialVec};

pub use allocator::{Arena, EntityId, GenerationalId};
pub use math::*;
pub use numeric::FloatingNumber;
pub use profiling::WorldProfile;
