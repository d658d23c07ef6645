//! Domain splitting: slicers cut one interval into covering pieces,
//! selectors choose which variable to cut.

mod selector;
mod slicer;

pub use selector::{
    AsrSelector, HybridSsrLfSelector, LargestFirstSelector, RoundRobinSelector,
    SmallestFirstSelector, SmallestLargestSelector, SsrSelector, VarSelector,
};
pub use slicer::{Bisecter, IntervalSlicer, Partitioner, Peeler};
