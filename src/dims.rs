mod align;
mod range;
mod state;


pub use align::{align_from_trailing, align_order_from_trailing, union_ranges_from_trailing};
pub use range::{AxisIndex, AxisRange};
pub use state::{Dims, DimsEvents, DimsSnapshot};
