mod edge;
pub mod interp;
mod rotator;

pub use edge::{Edge, EdgeDetector};
pub use interp::{
    f_interp_to, lerp, map_range_clamped, r_interp_to, r_interp_to_constant, v_interp_to,
};
pub use rotator::{normalize_axis, Rotator};
