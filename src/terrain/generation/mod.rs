pub mod heightmap;
pub mod curve;
pub mod noise;
pub mod falloff;
pub mod height;

pub use heightmap::HeightMap;
pub use curve::{CurveKey, HeightCurve};
pub use self::noise::{generate_noise_map, MIN_NOISE_SCALE};
pub use falloff::{generate_falloff_map, FalloffShape};
pub use height::{apply_falloff, bordered_size, generate_height_map};
