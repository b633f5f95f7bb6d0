pub mod levels;

pub use levels::{LodLevel, MAX_LOD};
