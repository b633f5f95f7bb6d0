pub mod falloff_cache;

pub use falloff_cache::FalloffCache;
