mod types;
mod queue;
mod dispatcher;
mod manager;

pub use types::MapData;
pub use queue::{Callback, ResultQueue};
pub use dispatcher::GenerationDispatcher;
pub use manager::TerrainManager;
