pub mod manager;
pub mod types;

pub use manager::ModelManager;
pub use types::{CommandOutcome, ModelDescriptor};
