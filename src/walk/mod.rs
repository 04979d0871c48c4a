mod parallel;
mod types;
mod walker;
mod walker_builder;

pub use types::DirectorySet;
pub use walker::{Walker, list_directories};
pub use walker_builder::WalkerBuilder;
