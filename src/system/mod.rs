pub mod cache;
pub mod capability;
pub mod collector;
pub mod platform;
pub mod probe;
pub mod process;
pub mod registry;
pub mod snapshot;
pub mod sort;
