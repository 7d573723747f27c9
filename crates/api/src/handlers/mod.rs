pub mod experiments;
pub mod frames;
pub mod navigation;
pub mod tracking;
