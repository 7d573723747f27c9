pub mod chunk;
pub mod encoding;
pub mod error;
pub mod ffmpeg;
pub mod frame_guard;
pub mod frame_store;
pub mod metadata;
pub mod naming;
pub mod navigation;
pub mod segmentation;
pub mod types;
