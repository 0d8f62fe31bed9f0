//! Media capture for failed attempts.

mod gif_recorder;

pub use gif_recorder::{GifConfig, GifFrame, GifRecorder};
