// Library interface for the stillcut binary and tests

pub mod audio;
pub mod bits;
pub mod collector;
pub mod config;
pub mod constants;
pub mod ebml;
pub mod error;
pub mod riff;
pub mod schema;
pub mod webm;
pub mod webp;

pub use collector::{from_image_array, FrameCollector, FrameInput, WebpSurface};
pub use error::{Error, Result};
pub use webm::{build, Document, Frame};
