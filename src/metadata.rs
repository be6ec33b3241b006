use std::path::PathBuf;

use crate::{
    core::Canvas,
    error::{FramescriptError, FramescriptResult},
};

/// Host-facing description of the output video.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Metadata {
    /// Frames per second of the assembled video.
    pub frame_rate: u32,
    /// Output raster dimensions.
    pub window_size: Canvas,
    /// Directory the video (and any intermediate frames) are written into.
    pub save_location: PathBuf,
    /// File stem of the assembled video.
    pub video_name: String,
}

impl Metadata {
    pub fn validate(&self) -> FramescriptResult<()> {
        if self.frame_rate == 0 {
            return Err(FramescriptError::validation("frame_rate must be > 0"));
        }
        if self.window_size.width == 0 || self.window_size.height == 0 {
            return Err(FramescriptError::validation(
                "window_size width/height must be > 0",
            ));
        }
        if self.video_name.is_empty() {
            return Err(FramescriptError::validation("video_name must be non-empty"));
        }
        Ok(())
    }

    pub fn output_path(&self) -> PathBuf {
        self.save_location.join(format!("{}.mp4", self.video_name))
    }
}
