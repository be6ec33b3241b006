use std::{
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use anyhow::Context as _;

use crate::{
    error::{FramescriptError, FramescriptResult},
    frame::FrameBuffer,
    metadata::Metadata,
};

/// Configuration handed to a [`FrameSink`] before the first frame.
#[derive(Clone, Debug)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
}

impl SinkConfig {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            width: metadata.window_size.width,
            height: metadata.window_size.height,
            frame_rate: metadata.frame_rate,
        }
    }
}

/// Consumer of the gap-filled raster sequence.
///
/// `push_frame` is called exactly once per frame index, in strictly
/// increasing order starting from 0; the encoder relies on that contiguity.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> FramescriptResult<()>;
    /// Push one frame in strictly increasing index order.
    fn push_frame(&mut self, index: u64, frame: &FrameBuffer) -> FramescriptResult<()>;
    /// Called once after the last frame.
    fn end(&mut self) -> FramescriptResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct MemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(u64, FrameBuffer)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[(u64, FrameBuffer)] {
        &self.frames
    }

    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }
}

impl FrameSink for MemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> FramescriptResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, index: u64, frame: &FrameBuffer) -> FramescriptResult<()> {
        self.frames.push((index, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> FramescriptResult<()> {
        Ok(())
    }
}

/// Writes each frame as `NNNNNN.png` into a directory.
#[derive(Debug)]
pub struct PngDirSink {
    dir: PathBuf,
}

impl PngDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FrameSink for PngDirSink {
    fn begin(&mut self, _cfg: SinkConfig) -> FramescriptResult<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create frame directory '{}'", self.dir.display()))?;
        Ok(())
    }

    fn push_frame(&mut self, index: u64, frame: &FrameBuffer) -> FramescriptResult<()> {
        frame.save_png(&self.dir.join(format!("{index:06}.png")))
    }

    fn end(&mut self) -> FramescriptResult<()> {
        Ok(())
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn ensure_parent_dir(path: &Path) -> FramescriptResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// MP4 sink backed by the system `ffmpeg` binary.
///
/// Frames stream as rawvideo rgb24 over the child's stdin; using the system
/// binary avoids native FFmpeg dev header/lib requirements.
pub struct FfmpegSink {
    out_path: PathBuf,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    cfg: Option<SinkConfig>,
}

impl FfmpegSink {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            child: None,
            stdin: None,
            cfg: None,
        }
    }
}

impl FrameSink for FfmpegSink {
    #[tracing::instrument(skip(self, cfg))]
    fn begin(&mut self, cfg: SinkConfig) -> FramescriptResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(FramescriptError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if cfg.frame_rate == 0 {
            return Err(FramescriptError::validation("encode fps must be non-zero"));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            // Default settings target yuv420p output for maximum
            // compatibility, which requires even dimensions.
            return Err(FramescriptError::validation(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        ensure_parent_dir(&self.out_path)?;

        if !is_ffmpeg_on_path() {
            return Err(FramescriptError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg("-y");
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.frame_rate.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&self.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            FramescriptError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        self.stdin = Some(
            child
                .stdin
                .take()
                .ok_or_else(|| FramescriptError::encode("failed to open ffmpeg stdin"))?,
        );
        self.child = Some(child);
        self.cfg = Some(cfg);
        tracing::debug!(out = %self.out_path.display(), "ffmpeg encoder spawned");
        Ok(())
    }

    fn push_frame(&mut self, _index: u64, frame: &FrameBuffer) -> FramescriptResult<()> {
        let Some(cfg) = self.cfg.as_ref() else {
            return Err(FramescriptError::encode("ffmpeg sink was not started"));
        };
        if frame.width() != cfg.width || frame.height() != cfg.height {
            return Err(FramescriptError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                cfg.width,
                cfg.height
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(FramescriptError::encode("ffmpeg encoder is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(frame.as_bytes()).map_err(|e| {
            FramescriptError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> FramescriptResult<()> {
        drop(self.stdin.take());
        let Some(child) = self.child.take() else {
            return Ok(());
        };

        let output = child.wait_with_output().map_err(|e| {
            FramescriptError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FramescriptError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        tracing::info!(out = %self.out_path.display(), "ffmpeg encode finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Canvas;

    fn cfg() -> SinkConfig {
        SinkConfig {
            width: 2,
            height: 2,
            frame_rate: 30,
        }
    }

    #[test]
    fn memory_sink_records_frames_in_order() {
        let mut sink = MemorySink::new();
        sink.begin(cfg()).unwrap();
        let frame = FrameBuffer::new(Canvas::new(2, 2).unwrap());
        sink.push_frame(0, &frame).unwrap();
        sink.push_frame(1, &frame).unwrap();
        sink.end().unwrap();

        assert_eq!(sink.frames().len(), 2);
        assert_eq!(sink.frames()[0].0, 0);
        assert_eq!(sink.frames()[1].0, 1);
    }

    #[test]
    fn ffmpeg_sink_rejects_odd_dimensions() {
        let mut sink = FfmpegSink::new("/tmp/out.mp4");
        let err = sink
            .begin(SinkConfig {
                width: 3,
                height: 2,
                frame_rate: 30,
            })
            .unwrap_err();
        assert!(matches!(err, FramescriptError::Validation(_)));
    }

    #[test]
    fn ffmpeg_sink_rejects_push_before_begin() {
        let mut sink = FfmpegSink::new("/tmp/out.mp4");
        let frame = FrameBuffer::new(Canvas::new(2, 2).unwrap());
        assert!(sink.push_frame(0, &frame).is_err());
    }
}
