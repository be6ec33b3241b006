//! Framescript compiles a declarative, sparse set of timed visual
//! instructions (image placements plus show/hide/move adjustments) into a
//! deterministic sequence of rendered raster frames for video assembly.
//!
//! The pipeline is:
//!
//! - [`separate_instructions`]: split the flat instruction list into
//!   per-entity reference and adjustment maps
//! - [`parse`]: compile the adjustment stream into the motion-tree IR,
//!   distinguishing static gaps from actively-interpolating ones
//! - [`schedule`]: expand the IR into concrete frame-render jobs
//! - [`frame::render_frame`]: reconstruct per-frame state and composite it
//! - [`compile_video`]: orchestrate the stages and stream the gap-filled
//!   frame sequence into a [`FrameSink`]
#![forbid(unsafe_code)]

pub mod adjustment;
pub mod core;
pub mod encode;
pub mod error;
pub mod frame;
pub mod metadata;
pub mod motion_tree;
pub mod pipeline;
pub mod properties;
pub mod qualms;
pub mod reference;
pub mod schedule;
pub mod script;
pub mod separate;

pub use adjustment::{Adjustment, AdjustmentKind};
pub use core::{Canvas, Rgb};
pub use encode::{FfmpegSink, FrameSink, MemorySink, PngDirSink, SinkConfig, is_ffmpeg_on_path};
pub use error::{FramescriptError, FramescriptResult};
pub use frame::{FrameBuffer, ResolvedEntity, render_frame, resolve_frame};
pub use metadata::Metadata;
pub use motion_tree::{MotionNode, MotionTree, dump, parse};
pub use pipeline::{
    CompileOptions, CompileStats, compile_motion_tree, compile_video, compile_video_to_mp4,
};
pub use properties::{MergeMode, Properties, Visibility};
pub use qualms::{Qualm, QualmKind, check_qualms};
pub use reference::{FileImageSource, ImageSource, RasterImageSource, Reference};
pub use schedule::{FrameSchedule, schedule};
pub use script::{AdjustmentDecl, ImageDecl, Script};
pub use separate::{Instruction, SeparatedInstructions, separate_instructions};
