use rayon::prelude::*;

use crate::{
    core::Canvas,
    encode::{FrameSink, SinkConfig},
    error::{FramescriptError, FramescriptResult},
    frame::{FrameBuffer, render_frame},
    metadata::Metadata,
    motion_tree::{MotionTree, parse},
    schedule::{FrameSchedule, schedule},
    separate::{Instruction, SeparatedInstructions, separate_instructions},
};

/// Threading controls for multi-frame rendering.
#[derive(Clone, Debug, Default)]
pub struct CompileOptions {
    /// Render frame jobs on a rayon pool when `true`.
    pub parallel: bool,
    /// Optional explicit worker thread count; `None` uses rayon defaults.
    pub threads: Option<usize>,
}

/// Aggregated compile counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompileStats {
    /// Total frames in the output video.
    pub frames_total: u64,
    /// Frames produced by an actual render job.
    pub frames_rendered: u64,
    /// Frames duplicated from their predecessor (static regions).
    pub frames_duplicated: u64,
}

/// Compile a flat instruction list into a gap-filled frame sequence streamed
/// into `sink`.
///
/// Stage order: separate, compile the motion tree, expand the frame
/// schedule, open every image source, render the scheduled jobs (optionally
/// in parallel; jobs only read the canonical instructions), then stream
/// frames in contiguous index order, duplicating across static gaps. Any
/// frame failure aborts the compile; no partial sequence is valid.
#[tracing::instrument(skip(instructions, metadata, options, sink))]
pub fn compile_video(
    instructions: impl IntoIterator<Item = Instruction>,
    metadata: &Metadata,
    options: &CompileOptions,
    sink: &mut dyn FrameSink,
) -> FramescriptResult<CompileStats> {
    metadata.validate()?;

    let mut separated = separate_instructions(instructions)?;
    let tree = parse(&separated);
    let plan = schedule(&tree);
    tracing::info!(
        nodes = tree.body.len(),
        jobs = plan.jobs.len(),
        frames = plan.frame_count,
        "compiled motion tree"
    );

    open_sources(&mut separated)?;

    let rendered = render_schedule(&plan, &separated, metadata.window_size, options)?;
    stream_frames(&plan, rendered, metadata, sink)
}

/// Convenience wrapper: compile straight to `<save_location>/<video_name>.mp4`
/// through the ffmpeg sink.
pub fn compile_video_to_mp4(
    instructions: impl IntoIterator<Item = Instruction>,
    metadata: &Metadata,
    options: &CompileOptions,
) -> FramescriptResult<CompileStats> {
    let mut sink = crate::encode::FfmpegSink::new(metadata.output_path());
    compile_video(instructions, metadata, options, &mut sink)
}

/// Compile only the timeline IR for an instruction list, without rendering.
pub fn compile_motion_tree(
    instructions: impl IntoIterator<Item = Instruction>,
) -> FramescriptResult<MotionTree> {
    let separated = separate_instructions(instructions)?;
    Ok(parse(&separated))
}

fn open_sources(separated: &mut SeparatedInstructions) -> FramescriptResult<()> {
    for reference in separated.references.values_mut() {
        reference.source.open()?;
    }
    Ok(())
}

/// Render every scheduled job. Jobs are independent: each reconstructs its
/// frame state from scratch against the shared, read-only instructions.
fn render_schedule(
    plan: &FrameSchedule,
    separated: &SeparatedInstructions,
    canvas: Canvas,
    options: &CompileOptions,
) -> FramescriptResult<Vec<(u64, FrameBuffer)>> {
    if !options.parallel {
        let mut rendered = Vec::with_capacity(plan.jobs.len());
        for &index in &plan.jobs {
            rendered.push((index, render_frame(index, separated, canvas)?));
        }
        return Ok(rendered);
    }

    let pool = build_thread_pool(options.threads)?;
    pool.install(|| {
        plan.jobs
            .par_iter()
            .map(|&index| Ok((index, render_frame(index, separated, canvas)?)))
            .collect::<FramescriptResult<Vec<_>>>()
    })
}

/// Walk `[0, frame_count)` in order, pushing rendered frames and duplicating
/// the most recent one across unrendered indices. Duplication is
/// bit-identical to recomputation because static regions are static by
/// construction of the motion tree.
fn stream_frames(
    plan: &FrameSchedule,
    rendered: Vec<(u64, FrameBuffer)>,
    metadata: &Metadata,
    sink: &mut dyn FrameSink,
) -> FramescriptResult<CompileStats> {
    let mut stats = CompileStats {
        frames_total: plan.frame_count,
        ..CompileStats::default()
    };

    sink.begin(SinkConfig::from_metadata(metadata))?;

    let mut pending = rendered.into_iter().peekable();
    let mut last: Option<FrameBuffer> = None;
    for index in 0..plan.frame_count {
        // Scheduled jobs are strictly increasing, so at most one is consumed
        // per index.
        if pending.peek().is_some_and(|(i, _)| *i == index)
            && let Some((_, frame)) = pending.next()
        {
            last = Some(frame);
            stats.frames_rendered += 1;
        } else {
            stats.frames_duplicated += 1;
        }

        let frame = last.as_ref().ok_or_else(|| {
            FramescriptError::validation(format!("no rendered frame at or before index {index}"))
        })?;
        sink.push_frame(index, frame)?;
    }

    sink.end()?;
    tracing::info!(
        total = stats.frames_total,
        rendered = stats.frames_rendered,
        duplicated = stats.frames_duplicated,
        "frame stream complete"
    );
    Ok(stats)
}

fn build_thread_pool(threads: Option<usize>) -> FramescriptResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| FramescriptError::validation(format!("failed to build rayon thread pool: {e}")))
}
