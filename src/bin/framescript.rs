use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use framescript::{CompileOptions, Script};

#[derive(Parser, Debug)]
#[command(name = "framescript", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a script into an MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Compile a script into a directory of PNG frames.
    Frames(FramesArgs),
    /// Print a script's compiled motion tree.
    Tree(TreeArgs),
    /// Lint a script for overlapping or out-of-bounds drawings.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Render frame jobs in parallel.
    #[arg(long)]
    parallel: bool,

    /// Worker thread count (implies --parallel).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct FramesArgs {
    /// Input script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory for `NNNNNN.png` frames.
    #[arg(long)]
    out: PathBuf,

    /// Render frame jobs in parallel.
    #[arg(long)]
    parallel: bool,
}

#[derive(Parser, Debug)]
struct TreeArgs {
    /// Input script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Spaces per indent level (0 prints a single line).
    #[arg(long, default_value_t = 4)]
    indent: usize,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Input script JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frames(args) => cmd_frames(args),
        Command::Tree(args) => cmd_tree(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let script = Script::load(&args.in_path)?;
    let metadata = script.metadata.clone();
    let instructions = script.into_instructions()?;

    let options = CompileOptions {
        parallel: args.parallel || args.threads.is_some(),
        threads: args.threads,
    };
    let stats = framescript::compile_video_to_mp4(instructions, &metadata, &options)
        .context("video compile failed")?;

    println!(
        "wrote {} ({} frames: {} rendered, {} duplicated)",
        metadata.output_path().display(),
        stats.frames_total,
        stats.frames_rendered,
        stats.frames_duplicated
    );
    Ok(())
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    let script = Script::load(&args.in_path)?;
    let metadata = script.metadata.clone();
    let instructions = script.into_instructions()?;

    let options = CompileOptions {
        parallel: args.parallel,
        threads: None,
    };
    let mut sink = framescript::PngDirSink::new(&args.out);
    let stats = framescript::compile_video(instructions, &metadata, &options, &mut sink)
        .context("frame compile failed")?;

    println!(
        "wrote {} frames into {}",
        stats.frames_total,
        args.out.display()
    );
    Ok(())
}

fn cmd_tree(args: TreeArgs) -> anyhow::Result<()> {
    let script = Script::load(&args.in_path)?;
    let instructions = script.into_instructions()?;
    let tree = framescript::compile_motion_tree(instructions)?;
    println!("{}", framescript::dump(&tree, args.indent));
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let script = Script::load(&args.in_path)?;
    let metadata = script.metadata.clone();
    let instructions = script.into_instructions()?;

    let qualms = framescript::check_qualms(instructions, &metadata)?;
    if qualms.is_empty() {
        println!("no qualms found");
        return Ok(());
    }
    for qualm in &qualms {
        println!("{qualm}");
    }
    anyhow::bail!("{} qualm(s) found", qualms.len())
}
