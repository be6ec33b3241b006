use std::path::PathBuf;

use framescript::{
    Adjustment, Canvas, CompileOptions, CompileStats, Instruction, MemorySink, Metadata,
    PngDirSink, Properties, RasterImageSource, Reference, Rgb, compile_video,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn temp_dir(name: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    let dir = std::env::temp_dir().join(format!(
        "framescript_{name}_{}_{nanos}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn metadata(width: u32, height: u32) -> Metadata {
    Metadata {
        frame_rate: 24,
        window_size: Canvas::new(width, height).unwrap(),
        save_location: std::env::temp_dir(),
        video_name: "out".into(),
    }
}

const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

/// A 4x4 block at the origin that hides at tick 2, reappears at tick 5 and
/// then slides 8 pixels right over 4 ticks starting at tick 6. Exercises
/// every flavor of timeline region: static, discrete events and an
/// interpolation window.
fn scenario() -> Vec<Instruction> {
    vec![
        Instruction::Reference(Reference::new(
            "BLOCK",
            Box::new(RasterImageSource::solid(4, 4, BLACK).unwrap()),
            Properties::new().with_layer(1).with_x(0).with_y(0),
        )),
        Instruction::Adjustment(Adjustment::hide("BLOCK", 2)),
        Instruction::Adjustment(Adjustment::show("BLOCK", 5)),
        Instruction::Adjustment(
            Adjustment::movement("BLOCK", 6, Properties::new().with_x(8), 4).unwrap(),
        ),
    ]
}

fn compile_to_memory(options: &CompileOptions) -> (CompileStats, MemorySink) {
    let mut sink = MemorySink::new();
    let stats = compile_video(scenario(), &metadata(16, 8), options, &mut sink).unwrap();
    (stats, sink)
}

#[test]
fn compile_streams_a_complete_contiguous_frame_sequence() {
    init_tracing();
    let (stats, sink) = compile_to_memory(&CompileOptions::default());

    assert_eq!(stats.frames_total, 10);
    assert_eq!(stats.frames_rendered, 7);
    assert_eq!(stats.frames_duplicated, 3);

    let indices: Vec<u64> = sink.frames().iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, (0..10).collect::<Vec<_>>());
}

#[test]
fn compiling_twice_yields_byte_identical_frames() {
    let options = CompileOptions::default();
    let (_, first) = compile_to_memory(&options);
    let (_, second) = compile_to_memory(&options);

    assert_eq!(first.frames().len(), second.frames().len());
    for ((ia, a), (ib, b)) in first.frames().iter().zip(second.frames()) {
        assert_eq!(ia, ib);
        assert_eq!(a.as_bytes(), b.as_bytes(), "frame {ia} differs");
    }
}

#[test]
fn parallel_render_matches_sequential() {
    let (_, sequential) = compile_to_memory(&CompileOptions::default());
    let (_, parallel) = compile_to_memory(&CompileOptions {
        parallel: true,
        threads: Some(2),
    });

    for ((_, a), (_, b)) in sequential.frames().iter().zip(parallel.frames()) {
        assert_eq!(a.as_bytes(), b.as_bytes());
    }
}

#[test]
fn static_gap_frames_duplicate_the_gap_start() {
    let (_, sink) = compile_to_memory(&CompileOptions::default());
    let frames = sink.frames();

    // Tick 1 sits inside the opening static region.
    assert_eq!(frames[1].1.as_bytes(), frames[0].1.as_bytes());
    // Ticks 3 and 4 repeat the hidden frame at tick 2.
    assert_eq!(frames[3].1.as_bytes(), frames[2].1.as_bytes());
    assert_eq!(frames[4].1.as_bytes(), frames[2].1.as_bytes());

    // Hidden frames are bare canvas.
    assert_eq!(frames[2].1.pixel(0, 0), Some(Rgb::WHITE));
    // The block is back for tick 5.
    assert_eq!(frames[5].1.pixel(0, 0), Some(BLACK));
}

#[test]
fn movement_interpolates_exact_pixel_offsets() {
    let (_, sink) = compile_to_memory(&CompileOptions::default());
    let frames = sink.frames();

    // Activation tick: no elapsed time, block still at the origin.
    assert_eq!(frames[6].1.pixel(0, 0), Some(BLACK));

    // 8 pixels over 4 ticks is exactly 2 per tick.
    assert_eq!(frames[7].1.pixel(1, 0), Some(Rgb::WHITE));
    assert_eq!(frames[7].1.pixel(2, 0), Some(BLACK));
    assert_eq!(frames[7].1.pixel(5, 0), Some(BLACK));
    assert_eq!(frames[7].1.pixel(6, 0), Some(Rgb::WHITE));

    // Final scheduled tick, elapsed 3 of 4.
    assert_eq!(frames[9].1.pixel(5, 0), Some(Rgb::WHITE));
    assert_eq!(frames[9].1.pixel(6, 0), Some(BLACK));
    assert_eq!(frames[9].1.pixel(9, 0), Some(BLACK));
}

#[test]
fn png_dir_sink_writes_one_numbered_file_per_frame() {
    init_tracing();
    let dir = temp_dir("png_sink");

    let mut sink = PngDirSink::new(&dir);
    let stats =
        compile_video(scenario(), &metadata(16, 8), &CompileOptions::default(), &mut sink)
            .unwrap();

    let mut names: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();

    assert_eq!(names.len() as u64, stats.frames_total);
    assert_eq!(names.first().map(String::as_str), Some("000000.png"));
    assert_eq!(names.last().map(String::as_str), Some("000009.png"));

    // Spot-check a decoded frame against the in-memory render.
    let decoded = image::open(dir.join("000005.png")).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (16, 8));
    assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 0]);
    assert_eq!(decoded.get_pixel(15, 7).0, [255, 255, 255]);

    std::fs::remove_dir_all(&dir).unwrap();
}
