//! Membrane - offline audio-reactive surface renderer
//!
//! Analyses an audio clip frame by frame, drives the field engine with its
//! spectrum, kicks, scheduled notes, and dominant band, and writes heightmap
//! frames to disk.

use clap::Parser;
use log::{error, info};

use membrane::audio::{
    load_or_synthesize, BandClassifier, FftAnalyzer, KickDetector, NoteSchedule,
};
use membrane::cli::Args;
use membrane::rendering::HeightmapRecorder;
use membrane::{FieldEngine, FieldResult, FrameDriver};

/// Seconds of audio synthesized when neither an input file nor a duration is given
const DEFAULT_DURATION_S: f32 = 8.0;

fn run(args: &Args) -> FieldResult<()> {
    let clip = load_or_synthesize(
        args.input.as_deref(),
        args.duration.unwrap_or(DEFAULT_DURATION_S),
        args.sample_rate,
    )?;
    let duration = args
        .duration
        .map_or(clip.duration_s(), |d| d.min(clip.duration_s()));

    let analysis = args.analysis_config(clip.sample_rate_hz());
    let engine = FieldEngine::new(args.engine_config())?;
    let analyzer = FftAnalyzer::new(analysis.clone())?;
    let classifier = BandClassifier::new(analysis.clone())?;
    let mut kicks = KickDetector::new(&analysis)?;
    let notes = NoteSchedule::new(args.notes.iter().copied());

    let recording = args.recording_config(duration);
    let recorder = HeightmapRecorder::new(recording.clone())?;
    let mut driver = FrameDriver::new(engine, analyzer, classifier, recorder);

    let dt = recording.frame_dt();
    let total_frames = recording.total_frames();
    info!("Rendering {} frames ({:.2}s @ {} fps)", total_frames, duration, recording.fps);

    for frame in 0..total_frames {
        let t = frame as f32 * dt;
        for &note in notes.due(t - dt, t) {
            driver.engine_mut().trigger_at(note, None);
        }
        let trigger = kicks.detect(clip.segment(t - dt, t), t);
        let window = clip.window_ending_at(t, analysis.fft_size);
        driver.update_frame(dt, &window, trigger, t);

        if frame % recording.fps.max(1) as usize == 0 {
            let engine = driver.engine();
            info!(
                "t={:.1}s: {} active pulses, class {:?}, color {:?}",
                t,
                engine.pulses().active_events().len(),
                engine.color_state().last_feature_class(),
                engine.color().to_array()
            );
        }
    }

    let written = driver.into_renderer().finish()?;
    info!(
        "{} kicks, {} notes, {} frames written",
        kicks.kick_count(),
        notes.len(),
        written
    );
    Ok(())
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{e}");
        std::process::exit(1);
    }
}
