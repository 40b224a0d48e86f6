//! Procedural audio via Glicol, used when no input file is given.

use glicol::Engine;
use log::info;

use crate::error::{FieldError, FieldResult};
use crate::params::audio_constants::BLOCK_SIZE;

/// Default composition: a saw lead over a four-on-the-floor kick
pub const GLICOL_COMPOSITION: &str = r#"
~gate: speed 2.0 >> seq 60 _60 _~a 48
~a: choose 48 48 48 72 0 0 0
~amp: ~gate >> envperc 0.001 0.1
~pit: ~gate >> mul 261.63
~lead: saw ~pit >> mul ~amp >> lpf ~mod 5.0 >> mul 0.1
~mod: sin 0.2 >> mul 1300 >> add 1500
~kgate: speed 2.0 >> seq 60 60 60 60
~kenv: ~kgate >> envperc 0.002 0.25
~kick: sin 55 >> mul ~kenv >> mul 0.6
o: ~lead >> add ~kick >> plate 0.1
"#;

/// Render `duration_s` seconds of `code` to a mono buffer (left channel)
pub fn render_composition(code: &str, duration_s: f32, sample_rate_hz: usize) -> FieldResult<Vec<f32>> {
    if !(duration_s >= 0.0) || sample_rate_hz == 0 {
        return Err(FieldError::configuration(format!(
            "cannot render {duration_s}s at {sample_rate_hz} Hz"
        )));
    }

    let mut engine = Engine::<BLOCK_SIZE>::new();
    engine.set_sr(sample_rate_hz);
    engine.update_with_code(code);
    engine
        .update()
        .map_err(|e| FieldError::audio(format!("Glicol engine init failed: {:?}", e)))?;

    let total = (duration_s * sample_rate_hz as f32).round() as usize;
    let mut samples = Vec::with_capacity(total);
    while samples.len() < total {
        let (buffers, _) = engine.next_block(vec![]);
        let take = (total - samples.len()).min(BLOCK_SIZE);
        // Safety limiter: hard clip to ±0.5
        samples.extend((0..take).map(|i| buffers[0][i].clamp(-0.5, 0.5)));
    }

    info!(
        "Synthesized {:.2}s of audio @ {}Hz",
        duration_s, sample_rate_hz
    );
    Ok(samples)
}
