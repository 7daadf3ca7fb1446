/// Sound engine: procedural 8-bit style cues via rodio.
///
/// All cues are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink; a
/// failed playback is dropped with a debug log and never reaches the game.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine plays nothing).

use crate::sim::event::Cue;
use crate::sim::sink::AudioSink;

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use crate::sim::event::Cue;

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: HashMap<Cue, Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output, sound disabled: {e}");
                    return None;
                }
            };

            let buffers = [
                (Cue::Coin, gen_coin()),
                (Cue::Bump, gen_bump()),
                (Cue::Stomp, gen_stomp()),
                (Cue::Flag, gen_flag()),
                (Cue::Die, gen_die()),
                (Cue::Jump, gen_jump()),
            ]
            .into_iter()
            .map(|(cue, samples)| (cue, Arc::new(super::make_wav(&samples, SAMPLE_RATE))))
            .collect();

            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, cue: Cue) {
            let Some(buf) = self.buffers.get(&cue) else { return };
            let sink = match Sink::try_new(&self.handle) {
                Ok(s) => s,
                Err(e) => {
                    log::debug!("cue {cue:?} dropped: {e}");
                    return;
                }
            };
            match rodio::Decoder::new(Cursor::new(buf.as_ref().clone())) {
                Ok(src) => {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
                Err(e) => log::debug!("cue {cue:?} undecodable: {e}"),
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono f32 samples
    // ════════════════════════════════════════════════════════════

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Square-ish tone (sine + 3rd harmonic) with a fading envelope.
    fn tone(samples: &mut Vec<f32>, freq: f32, duration: f32, volume: f32) {
        let n = samples_for(duration);
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let env = 1.0 - (i as f32 / n as f32).powf(0.5);
            let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 3.0 * TAU).sin() * 0.3;
            samples.push(wave * env * volume);
        }
    }

    /// Linear pitch sweep.
    fn sweep(from: f32, to: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = samples_for(duration);
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = from + (to - from) * t;
                phase += freq / SAMPLE_RATE as f32;
                (phase * TAU).sin() * (1.0 - t).powf(0.6) * volume
            })
            .collect()
    }

    /// Coin: two quick high notes B5→E6
    fn gen_coin() -> Vec<f32> {
        let mut s = Vec::new();
        tone(&mut s, 988.0, 0.05, 0.25);
        tone(&mut s, 1319.0, 0.12, 0.25);
        s
    }

    /// Bump: low thud with a little noise
    fn gen_bump() -> Vec<f32> {
        let n = samples_for(0.08);
        let mut rng: u32 = 2024;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let body = (ti * 110.0 * TAU).sin();
                (body * 0.7 + noise * 0.3) * (1.0 - t) * 0.35
            })
            .collect()
    }

    /// Stomp: short downward squash
    fn gen_stomp() -> Vec<f32> {
        sweep(700.0, 150.0, 0.09, 0.3)
    }

    /// Jump: quick upward chirp
    fn gen_jump() -> Vec<f32> {
        sweep(300.0, 900.0, 0.12, 0.2)
    }

    /// Death: sad descending tone
    fn gen_die() -> Vec<f32> {
        let mut s = Vec::new();
        for freq in [440.0_f32, 370.0, 311.0, 261.0] { // A4→F#4→Eb4→C4
            tone(&mut s, freq, 0.12, 0.3);
        }
        s
    }

    /// Flag: ascending fanfare with a held top note
    fn gen_flag() -> Vec<f32> {
        let mut s = Vec::new();
        for freq in [523.0_f32, 659.0, 784.0] { // C5→E5→G5
            tone(&mut s, freq, 0.1, 0.3);
        }
        tone(&mut s, 1047.0, 0.35, 0.3);
        s
    }
}

// ════════════════════════════════════════════════════════════
//  WAV encoder
// ════════════════════════════════════════════════════════════

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn make_wav(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let num_channels: u16 = 1;
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * (num_channels as u32) * (bits_per_sample as u32) / 8;
    let block_align = num_channels * bits_per_sample / 8;
    let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
    buf.extend_from_slice(&num_channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());

    for &s in samples {
        let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
        buf.extend_from_slice(&val.to_le_bytes());
    }

    buf
}

// ════════════════════════════════════════════════════════════
//  Public API (no-ops without the "sound" feature)
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _cue: Cue) {}
}

/// Audio output for the session. Without a device every cue is dropped.
pub struct Speaker {
    engine: Option<SoundEngine>,
}

impl Speaker {
    pub fn new() -> Self {
        Speaker { engine: SoundEngine::new() }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn silent() -> Self {
        Speaker { engine: None }
    }
}

impl AudioSink for Speaker {
    fn play(&mut self, cue: Cue) {
        if let Some(engine) = &self.engine {
            engine.play(cue);
        }
    }
}
