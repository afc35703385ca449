/// Sound engine: procedural 8-bit style effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time and
/// played fire-and-forget. The engine listens on the event bus, so the
/// game core never calls it directly.
///
/// Without the "sound" feature the stub SoundEngine does nothing.

use std::rc::Rc;

use crate::sim::bus::{EventBus, SubscriptionId};
use crate::sim::event::EventKind;

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;
    const TAU: f32 = std::f32::consts::TAU;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_whack: Arc<Vec<u8>>,
        sfx_miss: Arc<Vec<u8>>,
        sfx_bonus: Arc<Vec<u8>>,
        sfx_empty: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output: {e}");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_whack: Arc::new(make_wav(&gen_whack())),
                sfx_miss: Arc::new(make_wav(&gen_miss())),
                sfx_bonus: Arc::new(make_wav(&gen_bonus())),
                sfx_empty: Arc::new(make_wav(&gen_empty())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        pub fn play_whack(&self) { self.play(&self.sfx_whack); }
        pub fn play_miss(&self) { self.play(&self.sfx_miss); }
        pub fn play_bonus(&self) { self.play(&self.sfx_bonus); }
        pub fn play_empty(&self) { self.play(&self.sfx_empty); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono f32 samples
    // ════════════════════════════════════════════════════════════

    /// Sequence of (frequency, seconds) notes with a 2nd harmonic.
    fn gen_notes(notes: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in notes {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = (t * freq * TAU).sin() * 0.7 + (t * freq * 2.0 * TAU).sin() * 0.3;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Whack: low thump under a short noise crack
    fn gen_whack() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.09) as usize;
        let mut rng: u32 = 0xC0FFEE;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let thump = (ti * (140.0 - t * 60.0) * TAU).sin();
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let crack = if t < 0.25 { noise * (1.0 - t * 4.0) } else { 0.0 };
                (thump * 0.6 + crack * 0.4) * (1.0 - t).powf(1.5) * 0.45
            })
            .collect()
    }

    /// Miss: mole ducks away, a falling whistle
    fn gen_miss() -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * 0.18) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let freq = 700.0 - t * 450.0;
                (ti * freq * TAU).sin() * (1.0 - t).powf(0.6) * 0.2
            })
            .collect()
    }

    /// Time bonus: rising arpeggio C6 E6 G6 C7
    fn gen_bonus() -> Vec<f32> {
        gen_notes(&[(1047.0, 0.05), (1319.0, 0.05), (1568.0, 0.05), (2093.0, 0.12)], 0.25)
    }

    /// Life bar empty: slow falling minor line
    fn gen_empty() -> Vec<f32> {
        let mut samples =
            gen_notes(&[(392.0, 0.14), (311.0, 0.14), (262.0, 0.14), (196.0, 0.3)], 0.3);
        let fade_len = samples.len() / 4;
        let total = samples.len();
        for (k, s) in samples[total - fade_len..].iter_mut().enumerate() {
            *s *= 1.0 - k as f32 / fade_len as f32;
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit mono PCM
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_whack(&self) {}
    pub fn play_miss(&self) {}
    pub fn play_bonus(&self) {}
    pub fn play_empty(&self) {}
}

/// Play effects for game events. Returns the subscriptions; pass them to
/// `detach` at shutdown.
pub fn attach(sound: Rc<SoundEngine>, bus: &EventBus) -> Vec<SubscriptionId> {
    let cues: [(EventKind, fn(&SoundEngine)); 4] = [
        (EventKind::MoleHit, SoundEngine::play_whack),
        (EventKind::MoleMiss, SoundEngine::play_miss),
        (EventKind::IncreaseTime, SoundEngine::play_bonus),
        (EventKind::LifeBarEmpty, SoundEngine::play_empty),
    ];
    cues.into_iter()
        .map(|(kind, cue)| {
            let sfx = Rc::clone(&sound);
            bus.subscribe(kind, move |_| cue(&sfx))
        })
        .collect()
}

pub fn detach(bus: &EventBus, cues: Vec<SubscriptionId>) {
    for id in cues {
        bus.unsubscribe(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_then_detach_leaves_bus_clean() {
        // nothing to check without an audio device
        let Some(sfx) = SoundEngine::new() else { return };
        let bus = EventBus::new();
        let cues = attach(Rc::new(sfx), &bus);
        assert_eq!(cues.len(), 4);
        for kind in [EventKind::MoleHit, EventKind::MoleMiss, EventKind::IncreaseTime, EventKind::LifeBarEmpty] {
            assert_eq!(bus.subscriber_count(kind), 1);
        }
        detach(&bus, cues);
        for kind in [EventKind::MoleHit, EventKind::MoleMiss, EventKind::IncreaseTime, EventKind::LifeBarEmpty] {
            assert_eq!(bus.subscriber_count(kind), 0);
        }
    }
}
