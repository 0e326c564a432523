use std::time::Duration;

use log::warn;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

use crate::error::Result;
use crate::sound::{SAMPLE_RATE, Sound, Voice};

impl Source for Voice {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.remaining())
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(
            self.remaining() as f32 / SAMPLE_RATE as f32,
        ))
    }
}

/// Plays effects on the default output device.
pub struct Audio {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    volume: f32,
}

impl Audio {
    pub fn new(volume: f32) -> Result<Self> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
            volume,
        })
    }

    /// Fire and forget. Each effect gets its own detached sink so effects can
    /// overlap.
    pub fn play(&self, sound: Sound) {
        let sink = match Sink::try_new(&self.handle) {
            Ok(sink) => sink,
            Err(e) => {
                warn!("Could not play {sound:?}: {e}");
                return;
            }
        };
        sink.set_volume(self.volume);
        sink.append(Voice::new(sound));
        sink.detach();
    }
}
