//! Audio playback
//!
//! Thin wrapper over rodio. A missing or broken audio device downgrades the
//! system to a no-op instead of failing engine startup, so headless and
//! CI environments still run.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use crate::foundation::math::Point3;

/// Audio output system, silently disabled when no device is available
pub struct AudioSystem {
    // The stream must outlive its handle; dropping it stops all playback
    stream: Option<(OutputStream, OutputStreamHandle)>,
    listener_position: Point3,
    gain: f32,
}

impl AudioSystem {
    /// Open the default output device. Failure logs a warning and yields a
    /// disabled system.
    pub fn new() -> Self {
        let stream = match OutputStream::try_default() {
            Ok((stream, handle)) => Some((stream, handle)),
            Err(e) => {
                log::warn!("audio unavailable, continuing silent: {e}");
                None
            }
        };
        Self {
            stream,
            listener_position: Point3::origin(),
            gain: 1.0,
        }
    }

    /// An explicitly disabled system, for headless use
    pub fn disabled() -> Self {
        Self {
            stream: None,
            listener_position: Point3::origin(),
            gain: 1.0,
        }
    }

    /// Whether an output device was opened
    pub fn is_enabled(&self) -> bool {
        self.stream.is_some()
    }

    /// Update the listener position (tracks the camera)
    pub fn set_listener_position(&mut self, position: Point3) {
        self.listener_position = position;
    }

    /// Current listener position
    pub fn listener_position(&self) -> Point3 {
        self.listener_position
    }

    /// Set the global gain applied to subsequently played sounds
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.max(0.0);
    }

    /// Play a sound file once, attenuated by distance from the listener.
    /// Returns whether playback started.
    pub fn play_at(&self, path: &Path, position: Point3) -> bool {
        let Some((_, handle)) = &self.stream else {
            return false;
        };

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                log::warn!("failed to open sound {}: {e}", path.display());
                return false;
            }
        };
        let source = match Decoder::new(BufReader::new(file)) {
            Ok(source) => source,
            Err(e) => {
                log::warn!("failed to decode sound {}: {e}", path.display());
                return false;
            }
        };

        let distance = (position - self.listener_position).norm();
        let attenuation = 1.0 / (1.0 + distance * 0.1);

        match Sink::try_new(handle) {
            Ok(sink) => {
                sink.append(source.amplify(self.gain * attenuation));
                sink.detach();
                true
            }
            Err(e) => {
                log::warn!("failed to start playback: {e}");
                false
            }
        }
    }
}

impl Default for AudioSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_system_refuses_playback() {
        let audio = AudioSystem::disabled();
        assert!(!audio.is_enabled());
        assert!(!audio.play_at(Path::new("nonexistent.ogg"), Point3::origin()));
    }

    #[test]
    fn gain_never_goes_negative() {
        let mut audio = AudioSystem::disabled();
        audio.set_gain(-2.0);
        assert_eq!(audio.gain, 0.0);
    }

    #[test]
    fn listener_position_tracks_updates() {
        let mut audio = AudioSystem::disabled();
        audio.set_listener_position(Point3::new(1.0, 2.0, 3.0));
        assert_eq!(audio.listener_position(), Point3::new(1.0, 2.0, 3.0));
    }
}
