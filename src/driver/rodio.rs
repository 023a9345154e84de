use std::time::Duration;

use rodio::Source;

use crate::driver::AudioDevice;

const SAMPLE_RATE: u32 = 44_100;
const TONE_FREQ: u32 = 440; // A4
const GAIN: f32 = 0.08;

// The machines this instruction set ran on drove a single-bit beeper, so a
// square wave is a closer fit than rodio's built-in sine synthesis.
struct SquareWave {
    // Sample index, kept in 0..SAMPLE_RATE; the wave is periodic over one
    // second so the phase math never overflows
    clock: u32,
}

impl SquareWave {
    fn new() -> Self {
        SquareWave { clock: 0 }
    }
}

impl Iterator for SquareWave {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        self.clock = (self.clock + 1) % SAMPLE_RATE;
        let phase = (self.clock * TONE_FREQ % SAMPLE_RATE) as f32 / SAMPLE_RATE as f32;
        Some(if phase < 0.5 { GAIN } else { -GAIN })
    }
}

impl Source for SquareWave {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

pub struct Rodio {
    // Output stream must outlive the sink that plays into it
    _stream: rodio::OutputStream,
    // Handle to audio device which controls playback
    sink: rodio::Sink,
}

impl Rodio {
    pub fn new() -> Self {
        let (stream, handle) = rodio::OutputStream::try_default().expect("no audio output found");
        let sink = rodio::Sink::try_new(&handle).expect("audio sink creation failed");

        // One endless buzzer tone; the sound timer gates playback on and off
        sink.append(SquareWave::new());
        sink.pause();

        Rodio {
            _stream: stream,
            sink,
        }
    }
}

impl AudioDevice for Rodio {
    fn receive_signal(&mut self, tone_on: bool) -> &mut dyn AudioDevice {
        match tone_on {
            true => self.sink.play(),
            false => self.sink.pause(),
        }

        self
    }

    fn play_sound(&mut self) {
        // The tone has been audible for the beep's whole duration; nothing
        // extra to do on the trailing edge
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_wave_flips_level_at_twice_the_tone_frequency() {
        let samples: Vec<f32> = SquareWave::new().take(SAMPLE_RATE as usize).collect();

        // Comparing cyclically over the one-second period counts every
        // level change: two per cycle of the tone
        let flips = (0..samples.len())
            .filter(|&i| samples[i] != samples[(i + 1) % samples.len()])
            .count();
        assert_eq!(flips as u32, 2 * TONE_FREQ);
    }

    #[test]
    fn square_wave_stays_within_its_gain() {
        for sample in SquareWave::new().take(1000) {
            assert_eq!(sample.abs(), GAIN);
        }
    }
}
