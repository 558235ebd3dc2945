use rodio::Source;
use std::f32::consts::PI;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;
const RAMP_SECS: f32 = 0.010;

/// A short sine beep with linear attack and release so it doesn't click.
pub struct BeepTone {
    frequency: f32,
    amplitude: f32,
    total_samples: usize,
    num_sample: usize,
}

impl BeepTone {
    pub fn new(frequency: f32, duration: Duration) -> Self {
        let total_samples =
            (duration.as_nanos() * SAMPLE_RATE as u128 / 1_000_000_000) as usize;
        Self {
            frequency,
            amplitude: 0.25,
            total_samples,
            num_sample: 0,
        }
    }

    fn envelope(&self, index: usize) -> f32 {
        let ramp = (RAMP_SECS * SAMPLE_RATE as f32) as usize;
        if ramp == 0 {
            return 1.0;
        }
        let from_end = self.total_samples.saturating_sub(index + 1);
        let attack = (index as f32 / ramp as f32).min(1.0);
        let release = (from_end as f32 / ramp as f32).min(1.0);
        attack.min(release)
    }
}

impl Iterator for BeepTone {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.num_sample >= self.total_samples {
            return None;
        }
        let index = self.num_sample;
        self.num_sample += 1;

        let t = index as f32 / SAMPLE_RATE as f32;
        let sample = (2.0 * PI * self.frequency * t).sin();
        Some(sample * self.amplitude * self.envelope(index))
    }
}

impl Source for BeepTone {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.total_samples - self.num_sample)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_nanos(
            self.total_samples as u64 * 1_000_000_000 / SAMPLE_RATE as u64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_and_silent_at_both_edges() {
        let tone = BeepTone::new(880.0, Duration::from_millis(150));
        let samples: Vec<f32> = tone.collect();
        assert_eq!(samples.len(), 6615);
        assert_eq!(samples[0], 0.0);
        assert!(samples.last().unwrap().abs() < 1e-6);
        assert!(samples.iter().all(|s| s.abs() <= 0.25 + f32::EPSILON));
    }

    #[test]
    fn reports_its_duration() {
        let tone = BeepTone::new(440.0, Duration::from_millis(100));
        assert_eq!(tone.channels(), 1);
        assert_eq!(tone.total_duration(), Some(Duration::from_millis(100)));
    }
}
