//! Volume metering for live capture.
//!
//! The level reported while recording is the mean absolute sample value of
//! the most recent time-domain window, normalized to 0.0..=1.0.

use std::collections::VecDeque;

/// Mean absolute amplitude of 16-bit samples, normalized to 0.0..=1.0.
pub fn mean_abs_amplitude<'a>(samples: impl IntoIterator<Item = &'a i16>) -> f32 {
    let mut sum = 0.0f64;
    let mut count = 0usize;
    for &s in samples {
        sum += (s as f64 / 32768.0).abs();
        count += 1;
    }

    if count == 0 {
        0.0
    } else {
        (sum / count as f64) as f32
    }
}

/// Sliding analysis window over the capture stream
///
/// Keeps the newest `window` samples, like a platform analysis node with a
/// fixed FFT size.
#[derive(Debug, Clone)]
pub struct Analyser {
    window: usize,
    samples: VecDeque<i16>,
}

impl Analyser {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            samples: VecDeque::with_capacity(window),
        }
    }

    pub fn push(&mut self, samples: &[i16]) {
        let skip = samples.len().saturating_sub(self.window);
        for &s in &samples[skip..] {
            if self.samples.len() == self.window {
                self.samples.pop_front();
            }
            self.samples.push_back(s);
        }
    }

    /// Level of the current window
    pub fn level(&self) -> f32 {
        mean_abs_amplitude(&self.samples)
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_is_zero() {
        assert_eq!(mean_abs_amplitude(&[0i16; 64]), 0.0);
        assert_eq!(mean_abs_amplitude(&[] as &[i16]), 0.0);
    }

    #[test]
    fn sign_does_not_matter() {
        let level = mean_abs_amplitude(&[16384, -16384, 16384, -16384]);
        assert!((level - 0.5).abs() < 1e-6);
    }

    #[test]
    fn full_scale_is_about_one() {
        let level = mean_abs_amplitude(&[i16::MIN; 8]);
        assert!((level - 1.0).abs() < 1e-6);
    }

    #[test]
    fn analyser_keeps_newest_window() {
        let mut analyser = Analyser::new(4);
        analyser.push(&[32767; 4]);
        analyser.push(&[0, 0]);

        assert_eq!(analyser.len(), 4);
        assert!((analyser.level() - 0.5).abs() < 0.01);

        analyser.push(&[0; 10]);
        assert_eq!(analyser.level(), 0.0);

        analyser.clear();
        assert!(analyser.is_empty());
    }
}
