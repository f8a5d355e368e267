//! Playback position bookkeeping across interrupted passes.
//!
//! Every uninterrupted stretch of playback is recorded as a time-slice. The
//! next `play()` resumes at the sum of the slices; once the slices cover the
//! recording (within the completion threshold) the pass is finished and the
//! slices are cleared.

/// Result of recording one playback slice
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SliceOutcome {
    /// The pass is complete; `played_secs` is what the slices added up to.
    Finished { played_secs: f64 },
    /// More is left; the next play resumes from the accumulated offset.
    Remaining { remaining_secs: f64 },
}

#[derive(Debug, Clone)]
pub struct PlaybackTimeline {
    duration_secs: f64,
    slices: Vec<f64>,
    threshold_secs: f64,
}

impl PlaybackTimeline {
    pub fn new(threshold_secs: f64) -> Self {
        Self {
            duration_secs: 0.0,
            slices: Vec::new(),
            threshold_secs,
        }
    }

    /// Set the recording length. Starts a fresh pass.
    pub fn set_duration(&mut self, duration_secs: f64) {
        self.duration_secs = duration_secs.max(0.0);
        self.slices.clear();
    }

    pub fn duration(&self) -> f64 {
        self.duration_secs
    }

    pub fn slices(&self) -> &[f64] {
        &self.slices
    }

    /// Where the next playback starts: everything played so far in this pass
    pub fn resume_offset(&self) -> f64 {
        self.slices.iter().sum()
    }

    pub fn remaining(&self) -> f64 {
        self.duration_secs - self.resume_offset()
    }

    pub fn record_slice(&mut self, elapsed_secs: f64) -> SliceOutcome {
        self.slices.push(elapsed_secs.max(0.0));

        let remaining_secs = self.remaining();
        if remaining_secs < self.threshold_secs {
            let played_secs = self.resume_offset();
            self.slices.clear();
            SliceOutcome::Finished { played_secs }
        } else {
            SliceOutcome::Remaining { remaining_secs }
        }
    }

    /// Forget the recording and every slice
    pub fn reset(&mut self) {
        self.duration_secs = 0.0;
        self.slices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn uninterrupted_pass_finishes() {
        let mut timeline = PlaybackTimeline::new(0.1);
        timeline.set_duration(2.0);

        assert_eq!(timeline.resume_offset(), 0.0);
        match timeline.record_slice(2.0) {
            SliceOutcome::Finished { played_secs } => assert!(approx(played_secs, 2.0)),
            other => panic!("expected finish, got {:?}", other),
        }
        assert!(timeline.slices().is_empty());
        assert!(approx(timeline.duration(), 2.0));
    }

    #[test]
    fn interrupted_pass_resumes_from_sum_of_slices() {
        let mut timeline = PlaybackTimeline::new(0.1);
        timeline.set_duration(3.0);

        match timeline.record_slice(1.0) {
            SliceOutcome::Remaining { remaining_secs } => assert!(approx(remaining_secs, 2.0)),
            other => panic!("expected remaining, got {:?}", other),
        }
        assert!(approx(timeline.resume_offset(), 1.0));

        timeline.record_slice(0.5);
        assert!(approx(timeline.resume_offset(), 1.5));

        match timeline.record_slice(1.5) {
            SliceOutcome::Finished { played_secs } => assert!(approx(played_secs, 3.0)),
            other => panic!("expected finish, got {:?}", other),
        }
        assert_eq!(timeline.resume_offset(), 0.0);
    }

    #[test]
    fn within_threshold_counts_as_finished() {
        let mut timeline = PlaybackTimeline::new(0.1);
        timeline.set_duration(2.0);

        assert!(matches!(
            timeline.record_slice(1.95),
            SliceOutcome::Finished { .. }
        ));

        timeline.set_duration(2.0);
        assert!(matches!(
            timeline.record_slice(1.85),
            SliceOutcome::Remaining { .. }
        ));
    }

    #[test]
    fn overshoot_is_finished() {
        let mut timeline = PlaybackTimeline::new(0.1);
        timeline.set_duration(1.0);
        assert!(matches!(
            timeline.record_slice(1.3),
            SliceOutcome::Finished { .. }
        ));
    }

    #[test]
    fn reset_clears_duration_and_slices() {
        let mut timeline = PlaybackTimeline::new(0.1);
        timeline.set_duration(3.0);
        timeline.record_slice(1.0);

        timeline.reset();
        assert_eq!(timeline.duration(), 0.0);
        assert!(timeline.slices().is_empty());
    }
}
