//! Sensor sampling: debounce filtering and the per-cycle sampler.
//!
//! The beam-break detector is electrically noisy, so its raw line must
//! hold the hazard polarity for a run of consecutive samples before the
//! signal is trusted. The threshold is expressed in sample counts, not
//! wall-clock time — the sampler's fixed settling delay is what turns it
//! into a latency.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{trace, warn};

use crate::hal::{DigitalInput, DigitalOutput};

/// One filtered reading pair, produced once per control-loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSnapshot {
    /// Debounced beam-break signal. `true` means the beam has been
    /// broken for longer than the debounce threshold.
    pub laser_hazard: bool,

    /// Raw PIR level. Level-based by design, no debouncing.
    pub motion: bool,
}

/// Debounce filter for a single digital line.
///
/// The hazard polarity must be observed on more than `threshold`
/// consecutive samples before the output reads `true`; any other sample
/// resets the run. The boundary is exclusive: with threshold 10 the
/// output first reads `true` on the 11th consecutive hazard sample.
#[derive(Debug)]
pub struct DebounceFilter {
    counter: u32,
    threshold: u32,
    active_low: bool,
}

impl DebounceFilter {
    /// Creates a filter. `active_low` selects the hazard polarity: when
    /// set, a low line level counts toward the hazard run.
    #[must_use]
    pub fn new(threshold: u32, active_low: bool) -> Self {
        Self {
            counter: 0,
            threshold,
            active_low,
        }
    }

    /// Feeds one raw sample and returns the filtered signal.
    pub fn observe(&mut self, raw: bool) -> bool {
        let hazard = raw != self.active_low;
        if hazard {
            self.counter += 1;
            self.counter > self.threshold
        } else {
            self.counter = 0;
            false
        }
    }

    /// The raw line level that means "no hazard" for this polarity.
    #[must_use]
    pub fn clear_level(&self) -> bool {
        self.active_low
    }
}

/// Owns pin access and timing for both sensors; produces one
/// [`SensorSnapshot`] per control-loop iteration.
///
/// A failed pin read is logged and the previous good value is reused for
/// that cycle — a single flaky read must not crash the control loop.
pub struct SensorSampler {
    laser: Box<dyn DigitalInput>,
    pir: Box<dyn DigitalInput>,
    emitter: Option<Box<dyn DigitalOutput>>,
    filter: DebounceFilter,
    settle: Duration,
    last_laser_raw: bool,
    last_motion: bool,
}

impl SensorSampler {
    /// Creates a sampler. `emitter`, when present, is pulsed around each
    /// beam-break read (assert, settle, read, de-assert).
    #[must_use]
    pub fn new(
        laser: Box<dyn DigitalInput>,
        pir: Box<dyn DigitalInput>,
        emitter: Option<Box<dyn DigitalOutput>>,
        filter: DebounceFilter,
        settle: Duration,
    ) -> Self {
        let last_laser_raw = filter.clear_level();
        Self {
            laser,
            pir,
            emitter,
            filter,
            settle,
            last_laser_raw,
            last_motion: false,
        }
    }

    /// Samples both sensors, enforcing the settling delay before each
    /// read. No other actuator state changes between the emitter assert
    /// and de-assert.
    pub async fn sample(&mut self) -> SensorSnapshot {
        if let Some(emitter) = &mut self.emitter {
            if let Err(e) = emitter.write(true) {
                warn!(error = %e, "failed to assert emitter");
            }
        }
        sleep(self.settle).await;
        match self.laser.read() {
            Ok(raw) => self.last_laser_raw = raw,
            Err(e) => {
                warn!(error = %e, "beam-break read failed, reusing previous value");
            }
        }
        if let Some(emitter) = &mut self.emitter {
            if let Err(e) = emitter.write(false) {
                warn!(error = %e, "failed to de-assert emitter");
            }
        }
        let laser_hazard = self.filter.observe(self.last_laser_raw);

        sleep(self.settle).await;
        match self.pir.read() {
            Ok(raw) => self.last_motion = raw,
            Err(e) => {
                warn!(error = %e, "motion read failed, reusing previous value");
            }
        }

        let snapshot = SensorSnapshot {
            laser_hazard,
            motion: self.last_motion,
        };
        trace!(
            laser_raw = self.last_laser_raw,
            laser_hazard = snapshot.laser_hazard,
            motion = snapshot.motion,
            "sampled sensors"
        );
        snapshot
    }

    /// Best-effort: leaves the emitter de-asserted. Called from the
    /// shutdown sequence in case the loop was cancelled mid-sample.
    pub fn quiesce(&mut self) {
        if let Some(emitter) = &mut self.emitter {
            if let Err(e) = emitter.write(false) {
                warn!(error = %e, "failed to de-assert emitter during shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::sim::{SimInput, SimOutput};
    use crate::hal::HalError;

    /// Input whose reads always fail, for the retry-next-cycle policy.
    struct BrokenInput;

    impl DigitalInput for BrokenInput {
        fn read(&mut self) -> Result<bool, HalError> {
            Err(HalError::Gpio("broken".to_string()))
        }
    }

    #[test]
    fn test_debounce_stays_false_until_threshold_exceeded() {
        let mut filter = DebounceFilter::new(10, true);
        for _ in 0..10 {
            assert!(!filter.observe(false));
        }
        // 11th consecutive hazard sample crosses the boundary.
        assert!(filter.observe(false));
        assert!(filter.observe(false));
    }

    #[test]
    fn test_debounce_any_clear_sample_resets_the_run() {
        let mut filter = DebounceFilter::new(3, true);
        for _ in 0..3 {
            filter.observe(false);
        }
        assert!(!filter.observe(true));
        // The run starts over from zero.
        for _ in 0..3 {
            assert!(!filter.observe(false));
        }
        assert!(filter.observe(false));
    }

    #[test]
    fn test_debounce_active_high_polarity() {
        let mut filter = DebounceFilter::new(2, false);
        assert!(!filter.observe(true));
        assert!(!filter.observe(true));
        assert!(filter.observe(true));
        assert!(!filter.observe(false));
    }

    #[test]
    fn test_clear_level_matches_polarity() {
        assert!(DebounceFilter::new(1, true).clear_level());
        assert!(!DebounceFilter::new(1, false).clear_level());
    }

    #[tokio::test]
    async fn test_sampler_debounces_laser_and_passes_motion_through() {
        let laser = SimInput::script(vec![false; 12], true);
        let pir = SimInput::script([false, true, true], false);
        let mut sampler = SensorSampler::new(
            Box::new(laser),
            Box::new(pir),
            None,
            DebounceFilter::new(10, true),
            Duration::ZERO,
        );

        let mut hazards = Vec::new();
        let mut motions = Vec::new();
        for _ in 0..12 {
            let snap = sampler.sample().await;
            hazards.push(snap.laser_hazard);
            motions.push(snap.motion);
        }

        // Hazard asserts on the 11th low sample, stays for the 12th.
        assert_eq!(hazards.iter().filter(|h| **h).count(), 2);
        assert!(!hazards[9]);
        assert!(hazards[10]);
        assert!(hazards[11]);
        // PIR is level-based: visible immediately, no debounce.
        assert!(!motions[0]);
        assert!(motions[1]);
    }

    #[tokio::test]
    async fn test_sampler_pulses_emitter_around_each_read() {
        let emitter = SimOutput::new();
        let levels = emitter.levels();
        let mut sampler = SensorSampler::new(
            Box::new(SimInput::steady(true)),
            Box::new(SimInput::steady(false)),
            Some(Box::new(emitter)),
            DebounceFilter::new(10, true),
            Duration::ZERO,
        );

        sampler.sample().await;
        sampler.sample().await;

        assert_eq!(*levels.lock().unwrap(), vec![true, false, true, false]);
    }

    #[tokio::test]
    async fn test_sampler_reuses_last_good_value_on_read_failure() {
        let mut sampler = SensorSampler::new(
            Box::new(BrokenInput),
            Box::new(BrokenInput),
            None,
            DebounceFilter::new(2, true),
            Duration::ZERO,
        );

        // The laser line starts at the clear level, so a permanently
        // failing pin never accumulates a hazard run.
        for _ in 0..5 {
            let snap = sampler.sample().await;
            assert!(!snap.laser_hazard);
            assert!(!snap.motion);
        }
    }
}
