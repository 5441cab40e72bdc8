//! Frame timing
//!
//! Invoked once per display refresh. Tracks frame-time history, counts dropped
//! frames and raises an escalation when drops cluster inside a short window.

use crate::buffer::RollingMetricBuffer;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Outcome of a single refresh tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSample {
    /// Time since the previous refresh
    pub elapsed: Duration,
    /// Frame rate implied by this single interval
    pub instantaneous_fps: f64,
    /// Interval exceeded the drop threshold
    pub dropped: bool,
    /// Drop count inside the window crossed the escalation threshold
    pub escalate: bool,
}

/// Per-refresh frame timing tracker
#[derive(Debug, Clone)]
pub struct FrameTimer {
    target_interval: Duration,
    drop_threshold: Duration,
    escalation_threshold: u32,
    window: Duration,
    /// Frame times in seconds
    frame_times: RollingMetricBuffer<f64>,
    last_tick: Option<Instant>,
    /// Timestamps of recent drops, at most `escalation_threshold + 1`
    recent_drops: VecDeque<Instant>,
    total_frames: u64,
    dropped_frames: u64,
    escalations: u64,
}

impl FrameTimer {
    pub fn new(
        target_interval: Duration,
        capacity: usize,
        drop_factor: f64,
        escalation_threshold: u32,
        window: Duration,
    ) -> Self {
        Self {
            target_interval,
            drop_threshold: target_interval.mul_f64(drop_factor),
            escalation_threshold,
            window,
            frame_times: RollingMetricBuffer::new(capacity),
            last_tick: None,
            recent_drops: VecDeque::with_capacity(escalation_threshold as usize + 1),
            total_frames: 0,
            dropped_frames: 0,
            escalations: 0,
        }
    }

    /// Record a refresh tick. The first tick only seeds the timestamp.
    pub fn on_refresh(&mut self, now: Instant) -> Option<FrameSample> {
        let previous = self.last_tick.replace(now)?;
        let elapsed = now.saturating_duration_since(previous);
        let secs = elapsed.as_secs_f64();

        self.frame_times.append(secs);
        self.total_frames += 1;

        let dropped = elapsed > self.drop_threshold;
        let mut escalate = false;

        if dropped {
            self.dropped_frames += 1;
            escalate = self.record_drop(now);
        }

        Some(FrameSample {
            elapsed,
            instantaneous_fps: if secs > 0.0 { 1.0 / secs } else { 0.0 },
            dropped,
            escalate,
        })
    }

    fn record_drop(&mut self, now: Instant) -> bool {
        while let Some(front) = self.recent_drops.front() {
            if now.saturating_duration_since(*front) > self.window {
                self.recent_drops.pop_front();
            } else {
                break;
            }
        }

        self.recent_drops.push_back(now);

        if self.recent_drops.len() as u32 > self.escalation_threshold {
            // A fresh burst is required before escalating again
            self.recent_drops.clear();
            self.escalations += 1;
            return true;
        }
        false
    }

    pub fn target_interval(&self) -> Duration {
        self.target_interval
    }

    /// Average frame time in seconds, `None` before the first interval
    pub fn average_frame_time(&self) -> Option<f64> {
        if self.frame_times.is_empty() {
            None
        } else {
            Some(self.frame_times.average())
        }
    }

    /// Average frame rate over the buffer (0 when unknown)
    pub fn frame_rate(&self) -> f64 {
        match self.average_frame_time() {
            Some(avg) if avg > 0.0 => 1.0 / avg,
            _ => 0.0,
        }
    }

    pub fn dropped_frame_percentage(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.dropped_frames as f64 / self.total_frames as f64 * 100.0
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    pub fn escalations(&self) -> u64 {
        self.escalations
    }

    pub fn frame_times(&self) -> &RollingMetricBuffer<f64> {
        &self.frame_times
    }

    pub fn reset(&mut self) {
        self.frame_times.clear();
        self.last_tick = None;
        self.recent_drops.clear();
        self.total_frames = 0;
        self.dropped_frames = 0;
        self.escalations = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_micros(16_667);

    fn timer() -> FrameTimer {
        FrameTimer::new(FRAME, 120, 1.5, 5, Duration::from_secs(1))
    }

    #[test]
    fn test_first_tick_only_seeds() {
        let mut timer = timer();
        assert!(timer.on_refresh(Instant::now()).is_none());
        assert_eq!(timer.total_frames(), 0);
        assert_eq!(timer.average_frame_time(), None);
    }

    #[test]
    fn test_steady_frames_are_not_dropped() {
        let mut timer = timer();
        let start = Instant::now();
        timer.on_refresh(start);

        for i in 1..=60u32 {
            let sample = timer.on_refresh(start + FRAME * i).unwrap();
            assert!(!sample.dropped);
            assert!((sample.instantaneous_fps - 60.0).abs() < 0.1);
        }

        assert_eq!(timer.dropped_frames(), 0);
        assert!((timer.frame_rate() - 60.0).abs() < 0.1);
        assert_eq!(timer.dropped_frame_percentage(), 0.0);
    }

    #[test]
    fn test_slow_frame_counts_as_drop() {
        let mut timer = timer();
        let start = Instant::now();
        timer.on_refresh(start);

        let sample = timer.on_refresh(start + FRAME * 2).unwrap();
        assert!(sample.dropped);
        assert!(!sample.escalate);
        assert_eq!(timer.dropped_frames(), 1);
        assert!((timer.dropped_frame_percentage() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_escalates_after_six_drops_in_window() {
        let mut timer = timer();
        let mut now = Instant::now();
        timer.on_refresh(now);

        let mut escalations = Vec::new();
        for _ in 0..6 {
            now += FRAME * 2;
            escalations.push(timer.on_refresh(now).unwrap().escalate);
        }

        assert_eq!(escalations, vec![false, false, false, false, false, true]);
        assert_eq!(timer.escalations(), 1);

        // The next drop starts a new burst
        now += FRAME * 2;
        assert!(!timer.on_refresh(now).unwrap().escalate);
    }

    #[test]
    fn test_spread_out_drops_do_not_escalate() {
        let mut timer = timer();
        let mut now = Instant::now();
        timer.on_refresh(now);

        for _ in 0..10 {
            // One drop, then a long stretch of healthy frames
            now += FRAME * 2;
            assert!(!timer.on_refresh(now).unwrap().escalate);
            for _ in 0..70 {
                now += FRAME;
                timer.on_refresh(now);
            }
        }

        assert_eq!(timer.escalations(), 0);
        assert_eq!(timer.dropped_frames(), 10);
    }

    #[test]
    fn test_reset_clears_counters() {
        let mut timer = timer();
        let start = Instant::now();
        timer.on_refresh(start);
        timer.on_refresh(start + FRAME * 3);
        timer.reset();

        assert_eq!(timer.total_frames(), 0);
        assert!(timer.frame_times().is_empty());
        assert!(timer.on_refresh(start + FRAME * 4).is_none());
    }
}
