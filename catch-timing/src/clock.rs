use std::time::Duration;

use crate::Timer;

/// Start/stop stopwatch over a monotonic `Timer`. Elapsed time accumulates
/// across start/stop pairs until `reset`.
#[derive(Debug, Clone)]
pub struct Stopwatch<T: Timer<Timestamp = u64>> {
    timer: T,
    started_at: Option<u64>,
    accumulated: Duration,
}

impl<T: Timer<Timestamp = u64>> Stopwatch<T> {
    pub fn new(timer: T) -> Self {
        Self {
            timer,
            started_at: None,
            accumulated: Duration::ZERO,
        }
    }

    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(self.timer.now());
        }
    }

    pub fn stop(&mut self) {
        if let Some(ts) = self.started_at.take() {
            self.accumulated += self.timer.elapsed(ts);
        }
    }

    pub fn reset(&mut self) {
        self.started_at = None;
        self.accumulated = Duration::ZERO;
    }

    pub fn restart(&mut self) {
        self.reset();
        self.start();
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(ts) => self.accumulated + self.timer.elapsed(ts),
            None => self.accumulated,
        }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }
}

/// The two per-trial stopwatches: ISI (wait) phase and response phase.
#[derive(Debug, Clone)]
pub struct TrialClock<T: Timer<Timestamp = u64>> {
    isi: Stopwatch<T>,
    response: Stopwatch<T>,
}

impl<T: Timer<Timestamp = u64>> TrialClock<T> {
    pub fn new(timer: T) -> Self {
        Self {
            isi: Stopwatch::new(timer.clone()),
            response: Stopwatch::new(timer),
        }
    }

    /// Resets both stopwatches and starts the ISI one.
    pub fn start_isi_phase(&mut self) {
        self.response.reset();
        self.isi.restart();
    }

    pub fn isi_elapsed_seconds(&self) -> f64 {
        self.isi.elapsed_seconds()
    }

    pub fn end_isi_phase_start_response(&mut self) {
        self.isi.stop();
        self.response.restart();
    }

    pub fn response_elapsed_seconds(&self) -> f64 {
        self.response.elapsed_seconds()
    }

    /// Halts the response stopwatch and returns its final reading.
    pub fn stop_response_phase(&mut self) -> f64 {
        self.response.stop();
        self.response.elapsed_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualTimer;

    #[test]
    fn stopwatch_accumulates_across_runs() {
        let timer = ManualTimer::new();
        let mut sw = Stopwatch::new(timer.clone());
        sw.start();
        timer.advance_secs(0.25);
        sw.stop();
        timer.advance_secs(1.0);
        assert_eq!(sw.elapsed(), Duration::from_millis(250));
        sw.start();
        timer.advance_secs(0.25);
        assert_eq!(sw.elapsed(), Duration::from_millis(500));
        sw.reset();
        assert_eq!(sw.elapsed(), Duration::ZERO);
        assert!(!sw.is_running());
    }

    #[test]
    fn phases_hand_over_in_one_step() {
        let timer = ManualTimer::new();
        let mut clock = TrialClock::new(timer.clone());
        clock.start_isi_phase();
        timer.advance_secs(0.8);
        assert!((clock.isi_elapsed_seconds() - 0.8).abs() < 1e-9);
        assert_eq!(clock.response_elapsed_seconds(), 0.0);

        clock.end_isi_phase_start_response();
        timer.advance_secs(0.3);
        // ISI reading frozen at handover.
        assert!((clock.isi_elapsed_seconds() - 0.8).abs() < 1e-9);
        assert!((clock.response_elapsed_seconds() - 0.3).abs() < 1e-9);
        let rt = clock.stop_response_phase();
        assert!((rt - 0.3).abs() < 1e-9);
        timer.advance_secs(5.0);
        assert_eq!(clock.response_elapsed_seconds(), rt);
    }

    #[test]
    fn new_isi_phase_clears_previous_trial() {
        let timer = ManualTimer::new();
        let mut clock = TrialClock::new(timer.clone());
        clock.start_isi_phase();
        timer.advance_secs(1.0);
        clock.end_isi_phase_start_response();
        timer.advance_secs(0.4);
        clock.stop_response_phase();

        clock.start_isi_phase();
        assert_eq!(clock.isi_elapsed_seconds(), 0.0);
        assert_eq!(clock.response_elapsed_seconds(), 0.0);
        timer.advance_secs(0.5);
        assert!((clock.isi_elapsed_seconds() - 0.5).abs() < 1e-9);
    }
}
