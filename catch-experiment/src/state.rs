use super::config::SessionConfig;
use super::error::ConfigurationError;
use super::median::RunningMedianTracker;
use super::metadata::{begin_session, timestamp_now};
use super::recorder::TrialRecorder;
use super::schedule::{IsiSchedule, IsiScheduler, round_to};
use super::scoring::ScoringPolicy;
use super::session::SessionState;
use catch_core::{Feedback, Phase, SessionData, SessionEvent, SessionMetadata, TrialRecord};
use catch_timing::{HighPrecisionTimer, Timer, TrialClock};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Decimal places kept for recorded reaction times.
const RT_DECIMALS: i32 = 7;

/// Drives one session: wait phase, response window, scoring and recording,
/// trial after trial until the schedule or trial limit runs out.
pub struct TrialStateMachine<T>
where
    T: Timer<Timestamp = u64>,
{
    config: SessionConfig,
    schedule: IsiSchedule,
    clock: TrialClock<T>,
    median: RunningMedianTracker,
    recorder: TrialRecorder,
    state: SessionState,
    metadata: SessionMetadata,
}

/// Validates `config`, builds the shuffled schedule and starts trial 0 on
/// the wall clock.
pub fn new_session(
    config: SessionConfig,
) -> Result<TrialStateMachine<HighPrecisionTimer>, ConfigurationError> {
    TrialStateMachine::new(config, HighPrecisionTimer::new())
}

impl<T> TrialStateMachine<T>
where
    T: Timer<Timestamp = u64>,
{
    pub fn new(config: SessionConfig, timer: T) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let schedule = IsiScheduler::generate(
            config.isi_low,
            config.isi_high,
            config.isi_step,
            config.isi_rep,
            config.seed,
        )?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_os_rng(),
        };
        let metadata = begin_session(&mut rng, &config.participant_name, &config.user_agent());
        Ok(Self::with_schedule(config, schedule, timer, metadata))
    }

    /// Starts a session over a prebuilt schedule. The schedule is used as-is.
    pub fn with_schedule(
        config: SessionConfig,
        schedule: IsiSchedule,
        timer: T,
        metadata: SessionMetadata,
    ) -> Self {
        log::info!(
            "Session {} started: {} trials scheduled, trial limit {}",
            metadata.id,
            schedule.len(),
            config.trial_limit
        );
        let mut machine = Self {
            config,
            schedule,
            clock: TrialClock::new(timer),
            median: RunningMedianTracker::new(),
            recorder: TrialRecorder::new(),
            state: SessionState::default(),
            metadata,
        };
        machine.start_trial(0);
        machine
    }

    /// Reads the machine's own clock and advances by one tick.
    pub fn tick(&mut self, input_occurred: bool) -> SessionEvent {
        let elapsed_isi = self.clock.isi_elapsed_seconds();
        let elapsed_response = self.clock.response_elapsed_seconds();
        self.advance(elapsed_isi, elapsed_response, input_occurred)
    }

    /// Advances the session by one tick.
    ///
    /// `input_occurred` must already be coalesced: any number of presses in
    /// the same tick count as one. Only one event is produced per tick. In the
    /// wait phase ISI expiry is checked first: a press on the expiry tick shows
    /// the stimulus without a penalty and is not taken as the response. In the
    /// response window a press is handled before auto-hide and timeout.
    pub fn advance(
        &mut self,
        elapsed_isi: f64,
        elapsed_response: f64,
        input_occurred: bool,
    ) -> SessionEvent {
        match self.state.phase {
            Phase::SessionComplete => SessionEvent::NoChange,
            Phase::Waiting => self.advance_waiting(elapsed_isi, input_occurred),
            Phase::RespondingWindow => self.advance_responding(elapsed_response, input_occurred),
        }
    }

    fn advance_waiting(&mut self, elapsed_isi: f64, input_occurred: bool) -> SessionEvent {
        if elapsed_isi >= self.state.isi {
            self.state.show_stimulus();
            self.clock.end_isi_phase_start_response();
            log::debug!(
                "Trial {}: stimulus shown after {:.3}s (isi {:.1}s)",
                self.state.trial_n,
                elapsed_isi,
                self.state.isi
            );
            return SessionEvent::StimulusShown;
        }

        if input_occurred {
            let policy = &self.config.scoring;
            self.state.score = policy.score_early_press(self.state.score);
            self.state.early_presses += 1;
            self.state.feedback = Some(Feedback::TooEarly);
            log::warn!(
                "Trial {}: early press #{} at {:.3}s, score {}",
                self.state.trial_n,
                self.state.early_presses,
                elapsed_isi,
                self.state.score
            );
            return SessionEvent::EarlyPenalty {
                new_score: self.state.score,
            };
        }

        SessionEvent::NoChange
    }

    fn advance_responding(&mut self, elapsed_response: f64, input_occurred: bool) -> SessionEvent {
        if input_occurred {
            self.clock.stop_response_phase();
            return self.complete_trial(Some(elapsed_response));
        }

        if let Some(timeout) = self.config.response_timeout {
            if elapsed_response > timeout {
                self.clock.stop_response_phase();
                log::debug!(
                    "Trial {}: no response within {:.3}s",
                    self.state.trial_n,
                    timeout
                );
                return self.complete_trial(None);
            }
        }

        if self.state.stimulus_visible
            && self
                .config
                .scoring
                .should_hide(elapsed_response, self.median_rt())
        {
            self.state.stimulus_visible = false;
            log::debug!(
                "Trial {}: stimulus hidden at {:.3}s",
                self.state.trial_n,
                elapsed_response
            );
            return SessionEvent::StimulusAutoHidden;
        }

        SessionEvent::NoChange
    }

    fn complete_trial(&mut self, rt: Option<f64>) -> SessionEvent {
        let feedback = match rt {
            Some(rt) => {
                // The new RT joins the median before it is scored against it.
                self.median.insert(rt);
                let median = self.median_rt();
                let (delta, feedback) = self.config.scoring.score_response(
                    rt,
                    median.unwrap_or_default(),
                    median.is_some(),
                );
                self.state.score = self.config.scoring.apply(self.state.score, delta);
                feedback
            }
            None => Feedback::Missed,
        };
        self.state.feedback = Some(feedback);
        self.state.stimulus_visible = false;

        let record = TrialRecord {
            trial_n: self.state.trial_n,
            isi: self.state.isi,
            rt: rt.map(|v| round_to(v, RT_DECIMALS)),
            datetime: timestamp_now(),
            score: self.state.score,
            early_presses: self.state.early_presses,
        };
        self.recorder.push(record.clone());
        log::info!(
            "Trial {} complete: isi {:.1}s, rt {:?}, {:?}, score {}",
            record.trial_n,
            record.isi,
            record.rt,
            feedback,
            record.score
        );

        let trial_n = self.state.trial_n;
        let last_trial = self.schedule.is_last(trial_n) || self.config.is_limit_trial(trial_n);
        self.state.phase = Phase::after_trial(last_trial);

        if last_trial {
            self.recorder.seal();
            self.metadata.end = Some(timestamp_now());
            log::info!(
                "Session {} complete: {} trials, final score {}",
                self.metadata.id,
                self.recorder.len(),
                self.state.score
            );
            SessionEvent::SessionComplete {
                record,
                feedback,
                new_score: self.state.score,
                data: self.session_data(),
            }
        } else {
            self.start_trial(trial_n + 1);
            SessionEvent::TrialCompleted {
                record,
                feedback,
                new_score: self.state.score,
            }
        }
    }

    fn start_trial(&mut self, trial_n: usize) {
        let isi = self.schedule.get(trial_n).unwrap_or_default();
        self.state.begin_trial(trial_n, isi);
        self.clock.start_isi_phase();
        log::debug!("Trial {} started, isi {:.1}s", trial_n, isi);
    }

    pub fn median_rt(&self) -> Option<f64> {
        self.median.current_median().ok()
    }

    /// Display scale of the stimulus for this frame: the configured scale
    /// while visible, zero otherwise.
    pub fn stimulus_scale(&self) -> f32 {
        if self.state.stimulus_visible {
            self.config.stimulus_show_scale
        } else {
            0.0
        }
    }

    pub fn session_data(&self) -> SessionData {
        SessionData {
            metadata: self.metadata.clone(),
            trials: self.recorder.records().to_vec(),
        }
    }

    /// (1-based current trial, total trials this session will run)
    pub fn trial_progress(&self) -> (usize, usize) {
        let mut total = self.schedule.len().max(1);
        if self.config.trial_limit >= 0 {
            total = total.min(self.config.trial_limit as usize + 1);
        }
        (self.state.trial_n + 1, total)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.state.feedback
    }

    pub fn is_complete(&self) -> bool {
        self.state.phase.is_terminal()
    }

    pub fn records(&self) -> &[TrialRecord] {
        self.recorder.records()
    }

    pub fn schedule(&self) -> &IsiSchedule {
        &self.schedule
    }

    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn scoring(&self) -> &ScoringPolicy {
        &self.config.scoring
    }

    pub fn clock(&self) -> &TrialClock<T> {
        &self.clock
    }
}
