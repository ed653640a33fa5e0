//! Calibration controller.
//!
//! `CalibrationApp` is the single owner of the filter chain, the calibration
//! session and the accuracy estimator. Every event is handled to completion
//! before the next one; the accuracy window is a deadline checked against the
//! clock on each event rather than a blocking wait.

use crate::{
    accuracy::{AccuracyEstimator, AccuracyResult},
    calibration::{CalibrationSession, ClickOutcome, MeasurementRequest, Phase, PointView},
    clock::{Clock, SystemClock},
    config::Config,
    error::Result,
    filters::chain::{ChainStats, FilterChain},
    sample::FilteredSample,
    source::GazeEvent,
};
use log::{info, warn};
use std::sync::mpsc::Receiver;

/// Discrete user commands without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Begin a calibration session
    Start,
    /// The user confirmed the instruction prompt
    ConfirmInstructions,
    /// Throw away the result and calibrate again
    Recalibrate,
    /// Accept the result and leave calibration
    Proceed,
    /// Reset every point from any phase
    ClearCalibration,
    /// Abandon a running accuracy measurement
    CancelMeasurement,
}

/// Inputs to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Gaze callback from the engine
    Gaze(GazeEvent),
    /// Click on a calibration point
    Click(String),
    /// User command
    Command(Command),
    /// Timer tick so deadlines fire without gaze traffic
    Tick,
}

/// Outputs for the rendering and reporting layers
#[derive(Debug, Clone, PartialEq)]
pub enum AppOutput {
    /// Filtered sample for live display
    Filtered(FilteredSample),
    /// Render state of every calibration point
    Points(Vec<PointView>),
    /// Clear the live scatter display
    ClearScatter,
    /// Measurement finished
    AccuracyReported(AccuracyResult),
    /// Measurement abandoned without a result
    MeasurementAbandoned,
    /// User proceeded past calibration
    Finished,
}

/// Single logical owner of all calibration state
pub struct CalibrationApp {
    chain: FilterChain,
    session: CalibrationSession,
    estimator: AccuracyEstimator,
    clock: Box<dyn Clock>,
}

impl CalibrationApp {
    /// Create a controller on the system clock
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_clock(config, Box::new(SystemClock::new()))
    }

    /// Create a controller on the given clock
    pub fn with_clock(config: &Config, clock: Box<dyn Clock>) -> Result<Self> {
        config.validate()?;
        info!(
            "Initializing calibration: {} edge points, {} ms accuracy window",
            config.calibration.edge_points, config.accuracy.window_ms
        );

        Ok(Self {
            chain: FilterChain::from_config(config),
            session: CalibrationSession::from_config(config),
            estimator: AccuracyEstimator::from_config(config),
            clock,
        })
    }

    /// The calibration session
    #[must_use]
    pub const fn session(&self) -> &CalibrationSession {
        &self.session
    }

    /// The accuracy estimator
    #[must_use]
    pub const fn estimator(&self) -> &AccuracyEstimator {
        &self.estimator
    }

    /// Filter chain counters
    #[must_use]
    pub const fn chain_stats(&self) -> ChainStats {
        self.chain.stats()
    }

    /// Handle one event and return what changed
    pub fn handle(&mut self, event: AppEvent) -> Result<Vec<AppOutput>> {
        let mut outputs = Vec::new();
        let now = self.clock.now_ms();

        // Deadlines that passed before this event fire first
        self.poll_measurement(now, &mut outputs);

        match event {
            AppEvent::Gaze(gaze) => self.on_gaze(gaze, &mut outputs),
            AppEvent::Click(id) => self.on_click(&id, now, &mut outputs)?,
            AppEvent::Command(command) => self.on_command(command, now, &mut outputs),
            AppEvent::Tick => {}
        }

        self.sync_measurement(&mut outputs);
        Ok(outputs)
    }

    /// Drain events from a single-producer channel until the sender hangs up
    pub fn run<F>(&mut self, events: &Receiver<AppEvent>, mut observer: F) -> Result<()>
    where
        F: FnMut(AppOutput),
    {
        for event in events {
            for output in self.handle(event)? {
                observer(output);
            }
        }
        info!("Event source closed");
        Ok(())
    }

    fn on_gaze(&mut self, gaze: GazeEvent, outputs: &mut Vec<AppOutput>) {
        let Some(raw) = gaze.into_sample() else {
            return;
        };
        if let Some(filtered) = self.chain.process(raw) {
            self.estimator.record(filtered);
            outputs.push(AppOutput::Filtered(filtered));
        }
    }

    fn on_click(&mut self, id: &str, now: f64, outputs: &mut Vec<AppOutput>) -> Result<()> {
        match self.session.click(id)? {
            ClickOutcome::Ignored => return Ok(()),
            ClickOutcome::MeasurementRequested(request) => self.begin_measurement(request, now, outputs),
            ClickOutcome::Counted { .. } | ClickOutcome::Calibrated { .. } => {}
        }
        outputs.push(AppOutput::Points(self.session.views()));
        Ok(())
    }

    fn on_command(&mut self, command: Command, now: f64, outputs: &mut Vec<AppOutput>) {
        let changed = match command {
            Command::Start => {
                let started = self.session.start();
                if started {
                    self.chain.reset();
                }
                started
            }
            Command::ConfirmInstructions => {
                if let Some(request) = self.session.confirm_instructions() {
                    self.begin_measurement(request, now, outputs);
                }
                true
            }
            Command::Recalibrate => {
                let reset = self.session.recalibrate();
                if reset {
                    self.chain.reset();
                    outputs.push(AppOutput::ClearScatter);
                }
                reset
            }
            Command::Proceed => {
                let done = self.session.proceed();
                if done {
                    outputs.push(AppOutput::Finished);
                }
                done
            }
            Command::ClearCalibration => {
                self.session.clear_calibration();
                self.chain.reset();
                outputs.push(AppOutput::ClearScatter);
                true
            }
            Command::CancelMeasurement => self.session.abandon_measurement().is_some(),
        };

        if changed {
            outputs.push(AppOutput::Points(self.session.views()));
        }
    }

    fn begin_measurement(&mut self, request: MeasurementRequest, now: f64, outputs: &mut Vec<AppOutput>) {
        outputs.push(AppOutput::ClearScatter);
        match self.estimator.arm(now, request.duration_ms, request.target) {
            Ok(id) => {
                self.session.bind_measurement(id);
            }
            Err(e) => warn!("Could not start accuracy measurement: {e}"),
        }
    }

    fn poll_measurement(&mut self, now: f64, outputs: &mut Vec<AppOutput>) {
        if let Some((id, result)) = self.estimator.poll(now) {
            if self.session.report_accuracy(id, result.clone()) {
                outputs.push(AppOutput::AccuracyReported(result));
                outputs.push(AppOutput::Points(self.session.views()));
            }
        }
    }

    // An estimator run the session no longer waits on is cancelled
    fn sync_measurement(&mut self, outputs: &mut Vec<AppOutput>) {
        if self.estimator.is_armed() && self.session.active_measurement() != self.estimator.active_id() {
            self.estimator.cancel();
            outputs.push(AppOutput::MeasurementAbandoned);
        }
    }

    /// Current phase of the session
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.session.phase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, constants::CENTER_POINT_ID};

    fn app() -> (CalibrationApp, ManualClock) {
        let clock = ManualClock::new();
        let app = CalibrationApp::with_clock(&Config::default(), Box::new(clock.clone())).unwrap();
        (app, clock)
    }

    fn click_all(app: &mut CalibrationApp) {
        for i in 1..=16 {
            for _ in 0..5 {
                app.handle(AppEvent::Click(format!("Pt{i}"))).unwrap();
            }
        }
        for _ in 0..5 {
            app.handle(AppEvent::Click(CENTER_POINT_ID.to_string())).unwrap();
        }
    }

    #[test]
    fn test_null_gaze_is_dropped() {
        let (mut app, _) = app();
        let outputs = app.handle(AppEvent::Gaze(GazeEvent::empty(0.0))).unwrap();
        assert!(outputs.is_empty());
        assert_eq!(app.chain_stats().received, 0);
    }

    #[test]
    fn test_measurement_reports_after_window() {
        let (mut app, clock) = app();
        app.handle(AppEvent::Command(Command::Start)).unwrap();
        click_all(&mut app);
        assert_eq!(app.phase(), Phase::CenterPending);
        assert!(!app.estimator().is_armed());

        let outputs = app.handle(AppEvent::Command(Command::ConfirmInstructions)).unwrap();
        assert!(outputs.contains(&AppOutput::ClearScatter));
        assert_eq!(app.phase(), Phase::MeasuringAccuracy);

        for i in 0..100 {
            clock.set_ms(f64::from(i) * 50.0);
            app.handle(AppEvent::Gaze(GazeEvent::new(960.0, 540.0, f64::from(i) * 50.0)))
                .unwrap();
        }

        clock.set_ms(5000.0);
        let outputs = app.handle(AppEvent::Tick).unwrap();
        let result = outputs
            .iter()
            .find_map(|o| match o {
                AppOutput::AccuracyReported(result) => Some(result.clone()),
                _ => None,
            })
            .unwrap();
        assert!(result.precision_percent > 99.0);
        assert_eq!(app.phase(), Phase::AccuracyReported);
    }

    #[test]
    fn test_cancel_abandons_run() {
        let (mut app, clock) = app();
        app.handle(AppEvent::Command(Command::Start)).unwrap();
        app.handle(AppEvent::Command(Command::ConfirmInstructions)).unwrap();
        click_all(&mut app);
        assert!(app.estimator().is_armed());

        let outputs = app.handle(AppEvent::Command(Command::CancelMeasurement)).unwrap();
        assert!(outputs.contains(&AppOutput::MeasurementAbandoned));
        assert_eq!(app.phase(), Phase::CenterPending);

        clock.set_ms(10_000.0);
        let outputs = app.handle(AppEvent::Tick).unwrap();
        assert!(outputs.is_empty());
        assert!(app.session().last_result().is_none());
    }
}
