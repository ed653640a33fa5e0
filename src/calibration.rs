//! Calibration session state machine.
//!
//! The user clicks each edge target a fixed number of times while looking at
//! it. Once every edge target is calibrated the centre target appears; once
//! that is calibrated too, and the user has confirmed the instructions, the
//! session asks for an accuracy measurement at the centre.

use crate::{
    accuracy::{AccuracyResult, MeasurementId},
    config::{CalibrationConfig, Config},
    constants::CENTER_POINT_ID,
    sample::Viewport,
    Error, Result,
};
use log::{debug, info, warn};
use nalgebra::Point2;
use serde::Serialize;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Not started
    Idle,
    /// Edge targets still need clicks
    PointsPending,
    /// Edge targets done; centre target pending or waiting for confirmation
    CenterPending,
    /// Accuracy window running
    MeasuringAccuracy,
    /// Accuracy known; waiting for proceed or recalibrate
    AccuracyReported,
    /// User proceeded past calibration
    Finished,
}

/// Fill colour of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PointColor {
    /// Not yet calibrated, or the centre target
    Red,
    /// Calibrated edge target
    Yellow,
}

/// One on-screen calibration target
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationPoint {
    id: String,
    click_count: u32,
    calibrated: bool,
    visible: bool,
    opacity: f64,
    color: PointColor,
}

impl CalibrationPoint {
    fn new(id: impl Into<String>, opacity: f64) -> Self {
        Self {
            id: id.into(),
            click_count: 0,
            calibrated: false,
            visible: false,
            opacity,
            color: PointColor::Red,
        }
    }

    fn reset(&mut self, opacity: f64, visible: bool) {
        self.click_count = 0;
        self.calibrated = false;
        self.visible = visible;
        self.opacity = opacity;
        self.color = PointColor::Red;
    }

    /// Point identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Clicks received so far
    #[must_use]
    pub const fn click_count(&self) -> u32 {
        self.click_count
    }

    /// Whether the point has all its clicks
    #[must_use]
    pub const fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    /// Whether this is the centre target
    #[must_use]
    pub fn is_center(&self) -> bool {
        self.id == CENTER_POINT_ID
    }
}

/// What the rendering layer needs to draw one target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointView {
    /// Point identifier
    pub id: String,
    /// Opacity in `[0, 1]`
    pub opacity: f64,
    /// Locked against further clicks after calibration
    pub locked: bool,
    /// Displayed at all
    pub visible: bool,
    /// Clicks currently count toward calibration
    pub interactive: bool,
    /// Fill colour
    pub color: PointColor,
}

/// Request to arm the accuracy estimator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementRequest {
    /// Fixation target (centre point position)
    pub target: Point2<f64>,
    /// Window length in milliseconds
    pub duration_ms: f64,
}

/// Result of a click on a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickOutcome {
    /// Click did not count (locked, hidden or wrong phase)
    Ignored,
    /// Click counted; the point needs more
    Counted {
        /// Clicks on this point so far
        clicks: u32,
    },
    /// Point just became calibrated
    Calibrated {
        /// Calibrated points in the session
        calibrated_count: usize,
    },
    /// Last point calibrated with instructions confirmed; measure now
    MeasurementRequested(MeasurementRequest),
}

/// Calibration session owning point state and phase
pub struct CalibrationSession {
    config: CalibrationConfig,
    target: Point2<f64>,
    window_ms: f64,
    points: Vec<CalibrationPoint>,
    calibrated_count: usize,
    phase: Phase,
    instructions_confirmed: bool,
    active_measurement: Option<MeasurementId>,
    last_result: Option<AccuracyResult>,
}

impl CalibrationSession {
    /// Create an idle session with `config.edge_points` edge targets and one
    /// centre target at the viewport centre
    #[must_use]
    pub fn new(config: CalibrationConfig, viewport: Viewport, window_ms: f64) -> Self {
        let mut points: Vec<CalibrationPoint> = (1..=config.edge_points)
            .map(|i| CalibrationPoint::new(format!("Pt{i}"), config.base_opacity))
            .collect();
        points.push(CalibrationPoint::new(CENTER_POINT_ID, config.base_opacity));

        Self {
            config,
            target: viewport.center(),
            window_ms,
            points,
            calibrated_count: 0,
            phase: Phase::Idle,
            instructions_confirmed: false,
            active_measurement: None,
            last_result: None,
        }
    }

    /// Create a session from the application configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.calibration.clone(), config.viewport, config.accuracy.window_ms)
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of calibrated points
    #[must_use]
    pub const fn calibrated_count(&self) -> usize {
        self.calibrated_count
    }

    /// Total number of points, centre included
    #[must_use]
    pub fn total_points(&self) -> usize {
        self.points.len()
    }

    /// Whether the instruction prompt has been confirmed
    #[must_use]
    pub const fn instructions_confirmed(&self) -> bool {
        self.instructions_confirmed
    }

    /// Measurement run the session is waiting on
    #[must_use]
    pub const fn active_measurement(&self) -> Option<MeasurementId> {
        self.active_measurement
    }

    /// Most recent accepted accuracy result
    #[must_use]
    pub const fn last_result(&self) -> Option<&AccuracyResult> {
        self.last_result.as_ref()
    }

    /// All points, edge targets first
    #[must_use]
    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    /// Look up a point by id
    #[must_use]
    pub fn point(&self, id: &str) -> Option<&CalibrationPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    /// Fixation target of the accuracy measurement
    #[must_use]
    pub const fn target(&self) -> Point2<f64> {
        self.target
    }

    fn edge_points(&self) -> usize {
        self.config.edge_points
    }

    fn is_interactive(&self, point: &CalibrationPoint) -> bool {
        if !point.visible || point.calibrated {
            return false;
        }
        match self.phase {
            Phase::PointsPending => !point.is_center(),
            Phase::CenterPending => true,
            _ => false,
        }
    }

    /// Render state of every point
    #[must_use]
    pub fn views(&self) -> Vec<PointView> {
        self.points
            .iter()
            .map(|p| PointView {
                id: p.id.clone(),
                opacity: p.opacity,
                locked: p.calibrated,
                visible: p.visible,
                interactive: self.is_interactive(p),
                color: p.color,
            })
            .collect()
    }

    fn opacity_for(&self, clicks: u32) -> f64 {
        if clicks >= self.config.clicks_per_point {
            1.0
        } else {
            (self.config.base_opacity + self.config.opacity_step * f64::from(clicks)).min(1.0)
        }
    }

    fn set_visibility(&mut self, edges: bool, center: bool) {
        for point in &mut self.points {
            point.visible = if point.is_center() { center } else { edges };
        }
    }

    fn reset_points(&mut self, opacity: f64) {
        for point in &mut self.points {
            point.reset(opacity, true);
        }
        self.calibrated_count = 0;
        self.active_measurement = None;
        self.last_result = None;
    }

    fn transition(&mut self, phase: Phase) {
        if self.phase != phase {
            info!("Calibration phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }

    /// Start calibrating: every point unclicked, edge targets shown, centre hidden
    ///
    /// Only valid from `Idle` or `Finished`.
    pub fn start(&mut self) -> bool {
        if !matches!(self.phase, Phase::Idle | Phase::Finished) {
            warn!("Ignoring start while calibration is {:?}", self.phase);
            return false;
        }
        self.begin_points_pending();
        true
    }

    fn begin_points_pending(&mut self) {
        self.reset_points(self.config.base_opacity);
        self.set_visibility(true, false);
        self.transition(Phase::PointsPending);
    }

    /// Record the user's confirmation of the instruction prompt and re-evaluate
    pub fn confirm_instructions(&mut self) -> Option<MeasurementRequest> {
        if !self.instructions_confirmed {
            info!("Calibration instructions confirmed");
        }
        self.instructions_confirmed = true;
        self.evaluate()
    }

    /// Enter accuracy measurement if every point is calibrated and the
    /// instructions were confirmed
    pub fn evaluate(&mut self) -> Option<MeasurementRequest> {
        if self.phase != Phase::CenterPending || self.calibrated_count < self.total_points() {
            return None;
        }
        if !self.instructions_confirmed {
            info!("All points calibrated; waiting for instruction confirmation");
            return None;
        }

        self.set_visibility(false, true);
        if let Some(center) = self.points.iter_mut().find(|p| p.is_center()) {
            center.opacity = 1.0;
        }
        self.transition(Phase::MeasuringAccuracy);
        Some(MeasurementRequest {
            target: self.target,
            duration_ms: self.window_ms,
        })
    }

    /// Click a point by id
    pub fn click(&mut self, id: &str) -> Result<ClickOutcome> {
        let index = self
            .points
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::UnknownPoint(id.to_string()))?;

        if !self.is_interactive(&self.points[index]) {
            debug!("Ignoring click on {id} during {:?}", self.phase);
            return Ok(ClickOutcome::Ignored);
        }

        let clicks = self.points[index].click_count + 1;
        let opacity = self.opacity_for(clicks);
        let required = self.config.clicks_per_point;
        let point = &mut self.points[index];
        point.click_count = clicks;
        point.opacity = opacity;

        if clicks < required {
            return Ok(ClickOutcome::Counted { clicks });
        }

        point.calibrated = true;
        if !point.is_center() {
            point.color = PointColor::Yellow;
        }
        self.calibrated_count += 1;
        info!(
            "Point {id} calibrated ({}/{})",
            self.calibrated_count,
            self.total_points()
        );

        if self.phase == Phase::PointsPending && self.calibrated_count == self.edge_points() {
            self.set_visibility(true, true);
            self.transition(Phase::CenterPending);
        }

        Ok(self.evaluate().map_or(
            ClickOutcome::Calibrated {
                calibrated_count: self.calibrated_count,
            },
            ClickOutcome::MeasurementRequested,
        ))
    }

    /// Attach the estimator run started for the current measurement
    pub fn bind_measurement(&mut self, id: MeasurementId) -> bool {
        if self.phase != Phase::MeasuringAccuracy || self.active_measurement.is_some() {
            return false;
        }
        self.active_measurement = Some(id);
        true
    }

    /// Accept a finished measurement; results from stale runs are discarded
    pub fn report_accuracy(&mut self, id: MeasurementId, result: AccuracyResult) -> bool {
        if self.phase != Phase::MeasuringAccuracy || self.active_measurement != Some(id) {
            warn!("Discarding accuracy result from inactive run {}", id.value());
            return false;
        }
        info!("Accuracy reported: {result}");
        self.active_measurement = None;
        self.last_result = Some(result);
        self.set_visibility(false, false);
        self.transition(Phase::AccuracyReported);
        true
    }

    /// Abandon a running measurement; the session returns to `CenterPending`
    /// with every point still calibrated
    pub fn abandon_measurement(&mut self) -> Option<MeasurementId> {
        if self.phase != Phase::MeasuringAccuracy {
            return None;
        }
        let id = self.active_measurement.take();
        self.set_visibility(true, true);
        self.transition(Phase::CenterPending);
        id
    }

    /// Accept the accuracy and leave calibration
    pub fn proceed(&mut self) -> bool {
        if self.phase != Phase::AccuracyReported {
            return false;
        }
        self.transition(Phase::Finished);
        true
    }

    /// Discard the accuracy and calibrate again from the first point
    pub fn recalibrate(&mut self) -> bool {
        if self.phase != Phase::AccuracyReported {
            return false;
        }
        self.begin_points_pending();
        true
    }

    /// Full reset from any phase: every point unclicked, visible, unlocked and
    /// red at the reset opacity
    pub fn clear_calibration(&mut self) {
        self.reset_points(self.config.reset_opacity);
        self.transition(Phase::PointsPending);
    }
}
