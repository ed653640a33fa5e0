//! End-to-end tests driving the calibration controller


use gaze_calibration::{
    accuracy::{AccuracyEstimator, AccuracyResult},
    app::{AppEvent, AppOutput, CalibrationApp, Command},
    calibration::{Phase, PointColor},
    clock::ManualClock,
    config::Config,
    constants::CENTER_POINT_ID,
    filters::chain::FilterChain,
    source::GazeEvent,
};
use nalgebra::Point2;
use std::{sync::mpsc, thread};
use test_helpers::{calibrate_app, calibration_clicks, fixation, scattered};

fn app_with_clock() -> (CalibrationApp, ManualClock) {
    let clock = ManualClock::new();
    let app = CalibrationApp::with_clock(&Config::default(), Box::new(clock.clone())).unwrap();
    (app, clock)
}

fn reported(outputs: &[AppOutput]) -> Option<AccuracyResult> {
    outputs.iter().find_map(|o| match o {
        AppOutput::AccuracyReported(result) => Some(result.clone()),
        _ => None,
    })
}

/// Calibrate, confirm, feed a recorded stream and close the window
fn measure(samples: &[gaze_calibration::sample::GazeSample]) -> AccuracyResult {
    let (mut app, clock) = app_with_clock();
    app.handle(AppEvent::Command(Command::Start)).unwrap();
    calibrate_app(&mut app).unwrap();
    app.handle(AppEvent::Command(Command::ConfirmInstructions)).unwrap();
    assert_eq!(app.phase(), Phase::MeasuringAccuracy);

    for sample in samples {
        clock.set_ms(sample.timestamp);
        let outputs = app
            .handle(AppEvent::Gaze(GazeEvent::new(sample.x, sample.y, sample.timestamp)))
            .unwrap();
        assert!(reported(&outputs).is_none(), "Window closed early");
    }

    clock.set_ms(5000.0);
    let outputs = app.handle(AppEvent::Tick).unwrap();
    assert_eq!(app.phase(), Phase::AccuracyReported);
    reported(&outputs).expect("Accuracy should be reported once the window elapsed")
}

#[test]
fn test_full_calibration_on_target() {
    let result = measure(&fixation(960.0, 540.0, 100, 50.0));
    assert_eq!(result.sample_count, 50);
    assert!(result.precision_percent > 99.0, "Got {result}");
}

#[test]
fn test_offset_fixation_scores_lower() {
    // A steady 40 unit offset is inside the proximity gate
    let result = measure(&fixation(1000.0, 540.0, 100, 50.0));
    assert_eq!(result.sample_count, 50);
    let expected = 100.0 * (1.0 - 40.0 / 540.0);
    assert!((result.precision_percent - expected).abs() < 1e-6, "Got {result}");
}

#[test]
fn test_scattered_samples_score_lower() {
    let target = Point2::new(960.0, 540.0);
    let config = Config::default();

    let mut estimator = AccuracyEstimator::from_config(&config);
    let on_target = estimator
        .run(5000.0, target, fixation(960.0, 540.0, 100, 50.0))
        .unwrap();

    // Every corner of the ±200 square is within 283 units, so each sample
    // scores at least 47%
    let mut estimator = AccuracyEstimator::from_config(&config);
    let noisy = estimator
        .run(5000.0, target, scattered(960.0, 540.0, 200.0, 100, 50.0, 42))
        .unwrap();

    assert_eq!(on_target.sample_count, 50);
    assert_eq!(noisy.sample_count, 50);
    assert!(
        noisy.precision_percent > 40.0 && noisy.precision_percent < 90.0,
        "Scattered samples scored {noisy}"
    );
    assert!(noisy.precision_percent < on_target.precision_percent - 10.0);
    assert!(noisy.statistics.unwrap().spread() > 100.0);
}

#[test]
fn test_scattered_raw_stream_is_gated() {
    // At 50 ms spacing a ±200 scatter is far above the velocity ceiling
    let mut chain = FilterChain::from_config(&Config::default());
    let emitted = u64::try_from(
        scattered(960.0, 540.0, 200.0, 100, 50.0, 42)
        .into_iter()
        .filter_map(|s| chain.process(s))
        .count(),
    )
    .unwrap();

    let stats = chain.stats();
    assert_eq!(stats.received, 100);
    assert!(stats.velocity_rejected > 90, "Only {} velocity rejections", stats.velocity_rejected);
    assert_eq!(emitted, stats.emitted);
}

#[test]
fn test_live_feedback_and_point_layout() {
    let (mut app, _clock) = app_with_clock();

    let outputs = app.handle(AppEvent::Command(Command::Start)).unwrap();
    let Some(AppOutput::Points(views)) = outputs.last() else {
        panic!("Start should publish the point layout");
    };
    assert_eq!(views.len(), 17);
    let center = views.iter().find(|v| v.id == CENTER_POINT_ID).unwrap();
    assert!(!center.visible);
    assert!(views.iter().filter(|v| v.id != CENTER_POINT_ID).all(|v| v.visible && v.interactive));

    // Filtered samples are published outside of measurement too
    let outputs = app.handle(AppEvent::Gaze(GazeEvent::new(965.0, 540.0, 0.0))).unwrap();
    assert!(matches!(outputs.as_slice(), [AppOutput::Filtered(_)]));
    assert_eq!(app.estimator().buffered(), 0);

    // Null readings never reach the chain
    let outputs = app.handle(AppEvent::Gaze(GazeEvent::empty(16.0))).unwrap();
    assert!(outputs.is_empty());
    assert_eq!(app.chain_stats().received, 1);
}

#[test]
fn test_edge_point_colours_and_centre_reveal() {
    let (mut app, _clock) = app_with_clock();
    app.handle(AppEvent::Command(Command::Start)).unwrap();

    // The centre ignores clicks until every edge point is done
    let outputs = app.handle(AppEvent::Click(CENTER_POINT_ID.to_string())).unwrap();
    assert!(outputs.is_empty());

    for event in calibration_clicks().into_iter().take(16 * 5) {
        app.handle(event).unwrap();
    }
    assert_eq!(app.phase(), Phase::CenterPending);

    let session = app.session();
    for point in session.points().iter().filter(|p| !p.is_center()) {
        assert!(point.is_calibrated());
    }
    let views = session.views();
    assert!(views
        .iter()
        .filter(|v| v.id != CENTER_POINT_ID)
        .all(|v| v.color == PointColor::Yellow && v.locked));
    let center = views.iter().find(|v| v.id == CENTER_POINT_ID).unwrap();
    assert!(center.visible && center.interactive);
    assert_eq!(center.color, PointColor::Red);
}

#[test]
fn test_recalibrate_and_proceed() {
    let (mut app, clock) = app_with_clock();
    app.handle(AppEvent::Command(Command::Start)).unwrap();
    app.handle(AppEvent::Command(Command::ConfirmInstructions)).unwrap();
    calibrate_app(&mut app).unwrap();
    assert_eq!(app.phase(), Phase::MeasuringAccuracy);

    clock.set_ms(5000.0);
    let outputs = app.handle(AppEvent::Tick).unwrap();
    assert_eq!(reported(&outputs).unwrap().precision_percent, 0.0);

    // Recalibrating clears the scatter and starts over
    let outputs = app.handle(AppEvent::Command(Command::Recalibrate)).unwrap();
    assert!(outputs.contains(&AppOutput::ClearScatter));
    assert_eq!(app.phase(), Phase::PointsPending);
    assert_eq!(app.session().calibrated_count(), 0);
    assert!(app.session().last_result().is_none());

    // Confirmation carries over, so the last centre click starts measuring
    calibrate_app(&mut app).unwrap();
    assert_eq!(app.phase(), Phase::MeasuringAccuracy);

    clock.set_ms(10_000.0);
    app.handle(AppEvent::Tick).unwrap();
    assert_eq!(app.phase(), Phase::AccuracyReported);

    let outputs = app.handle(AppEvent::Command(Command::Proceed)).unwrap();
    assert!(outputs.contains(&AppOutput::Finished));
    assert_eq!(app.phase(), Phase::Finished);

    // A finished session can be started again
    app.handle(AppEvent::Command(Command::Start)).unwrap();
    assert_eq!(app.phase(), Phase::PointsPending);
}

#[test]
fn test_clear_calibration_abandons_measurement() {
    let (mut app, clock) = app_with_clock();
    app.handle(AppEvent::Command(Command::Start)).unwrap();
    calibrate_app(&mut app).unwrap();
    app.handle(AppEvent::Command(Command::ConfirmInstructions)).unwrap();
    assert!(app.estimator().is_armed());

    let outputs = app.handle(AppEvent::Command(Command::ClearCalibration)).unwrap();
    assert!(outputs.contains(&AppOutput::ClearScatter));
    assert!(outputs.contains(&AppOutput::MeasurementAbandoned));
    assert!(!app.estimator().is_armed());
    assert_eq!(app.phase(), Phase::PointsPending);

    let views = app.session().views();
    assert!(views.iter().all(|v| v.visible && !v.locked && v.color == PointColor::Red));
    assert!(views.iter().all(|v| (v.opacity - 0.2).abs() < 1e-9));

    // The old deadline passing produces nothing
    clock.set_ms(6000.0);
    assert!(app.handle(AppEvent::Tick).unwrap().is_empty());
    assert!(app.session().last_result().is_none());
}

#[test]
fn test_unknown_point_is_an_error() {
    let (mut app, _clock) = app_with_clock();
    app.handle(AppEvent::Command(Command::Start)).unwrap();
    assert!(app.handle(AppEvent::Click("Pt99".to_string())).is_err());
    // The session is unaffected
    assert_eq!(app.phase(), Phase::PointsPending);
}

#[test]
fn test_run_over_channel() {
    let (mut app, clock) = app_with_clock();
    let (tx, rx) = mpsc::channel();

    let producer = thread::spawn(move || {
        tx.send(AppEvent::Command(Command::Start)).unwrap();
        tx.send(AppEvent::Command(Command::ConfirmInstructions)).unwrap();
        for event in calibration_clicks() {
            tx.send(event).unwrap();
        }
        for sample in fixation(960.0, 540.0, 100, 50.0) {
            tx.send(AppEvent::Gaze(GazeEvent::new(sample.x, sample.y, sample.timestamp)))
                .unwrap();
        }
        tx.send(AppEvent::Tick).unwrap();
    });

    // Time follows the stream: after each filtered sample the clock moves to
    // the next sample's timestamp
    let mut results = Vec::new();
    let mut filtered = 0;
    app.run(&rx, |output| match output {
        AppOutput::Filtered(sample) => {
            filtered += 1;
            clock.set_ms(sample.timestamp + 50.0);
        }
        AppOutput::AccuracyReported(result) => results.push(result),
        _ => {}
    })
    .unwrap();
    producer.join().unwrap();

    assert_eq!(filtered, 100);
    assert_eq!(results.len(), 1);
    assert!(results[0].precision_percent > 99.0);
    assert_eq!(app.phase(), Phase::AccuracyReported);
}
