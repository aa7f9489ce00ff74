// Scenario and property tests for the experience state machine.

use app_core::{Phase, PhaseController};

/// Drive a fresh controller to CandlesLit via the normal path.
fn controller_at_candles_lit() -> (PhaseController, f64) {
    let mut c = PhaseController::new();
    c.begin(0.0);
    assert_eq!(c.phase(), Phase::Listening);
    c.tick(0.0, Some(80)); // Listening -> Countdown
    assert_eq!(c.phase(), Phase::Countdown);
    c.tick(3001.0, None); // Countdown -> MorphCake
    assert_eq!(c.phase(), Phase::MorphCake);
    c.tick(7002.0, None); // MorphCake -> CandlesLit
    assert_eq!(c.phase(), Phase::CandlesLit);
    (c, 7002.0)
}

#[test]
fn amplitude_spike_starts_countdown_from_listening() {
    let mut c = PhaseController::new();
    c.begin(0.0);
    let out = c.tick(0.0, Some(80));
    assert_eq!(out.phase, Phase::Countdown);
    assert_eq!(out.progress, 0.0, "progress resets on transition");
}

#[test]
fn countdown_times_out_into_morph_cake() {
    let mut c = PhaseController::new();
    c.begin(0.0);
    c.tick(0.0, Some(80));
    let out = c.tick(3001.0, None);
    assert_eq!(out.phase, Phase::MorphCake);
    assert_eq!(out.progress, 0.0);
}

#[test]
fn blow_out_midpoint_progress() {
    let (mut c, now) = controller_at_candles_lit();
    c.tick(now, Some(200)); // CandlesLit -> BlowOut
    assert_eq!(c.phase(), Phase::BlowOut);
    let out = c.tick(now + 1000.0, None);
    assert_eq!(out.phase, Phase::BlowOut, "phase unchanged at midpoint");
    assert!(
        (out.progress - 0.5).abs() < 1e-6,
        "expected progress 0.5, got {}",
        out.progress
    );
}

#[test]
fn progress_is_monotonic_and_clamped() {
    let mut c = PhaseController::new();
    c.begin(0.0);
    c.tick(0.0, Some(80)); // Countdown starts at t=0
    let mut prev = 0.0f32;
    for t in (0..=2900).step_by(100) {
        let out = c.tick(t as f64, None);
        assert_eq!(out.phase, Phase::Countdown);
        let expected = t as f32 / 3000.0;
        assert!(
            (out.progress - expected).abs() < 1e-6,
            "progress at {t}ms: {} vs {}",
            out.progress,
            expected
        );
        assert!(out.progress >= prev, "progress decreased at {t}ms");
        prev = out.progress;
    }
    // exactly at the deadline: clamped to 1, not yet advanced
    let out = c.tick(3000.0, None);
    assert_eq!(out.phase, Phase::Countdown);
    assert_eq!(out.progress, 1.0);
}

#[test]
fn large_time_jump_advances_at_most_one_phase() {
    let mut c = PhaseController::new();
    c.begin(0.0);
    c.tick(0.0, Some(80));
    let out = c.tick(1_000_000.0, None);
    assert_eq!(out.phase, Phase::MorphCake, "only one advance per tick");
    assert_eq!(out.progress, 0.0);
    let out = c.tick(2_000_000.0, None);
    assert_eq!(out.phase, Phase::CandlesLit);
}

#[test]
fn amplitude_spike_outside_trigger_phases_is_noop() {
    let mut c = PhaseController::new();
    c.begin(0.0);
    c.tick(0.0, Some(80));
    let out = c.tick(100.0, Some(255));
    assert_eq!(out.phase, Phase::Countdown, "spike during Countdown ignored");

    let out = c.tick(3001.0, Some(255));
    assert_eq!(out.phase, Phase::MorphCake, "spike never skips a timed phase");
}

#[test]
fn amplitude_at_threshold_does_not_trigger() {
    let mut c = PhaseController::new();
    c.begin(0.0);
    let out = c.tick(0.0, Some(75));
    assert_eq!(out.phase, Phase::Listening, "threshold must be exceeded");
}

#[test]
fn idle_and_gift_open_are_fixed_points() {
    let mut c = PhaseController::new();
    for t in 0..100 {
        let out = c.tick(t as f64 * 10_000.0, Some(255));
        assert_eq!(out.phase, Phase::Idle);
    }

    let (mut c, now) = controller_at_candles_lit();
    c.tick(now, Some(200));
    c.tick(now + 2001.0, None); // BlowOut -> GiftOpen
    assert_eq!(c.phase(), Phase::GiftOpen);
    for t in 0..100 {
        let out = c.tick(now + 3000.0 + t as f64 * 10_000.0, Some(255));
        assert_eq!(out.phase, Phase::GiftOpen, "terminal phase never leaves");
        assert_eq!(out.progress, 0.0);
    }
}

#[test]
fn absent_audio_stalls_listening_gracefully() {
    let mut c = PhaseController::new();
    c.begin(0.0);
    let out = c.tick(1_000_000_000.0, None);
    assert_eq!(out.phase, Phase::Listening);
    assert_eq!(out.progress, 0.0);
}

#[test]
fn begin_only_acts_from_idle() {
    let mut c = PhaseController::new();
    c.begin(0.0);
    c.tick(0.0, Some(80));
    c.begin(100.0);
    assert_eq!(c.phase(), Phase::Countdown, "begin is a no-op mid-flight");
}

#[test]
fn manual_trigger_mirrors_the_audio_edges() {
    let mut c = PhaseController::new();
    c.begin(0.0);
    c.trigger(10.0);
    assert_eq!(c.phase(), Phase::Countdown);
    c.trigger(20.0);
    assert_eq!(c.phase(), Phase::Countdown, "no audio edge from Countdown");
}

#[test]
fn identical_sample_sequences_produce_identical_outputs() {
    let samples: Vec<(f64, Option<u8>)> = vec![
        (0.0, None),
        (16.0, Some(80)),
        (500.0, Some(10)),
        (3050.0, None),
        (7100.0, Some(255)),
        (7150.0, Some(200)),
        (9200.0, None),
    ];
    let mut a = PhaseController::new();
    let mut b = PhaseController::new();
    a.begin(0.0);
    b.begin(0.0);
    for (now, amp) in &samples {
        let oa = a.tick(*now, *amp);
        let ob = b.tick(*now, *amp);
        assert_eq!(oa, ob, "controllers diverged at t={now}");
    }
}
