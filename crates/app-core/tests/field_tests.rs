// Property tests for the particle field generation and per-frame motion.

use app_core::field::hsl_to_rgb;
use app_core::{ParticleField, Phase, ACCENT_COUNT, PARTICLE_COUNT};

fn test_field() -> ParticleField {
    ParticleField::new(PARTICLE_COUNT, ACCENT_COUNT, Some(42))
}

#[test]
fn seeded_construction_is_reproducible() {
    let a = ParticleField::new(1000, 17, Some(7));
    let b = ParticleField::new(1000, 17, Some(7));
    assert_eq!(a.galaxy_targets(), b.galaxy_targets());
    assert_eq!(a.cake_targets(), b.cake_targets());
    assert_eq!(a.scatter_dirs(), b.scatter_dirs());
    assert_eq!(a.colors(), b.colors());
}

#[test]
fn galaxy_targets_lie_in_the_spiral_band() {
    let f = test_field();
    for (i, g) in f.galaxy_targets().iter().enumerate() {
        let radius = (g.x * g.x + g.z * g.z).sqrt();
        assert!(
            (3.0 - 1e-3..=15.0 + 1e-3).contains(&radius),
            "particle {i} radius {radius} outside [3, 15]"
        );
        assert!(g.y.abs() <= 2.5 + 1e-3, "particle {i} outside height band");
    }
}

#[test]
fn cake_tier_distribution_matches_weights() {
    let f = test_field();
    let (mut bottom, mut middle, mut top) = (0usize, 0usize, 0usize);
    for c in f.cake_targets() {
        // tiers occupy disjoint height bands
        if c.y < 0.0 {
            bottom += 1;
        } else if c.y < 1.2 {
            middle += 1;
        } else {
            top += 1;
        }
    }
    let n = f.len() as f64;
    let b = bottom as f64 / n;
    let m = middle as f64 / n;
    let t = top as f64 / n;
    assert!((b - 0.40).abs() < 0.03, "bottom tier fraction {b}");
    assert!((m - 0.35).abs() < 0.03, "middle tier fraction {m}");
    assert!((t - 0.25).abs() < 0.03, "top tier fraction {t}");
}

#[test]
fn cake_targets_respect_tier_radii() {
    let f = test_field();
    for c in f.cake_targets() {
        let r = (c.x * c.x + c.z * c.z).sqrt();
        let max_r = if c.y < 0.0 {
            2.8
        } else if c.y < 1.2 {
            2.1
        } else {
            1.4
        };
        assert!(r <= max_r + 1e-3, "radius {r} exceeds tier limit {max_r}");
    }
}

#[test]
fn scatter_directions_are_unit_length() {
    let f = test_field();
    for d in f.scatter_dirs() {
        assert!((d.length() - 1.0).abs() < 1e-4, "non-unit direction {d:?}");
    }
}

#[test]
fn base_colors_stay_between_gold_and_white() {
    let f = test_field();
    for c in f.colors() {
        for ch in c {
            assert!((0.0..=1.0).contains(ch));
        }
        // red channel is the brightest of the gold gradient
        assert!(c[0] >= 0.792 - 1e-3);
        assert!(c[2] <= 0.016 + 0.3 + 1e-3);
    }
}

#[test]
fn positions_converge_on_a_static_target() {
    let mut f = ParticleField::new(500, 17, Some(3));
    // push everything well away from the cake first
    for _ in 0..50 {
        f.advance(Phase::Listening, 0.0, 0.0);
    }

    let mean_dist = |f: &ParticleField| {
        let total: f32 = f
            .positions()
            .iter()
            .zip(f.cake_targets())
            .map(|(p, t)| p.distance(*t))
            .sum();
        total / f.len() as f32
    };

    let mut prev = mean_dist(&f);
    for step in 0..20 {
        f.advance(Phase::CandlesLit, 0.0, step as f32 / 60.0);
        let d = mean_dist(&f);
        assert!(d < prev, "mean distance rose at step {step}: {prev} -> {d}");
        prev = d;
    }
    for step in 20..400 {
        f.advance(Phase::CandlesLit, 0.0, step as f32 / 60.0);
    }
    let final_dist = mean_dist(&f);
    assert!(
        final_dist < 0.02,
        "positions did not settle on the cake: mean distance {final_dist}"
    );
}

#[test]
fn point_size_tracks_the_phase_target() {
    let mut f = ParticleField::new(100, 17, Some(1));
    for step in 0..400 {
        f.advance(Phase::GiftOpen, 0.0, step as f32 / 60.0);
    }
    assert!(
        (f.point_size() - 0.07).abs() < 1e-3,
        "gift-open size {}",
        f.point_size()
    );
    for step in 0..400 {
        f.advance(Phase::CandlesLit, 0.0, step as f32 / 60.0);
    }
    assert!(
        (f.point_size() - 0.03).abs() < 1e-3,
        "settled size {}",
        f.point_size()
    );
}

#[test]
fn accents_fade_in_only_in_the_terminal_phase() {
    let mut f = ParticleField::new(100, 17, Some(9));
    for m in f.accents() {
        assert_eq!(m.scale(), 0.0, "accents start hidden");
    }

    for step in 0..100 {
        f.advance(Phase::CandlesLit, 0.0, step as f32 / 60.0);
    }
    for m in f.accents() {
        assert!(m.scale().abs() < 1e-6, "accent visible outside GiftOpen");
    }

    for step in 0..400 {
        f.advance(Phase::GiftOpen, 0.0, step as f32 / 60.0);
    }
    for m in f.accents() {
        assert!(
            (m.scale() - 1.2).abs() < 0.05,
            "accent scale {} far from target",
            m.scale()
        );
        assert!(m.intensity() >= 0.5 && m.intensity() <= 3.5);
        // drift keeps markers near their cluster home
        assert!(m.position().length() <= 3.0 + 4.0 + 0.2);
    }
}

#[test]
fn rotation_accumulates_with_countdown_boost() {
    let mut f = ParticleField::new(10, 0, Some(5));
    f.advance(Phase::Listening, 0.0, 0.0);
    let base = f.rotation_y();
    assert!((base - 0.0007).abs() < 1e-7);
    f.advance(Phase::Countdown, 1.0, 0.1);
    let boosted = f.rotation_y() - base;
    assert!((boosted - (0.0007 + 0.08)).abs() < 1e-6);
}

#[test]
fn opacity_dims_only_while_idle() {
    let mut f = ParticleField::new(10, 0, Some(5));
    f.advance(Phase::Idle, 0.0, 0.0);
    assert_eq!(f.opacity(), 0.6);
    f.advance(Phase::Listening, 0.0, 0.1);
    assert_eq!(f.opacity(), 0.85);
}

#[test]
fn raw_position_view_is_flat_xyz() {
    let mut f = ParticleField::new(64, 0, Some(2));
    f.advance(Phase::Listening, 0.0, 0.0);
    let raw = f.positions_raw();
    assert_eq!(raw.len(), f.len() * 3);
    for (i, p) in f.positions().iter().enumerate() {
        assert_eq!(raw[i * 3], p.x);
        assert_eq!(raw[i * 3 + 1], p.y);
        assert_eq!(raw[i * 3 + 2], p.z);
    }
}

#[test]
fn hue_cycle_always_yields_valid_rgb() {
    for step in -200..2000 {
        let t = step as f32 * 0.37;
        let rgb = hsl_to_rgb((t * 0.08).rem_euclid(1.0), 0.8, 0.5);
        for ch in rgb {
            assert!((0.0..=1.0).contains(&ch), "channel {ch} out of range at t={t}");
        }
    }
}

#[test]
fn material_color_changes_as_the_clock_runs() {
    let mut f = ParticleField::new(10, 0, Some(8));
    f.advance(Phase::CandlesLit, 0.0, 0.0);
    let c0 = f.material_color();
    f.advance(Phase::CandlesLit, 0.0, 3.0);
    let c1 = f.material_color();
    assert_ne!(c0, c1, "hue cycle stuck");
}
