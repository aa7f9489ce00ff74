//! Particle field simulation.
//!
//! All per-particle shape data (galaxy and cake targets, scatter
//! directions, base colors) is generated once at construction and never
//! changes; `advance` only rewrites current positions and the handful of
//! global material values. The field performs no I/O and cannot fail.

use glam::Vec3;
use rand::prelude::*;

use crate::constants::*;
use crate::phase::Phase;

/// One of the independently animated highlight markers that appear in the
/// terminal phase, orbiting a fixed cluster home with a slow drift.
#[derive(Clone, Debug)]
pub struct AccentMarker {
    home: Vec3,
    position: Vec3,
    color: [f32; 3],
    scale: f32,
    intensity: f32,
}

impl AccentMarker {
    pub fn position(&self) -> Vec3 {
        self.position
    }
    pub fn color(&self) -> [f32; 3] {
        self.color
    }
    /// Current scale factor; 0 while hidden, easing toward
    /// [`ACCENT_SCALE_VISIBLE`] in the terminal phase.
    pub fn scale(&self) -> f32 {
        self.scale
    }
    /// Glow strength for the host's light source, pulsing over time.
    pub fn intensity(&self) -> f32 {
        self.intensity
    }
}

/// Owned state of the particle animation.
///
/// Construct once, then call [`ParticleField::advance`] with the current
/// phase controller output every frame. Outputs are read back through the
/// accessor methods; positions are laid out as a flat run of three floats
/// per particle when viewed through [`ParticleField::positions_raw`].
pub struct ParticleField {
    galaxy: Vec<Vec3>,
    cake: Vec<Vec3>,
    scatter: Vec<Vec3>,
    colors: Vec<[f32; 3]>,
    positions: Vec<Vec3>,
    accents: Vec<AccentMarker>,
    rng: StdRng,
    material_color: [f32; 3],
    point_size: f32,
    opacity: f32,
    rotation_y: f32,
}

impl ParticleField {
    /// Generate all fixed per-particle attributes. Pass a seed for
    /// reproducible layouts (tests); `None` draws one from the thread RNG.
    pub fn new(particle_count: usize, accent_count: usize, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
        let mut rng = StdRng::seed_from_u64(seed);
        log::info!(
            "generating particle field: {} particles, {} accents, seed {}",
            particle_count,
            accent_count,
            seed
        );

        let mut galaxy = Vec::with_capacity(particle_count);
        let mut cake = Vec::with_capacity(particle_count);
        let mut scatter = Vec::with_capacity(particle_count);
        let mut colors = Vec::with_capacity(particle_count);

        for i in 0..particle_count {
            galaxy.push(galaxy_target(i, &mut rng));
            cake.push(cake_target(&mut rng));
            scatter.push(unit_sphere_dir(&mut rng));

            let mix = rng.gen::<f32>() * COLOR_WHITE_MIX_MAX;
            colors.push([
                COLOR_GOLD[0] + (1.0 - COLOR_GOLD[0]) * mix,
                COLOR_GOLD[1] + (1.0 - COLOR_GOLD[1]) * mix,
                COLOR_GOLD[2] + (1.0 - COLOR_GOLD[2]) * mix,
            ]);
        }

        let accents = (0..accent_count)
            .map(|i| {
                let r = ACCENT_RADIUS_MIN + rng.gen::<f32>() * ACCENT_RADIUS_SPAN;
                let home = unit_sphere_dir(&mut rng) * r;
                AccentMarker {
                    home,
                    position: home,
                    color: ACCENT_PALETTE[i % ACCENT_PALETTE.len()],
                    scale: 0.0,
                    intensity: 0.0,
                }
            })
            .collect();

        Self {
            galaxy,
            cake,
            scatter,
            colors,
            positions: vec![Vec3::ZERO; particle_count],
            accents,
            rng,
            material_color: COLOR_GOLD,
            point_size: POINT_SIZE_BASE,
            opacity: OPACITY_IDLE,
            rotation_y: 0.0,
        }
    }

    /// Step every particle toward its phase-appropriate target and refresh
    /// the global material values. `time_sec` is the elapsed scene clock.
    pub fn advance(&mut self, phase: Phase, progress: f32, time_sec: f32) {
        for i in 0..self.positions.len() {
            let (target, lerp_speed) = self.target_for(i, phase, progress, time_sec);
            let pos = self.positions[i].lerp(target, lerp_speed);

            let jitter = if phase == Phase::Countdown {
                progress * JITTER_COUNTDOWN
            } else {
                JITTER_BASE
            };
            self.positions[i] = pos
                + Vec3::new(
                    (self.rng.gen::<f32>() - 0.5) * jitter,
                    (self.rng.gen::<f32>() - 0.5) * jitter,
                    (self.rng.gen::<f32>() - 0.5) * jitter,
                );
        }

        self.material_color = hsl_to_rgb((time_sec * HUE_CYCLE_RATE).rem_euclid(1.0), 0.8, 0.5);

        let size_target = match phase {
            Phase::Countdown => POINT_SIZE_BASE + progress * POINT_SIZE_COUNTDOWN_SPAN,
            Phase::GiftOpen => POINT_SIZE_GIFT_OPEN,
            _ => POINT_SIZE_BASE,
        };
        self.point_size += (size_target - self.point_size) * POINT_SIZE_SMOOTHING;
        self.opacity = if phase == Phase::Idle {
            OPACITY_IDLE
        } else {
            OPACITY_ACTIVE
        };

        let boost = if phase == Phase::Countdown {
            progress * ROTATION_COUNTDOWN_BOOST
        } else {
            0.0
        };
        self.rotation_y += ROTATION_BASE + boost;

        for (i, m) in self.accents.iter_mut().enumerate() {
            let scale_target = if phase == Phase::GiftOpen {
                ACCENT_SCALE_VISIBLE
            } else {
                0.0
            };
            m.scale += (scale_target - m.scale) * ACCENT_SCALE_SMOOTHING;

            let k = i as f32;
            m.position = m.home
                + Vec3::new(
                    (time_sec * 0.2 + k * 0.5).sin(),
                    (time_sec * 0.15 + k * 0.5).cos(),
                    (time_sec * 0.25 + k * 0.5).sin(),
                ) * ACCENT_DRIFT;
            m.intensity = 2.0 + (time_sec * 2.0 + k).sin() * 1.5;
        }
    }

    /// Per-phase target position and smoothing factor for particle `i`.
    fn target_for(&self, i: usize, phase: Phase, progress: f32, time_sec: f32) -> (Vec3, f32) {
        let g = self.galaxy[i];
        let c = self.cake[i];
        let d = self.scatter[i];
        let k = i as f32;

        match phase {
            Phase::Idle | Phase::Listening => {
                // gentle breathing along x only
                let breathe = 1.0 + (time_sec * 0.4 + k * 0.001).sin() * 0.05;
                (Vec3::new(g.x * breathe, g.y, g.z), LERP_GALAXY)
            }
            Phase::Countdown => {
                if progress < 0.3 {
                    // outward expansion, scale 1 -> 4
                    let expand = 1.0 + (progress / 0.3) * 3.0;
                    (g * expand, LERP_COUNTDOWN_EXPAND)
                } else {
                    // accelerating collapse toward the origin
                    let shrink = 1.0 - ((progress - 0.3) / 0.7).powf(1.5);
                    (g * 4.0 * shrink, LERP_COUNTDOWN_COLLAPSE)
                }
            }
            Phase::MorphCake => (c * progress, LERP_MORPH_CAKE),
            Phase::CandlesLit => (c, LERP_CANDLES_LIT),
            Phase::BlowOut => {
                // top tier scatters three times as hard as the rest
                let factor = if c.y > BLOW_OUT_TOP_Y { 1.5 } else { 0.5 };
                let target = Vec3::new(
                    c.x + d.x * progress * 4.0 * factor,
                    c.y + progress * 6.0 * factor + (time_sec * 3.0 + k).sin() * 0.3,
                    c.z + d.z * progress * 4.0 * factor,
                );
                (target, LERP_BLOW_OUT)
            }
            Phase::GiftOpen => {
                let drift = 1.5 + (time_sec * 0.2).sin() * 0.2;
                let target = Vec3::new(
                    c.x * drift + d.x * 4.0,
                    c.y * drift + (time_sec * 0.3 + k * 0.01).cos() * 2.0,
                    c.z * drift + d.z * 4.0,
                );
                (target, LERP_GIFT_OPEN)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Positions as a flat `[x, y, z, x, y, z, ..]` float slice for upload.
    pub fn positions_raw(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    pub fn accents(&self) -> &[AccentMarker] {
        &self.accents
    }

    pub fn galaxy_targets(&self) -> &[Vec3] {
        &self.galaxy
    }

    pub fn cake_targets(&self) -> &[Vec3] {
        &self.cake
    }

    pub fn scatter_dirs(&self) -> &[Vec3] {
        &self.scatter
    }

    pub fn material_color(&self) -> [f32; 3] {
        self.material_color
    }

    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Accumulated whole-field yaw in radians.
    pub fn rotation_y(&self) -> f32 {
        self.rotation_y
    }
}

/// Logarithmic-spiral-like galaxy position for particle `i`: radius in
/// [3, 15], winding angle with heavy jitter, thin vertical band.
fn galaxy_target(i: usize, rng: &mut StdRng) -> Vec3 {
    let radius = GALAXY_RADIUS_MIN + rng.gen::<f32>() * GALAXY_RADIUS_SPAN;
    let angle = i as f32 * GALAXY_ANGLE_STEP + (rng.gen::<f32>() - 0.5) * GALAXY_ANGLE_JITTER;
    Vec3::new(
        angle.cos() * radius,
        (rng.gen::<f32>() - 0.5) * GALAXY_HEIGHT,
        angle.sin() * radius,
    )
}

/// Cake position: pick one of three stacked disk tiers (40/35/25 split),
/// then a uniform point inside that tier's disk at a random height.
fn cake_target(rng: &mut StdRng) -> Vec3 {
    let tier = rng.gen::<f32>();
    let (max_r, h_span, y_base) = if tier < CAKE_TIER_BOTTOM_P {
        CAKE_TIERS[0]
    } else if tier < CAKE_TIER_BOTTOM_P + CAKE_TIER_MIDDLE_P {
        CAKE_TIERS[1]
    } else {
        CAKE_TIERS[2]
    };
    // sqrt for area-uniform radial density
    let r = max_r * rng.gen::<f32>().sqrt();
    let phi = rng.gen::<f32>() * std::f32::consts::TAU;
    Vec3::new(
        phi.cos() * r,
        y_base + rng.gen::<f32>() * h_span,
        phi.sin() * r,
    )
}

/// Uniformly distributed unit vector on the sphere.
fn unit_sphere_dir(rng: &mut StdRng) -> Vec3 {
    let theta = rng.gen::<f32>() * std::f32::consts::TAU;
    let zeta = (2.0 * rng.gen::<f32>() - 1.0).acos();
    Vec3::new(
        zeta.sin() * theta.cos(),
        zeta.sin() * theta.sin(),
        zeta.cos(),
    )
}

/// HSL to RGB, all channels in [0, 1]. Hue wraps.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let h = h.rem_euclid(1.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h * 6.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    [r + m, g + m, b + m]
}
