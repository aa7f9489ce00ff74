// Shared simulation tuning constants used by the core and the native host.

// Phase timing (milliseconds)
pub const COUNTDOWN_MS: f64 = 3000.0;
pub const MORPH_CAKE_MS: f64 = 4000.0;
pub const BLOW_OUT_MS: f64 = 2000.0;

// Amplitude trigger, on the 0-255 scale of an averaged frequency spectrum
pub const AMPLITUDE_THRESHOLD: u8 = 75;

// Particle population
pub const PARTICLE_COUNT: usize = 15_000;
pub const ACCENT_COUNT: usize = 17;

// Galaxy layout
pub const GALAXY_RADIUS_MIN: f32 = 3.0; // inner edge of the spiral
pub const GALAXY_RADIUS_SPAN: f32 = 12.0; // radius in [3, 15]
pub const GALAXY_ANGLE_STEP: f32 = 0.05; // spiral winding per particle index
pub const GALAXY_ANGLE_JITTER: f32 = 4.0; // angular scatter width
pub const GALAXY_HEIGHT: f32 = 5.0; // thin vertical band, centered

// Cake tiers: max radius, height span, base y
pub const CAKE_TIER_BOTTOM_P: f32 = 0.40;
pub const CAKE_TIER_MIDDLE_P: f32 = 0.35;
pub const CAKE_TIERS: [(f32, f32, f32); 3] = [
    (2.8, 1.2, -1.2), // bottom
    (2.1, 0.9, 0.2),  // middle
    (1.4, 0.7, 1.2),  // top
];

// Height above which a cake particle counts as top-tier during BlowOut
pub const BLOW_OUT_TOP_Y: f32 = 0.8;

// Per-phase smoothing factors toward the target position
pub const LERP_GALAXY: f32 = 0.04;
pub const LERP_COUNTDOWN_EXPAND: f32 = 0.15;
pub const LERP_COUNTDOWN_COLLAPSE: f32 = 0.25;
pub const LERP_MORPH_CAKE: f32 = 0.2;
pub const LERP_CANDLES_LIT: f32 = 0.1;
pub const LERP_BLOW_OUT: f32 = 0.08;
pub const LERP_GIFT_OPEN: f32 = 0.015;

// Positional jitter (world units); Countdown scales with progress instead
pub const JITTER_BASE: f32 = 0.003;
pub const JITTER_COUNTDOWN: f32 = 0.2;

// Whole-field yaw per frame, with an extra Countdown boost
pub const ROTATION_BASE: f32 = 0.0007;
pub const ROTATION_COUNTDOWN_BOOST: f32 = 0.08;

// Point sizing, smoothed toward a phase-dependent target
pub const POINT_SIZE_BASE: f32 = 0.03;
pub const POINT_SIZE_COUNTDOWN_SPAN: f32 = 0.15;
pub const POINT_SIZE_GIFT_OPEN: f32 = 0.07;
pub const POINT_SIZE_SMOOTHING: f32 = 0.05;

// Material opacity is dimmed before the experience starts
pub const OPACITY_IDLE: f32 = 0.6;
pub const OPACITY_ACTIVE: f32 = 0.85;

// Material hue cycles once per 1/0.08 seconds
pub const HUE_CYCLE_RATE: f32 = 0.08;

// Particle base palette: gold lerped toward white by up to 30%
pub const COLOR_GOLD: [f32; 3] = [0.792, 0.541, 0.016]; // #ca8a04
pub const COLOR_WHITE_MIX_MAX: f32 = 0.3;

// Accent marker cluster and animation
pub const ACCENT_RADIUS_MIN: f32 = 3.0;
pub const ACCENT_RADIUS_SPAN: f32 = 4.0;
pub const ACCENT_SCALE_VISIBLE: f32 = 1.2; // target scale in the terminal phase
pub const ACCENT_SCALE_SMOOTHING: f32 = 0.05;
pub const ACCENT_DRIFT: f32 = 0.1;

// Vivid rainbow palette cycled across accent markers
pub const ACCENT_PALETTE: [[f32; 3]; 7] = [
    [1.0, 0.0, 0.0],     // red
    [1.0, 0.498, 0.0],   // orange
    [1.0, 1.0, 0.0],     // yellow
    [0.0, 1.0, 0.0],     // green
    [0.0, 0.0, 1.0],     // blue
    [0.294, 0.0, 0.510], // indigo
    [0.580, 0.0, 0.827], // violet
];
