//! Numeric thresholds of the SO(3) logarithm map.

/// Angles below this are treated as zero rotation in the exponential map.
pub const EXP_ZERO_ANGLE_THRESHOLD: f64 = 1e-20;

/// Default angle below which θ/sin θ is replaced by its Taylor expansion.
pub const LOG_ZERO_ANGLE_THRESHOLD: f64 = 1e-20;

/// Default distance of cos θ from -1 below which the near-π branch is used.
pub const LOG_PI_COS_TOLERANCE: f64 = 1e-5;

/// Configuration of the branch selection in [`so3_log`](super::so3::so3_log).
///
/// # Example
/// ```
/// use relie::lie::LogMapConfig;
///
/// let config = LogMapConfig::new().with_pi_cos_tolerance(1e-6);
/// assert_eq!(config.pi_cos_tolerance, 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogMapConfig {
    /// θ below this uses ratio = 1 + θ²/6 instead of θ / sin θ
    pub zero_angle_threshold: f64,
    /// cos θ < -1 + tolerance switches to the near-π reconstruction
    pub pi_cos_tolerance: f64,
}

impl Default for LogMapConfig {
    fn default() -> Self {
        Self {
            zero_angle_threshold: LOG_ZERO_ANGLE_THRESHOLD,
            pi_cos_tolerance: LOG_PI_COS_TOLERANCE,
        }
    }
}

impl LogMapConfig {
    /// Create a configuration with the default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the angle below which the Taylor expansion of θ / sin θ is used.
    pub fn with_zero_angle_threshold(mut self, threshold: f64) -> Self {
        self.zero_angle_threshold = threshold;
        self
    }

    /// Set how close cos θ must come to -1 before the near-π branch is used.
    pub fn with_pi_cos_tolerance(mut self, tolerance: f64) -> Self {
        self.pi_cos_tolerance = tolerance;
        self
    }
}
