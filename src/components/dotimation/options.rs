//! Tunables for sampling and simulation.
//!
//! Everything the effect can be configured with lives here, grouped the same
//! way it is consumed:
//!
//! - [`DotimationOptions`]: how shapes are sampled into particles.
//! - [`PhysicsConfig`]: spring, jitter, easing and frame-stepping constants.
//!
//! Both deserialize from partial camelCase JSON; missing fields take their
//! defaults.

use serde::Deserialize;

use super::color::Rgb;

/// Fill color used for text when neither the shape nor the options name one.
pub const DEFAULT_TEXT_COLOR: Rgb = Rgb::new(200, 200, 200);

/// Upper bound on the device pixel ratio used for rasters and buffers.
pub const MAX_DEVICE_PIXEL_RATIO: f64 = 2.0;

/// Caps a reported device pixel ratio at [`MAX_DEVICE_PIXEL_RATIO`].
///
/// Missing or nonsensical ratios (zero, negative, NaN) count as 1.
pub fn capped_device_pixel_ratio(raw: f64) -> f64 {
	if raw.is_finite() && raw > 0.0 {
		raw.min(MAX_DEVICE_PIXEL_RATIO)
	} else {
		1.0
	}
}

/// Session-level options.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DotimationOptions {
	/// Distance between sampled points in logical pixels.
	pub point_spacing: f64,
	/// Raster alpha a pixel must exceed to become a particle (0-255).
	pub alpha_threshold: u8,
	/// Font family for text shapes that do not name one.
	pub default_font_family: String,
	/// CSS color forced onto every sample, regardless of the raster color.
	pub color_override: Option<String>,
	/// Spring, timing and fade tuning.
	pub physics: PhysicsConfig,
}

impl Default for DotimationOptions {
	fn default() -> Self {
		Self {
			point_spacing: 2.0,
			alpha_threshold: 128,
			default_font_family: "sans-serif".to_string(),
			color_override: None,
			physics: PhysicsConfig::default(),
		}
	}
}

impl DotimationOptions {
	/// The parsed color override, if one is set and parseable.
	pub fn override_color(&self) -> Option<Rgb> {
		self.color_override.as_deref().and_then(Rgb::parse_css)
	}
}

/// Simulation and frame-stepping constants.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhysicsConfig {
	/// Seconds for the spring to settle on its home.
	pub settle_time: f64,
	/// Spring damping ratio. 1.0 is critical damping (no overshoot).
	pub damping_ratio: f64,
	/// Fixed physics steps per simulated second.
	pub physics_hz: f64,
	/// Most physics steps run for a single presented frame.
	pub max_steps_per_frame: usize,
	/// Longest wall-clock frame delta accepted, in seconds.
	pub max_frame_delta: f64,
	/// Jitter events per simulated second.
	pub jitter_hz: f64,
	/// Width of the uniform horizontal jitter, centered on zero.
	pub jitter_amount: f64,
	/// Exponential color easing rate, per second.
	pub color_rate: f64,
	/// Linear opacity change, per second.
	pub opacity_rate: f64,
	/// New particles start with opacity drawn from `(-entry_stagger, 0]`.
	pub entry_stagger: f64,
}

impl Default for PhysicsConfig {
	fn default() -> Self {
		Self {
			settle_time: 0.85,
			damping_ratio: 1.0,
			physics_hz: 90.0,
			max_steps_per_frame: 8,
			max_frame_delta: 0.05,
			jitter_hz: 15.0,
			jitter_amount: 1.0,
			color_rate: 2.0,
			opacity_rate: 2.0,
			entry_stagger: 3.0,
		}
	}
}

impl PhysicsConfig {
	/// Duration of one physics step in seconds.
	pub fn fixed_dt(&self) -> f64 {
		1.0 / self.physics_hz
	}
}
