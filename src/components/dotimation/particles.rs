//! Particle state and the two pools used during shape transitions.

use super::types::Sample;

/// Fading particles at or below this opacity are removed.
pub const FADE_EPSILON: f64 = 0.001;

/// A single rendered point.
///
/// `home_*` fields are the spring equilibrium and target color; only the
/// reconciler rewrites them. Everything else belongs to the simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	pub home_x: f64,
	pub home_y: f64,
	/// Unclamped; negative values delay the visible fade-in.
	pub opacity: f64,
	pub r: f64,
	pub g: f64,
	pub b: f64,
	pub home_r: f64,
	pub home_g: f64,
	pub home_b: f64,
}

impl Particle {
	/// A particle resting on its sample, with the given starting opacity.
	pub fn seeded(sample: &Sample, opacity: f64) -> Self {
		let (r, g, b) = (sample.r as f64, sample.g as f64, sample.b as f64);
		Self {
			x: sample.x,
			y: sample.y,
			vx: 0.0,
			vy: 0.0,
			home_x: sample.x,
			home_y: sample.y,
			opacity,
			r,
			g,
			b,
			home_r: r,
			home_g: g,
			home_b: b,
		}
	}

	/// Points the particle's home position and color at `sample`.
	pub fn set_home(&mut self, sample: &Sample) {
		self.home_x = sample.x;
		self.home_y = sample.y;
		self.home_r = sample.r as f64;
		self.home_g = sample.g as f64;
		self.home_b = sample.b as f64;
	}

	/// Whether the particle sits on its home position and color.
	pub fn is_home(&self) -> bool {
		self.x == self.home_x
			&& self.y == self.home_y
			&& self.r == self.home_r
			&& self.g == self.home_g
			&& self.b == self.home_b
	}
}

/// The particles of one animation session.
///
/// `active` particles fade in and track the current shape; `fading` ones
/// were retired by a retarget and fade out until pruned. A particle is in
/// exactly one of the two.
#[derive(Clone, Debug, Default)]
pub struct ParticleSet {
	pub active: Vec<Particle>,
	pub fading: Vec<Particle>,
}

impl ParticleSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Total particles across both pools.
	pub fn len(&self) -> usize {
		self.active.len() + self.fading.len()
	}

	pub fn is_empty(&self) -> bool {
		self.active.is_empty() && self.fading.is_empty()
	}

	/// Drops fully faded particles from the fading pool, keeping the order
	/// of the survivors.
	pub fn prune_faded(&mut self) {
		self.fading.retain(|p| p.opacity > FADE_EPSILON);
	}

	/// Active particles first, then fading: the order they are drawn in.
	pub fn iter(&self) -> impl Iterator<Item = &Particle> {
		self.active.iter().chain(self.fading.iter())
	}

	pub fn clear(&mut self) {
		self.active.clear();
		self.fading.clear();
	}
}
