//! Fixed-step particle physics.
//!
//! Each step pulls particles toward their homes with a damped spring, eases
//! their colors toward the home color, moves opacity linearly (up for the
//! active pool, down for the fading pool) and, at its own slower rate,
//! nudges every particle sideways to keep the settled shape alive.

use rand::Rng;

use super::options::PhysicsConfig;
use super::particles::{Particle, ParticleSet};

/// Spring constants derived from a settle time and damping ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spring {
	pub stiffness: f64,
	pub damping: f64,
}

impl Spring {
	/// Tunes a spring that settles in about `settle_time` seconds.
	///
	/// `ωn = 4 / (ζ·settle_time)`, `k = ωn²`, `c = 2ζωn`.
	pub fn tuned(settle_time: f64, damping_ratio: f64) -> Self {
		let wn = 4.0 / (damping_ratio * settle_time);
		Self {
			stiffness: wn * wn,
			damping: 2.0 * damping_ratio * wn,
		}
	}
}

/// Direction a particle's opacity is moving.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fade {
	In,
	Out,
}

/// Exponential smoothing toward `target`, independent of step size:
/// `value += (target - value) * (1 - e^(-rate * dt))`.
pub fn ease_toward(value: f64, target: f64, rate: f64, dt: f64) -> f64 {
	value + (target - value) * (1.0 - (-rate * dt).exp())
}

/// Advances particle pools one fixed step at a time.
#[derive(Clone, Debug)]
pub struct Simulation {
	spring: Spring,
	color_rate: f64,
	opacity_rate: f64,
	jitter_period: f64,
	jitter_amount: f64,
	jitter_clock: f64,
}

impl Simulation {
	pub fn new(config: &PhysicsConfig) -> Self {
		Self {
			spring: Spring::tuned(config.settle_time, config.damping_ratio),
			color_rate: config.color_rate,
			opacity_rate: config.opacity_rate,
			jitter_period: 1.0 / config.jitter_hz,
			jitter_amount: config.jitter_amount,
			jitter_clock: 0.0,
		}
	}

	/// Runs one physics step of `dt` seconds over both pools, then prunes
	/// fully faded particles.
	pub fn step<R: Rng>(&mut self, set: &mut ParticleSet, dt: f64, rng: &mut R) {
		if set.is_empty() {
			return;
		}

		let jitter = self.jitter_due(dt);

		for p in &mut set.fading {
			self.integrate(p, Fade::Out, dt);
			if jitter {
				self.jitter(p, rng);
			}
		}
		set.prune_faded();

		for p in &mut set.active {
			self.integrate(p, Fade::In, dt);
			if jitter {
				self.jitter(p, rng);
			}
		}
	}

	/// Deterministic part of a step: spring, color easing and opacity.
	pub fn integrate(&self, p: &mut Particle, fade: Fade, dt: f64) {
		let Spring { stiffness, damping } = self.spring;
		let ax = stiffness * (p.home_x - p.x) - damping * p.vx;
		let ay = stiffness * (p.home_y - p.y) - damping * p.vy;

		p.vx += ax * dt;
		p.vy += ay * dt;
		p.x += p.vx * dt;
		p.y += p.vy * dt;

		p.r = ease_toward(p.r, p.home_r, self.color_rate, dt);
		p.g = ease_toward(p.g, p.home_g, self.color_rate, dt);
		p.b = ease_toward(p.b, p.home_b, self.color_rate, dt);

		let delta = self.opacity_rate * dt;
		p.opacity = match fade {
			Fade::In => (p.opacity + delta).min(1.0),
			Fade::Out => (p.opacity - delta).max(0.0),
		};
	}

	fn jitter<R: Rng>(&self, p: &mut Particle, rng: &mut R) {
		p.x += (rng.random::<f64>() - 0.5) * self.jitter_amount;
	}

	/// Accumulates `dt` on the jitter clock and reports whether a jitter
	/// period elapsed.
	fn jitter_due(&mut self, dt: f64) -> bool {
		self.jitter_clock += dt;
		if self.jitter_clock >= self.jitter_period {
			self.jitter_clock -= self.jitter_period;
			true
		} else {
			false
		}
	}
}

#[cfg(test)]
mod tests {
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	use super::*;
	use crate::components::dotimation::types::Sample;

	const DT: f64 = 1.0 / 90.0;

	fn particle_at(x: f64, y: f64, opacity: f64) -> Particle {
		Particle::seeded(
			&Sample {
				x,
				y,
				r: 0,
				g: 0,
				b: 0,
			},
			opacity,
		)
	}

	fn still_config() -> PhysicsConfig {
		PhysicsConfig {
			jitter_amount: 0.0,
			..PhysicsConfig::default()
		}
	}

	#[test]
	fn default_spring_is_critically_damped() {
		let spring = Spring::tuned(0.85, 1.0);
		let wn = 4.0 / 0.85;
		assert!((spring.stiffness - wn * wn).abs() < 1e-12);
		assert!((spring.damping - 2.0 * wn).abs() < 1e-12);
	}

	#[test]
	fn integrate_is_a_pure_function_of_state_and_dt() {
		let sim = Simulation::new(&still_config());
		let mut start = particle_at(0.0, 0.0, 0.2);
		start.home_x = 50.0;
		start.home_y = -20.0;
		start.home_r = 255.0;

		let (mut a, mut b) = (start.clone(), start.clone());
		sim.integrate(&mut a, Fade::In, DT);
		sim.integrate(&mut b, Fade::In, DT);
		assert_eq!(a, b);
		assert!(a.x > 0.0 && a.y < 0.0);
		assert!(a.r > 0.0 && a.r < 255.0);
	}

	#[test]
	fn spring_settles_without_overshoot() {
		let sim = Simulation::new(&still_config());
		let mut p = particle_at(0.0, 0.0, 1.0);
		p.home_x = 100.0;
		for _ in 0..(90 * 3) {
			sim.integrate(&mut p, Fade::In, DT);
			assert!(p.x <= 100.0 + 1e-9);
		}
		assert!((p.x - 100.0).abs() < 0.01);
	}

	#[test]
	fn color_easing_matches_closed_form() {
		let eased = ease_toward(0.0, 100.0, 2.0, 0.5);
		assert!((eased - 100.0 * (1.0 - (-1.0f64).exp())).abs() < 1e-12);
		// Two half steps equal one full step.
		let halves = ease_toward(ease_toward(0.0, 100.0, 2.0, 0.25), 100.0, 2.0, 0.25);
		assert!((halves - eased).abs() < 1e-9);
	}

	#[test]
	fn opacity_moves_linearly_and_saturates() {
		let sim = Simulation::new(&still_config());
		let mut rising = particle_at(0.0, 0.0, -1.0);
		sim.integrate(&mut rising, Fade::In, 0.25);
		assert!((rising.opacity + 0.5).abs() < 1e-12);
		for _ in 0..10 {
			sim.integrate(&mut rising, Fade::In, 0.25);
		}
		assert_eq!(rising.opacity, 1.0);

		let mut falling = particle_at(0.0, 0.0, 0.3);
		sim.integrate(&mut falling, Fade::Out, 0.25);
		assert_eq!(falling.opacity, 0.0);
	}

	#[test]
	fn step_prunes_only_faded_particles() {
		let mut rng = StdRng::seed_from_u64(3);
		let mut sim = Simulation::new(&still_config());
		let mut set = ParticleSet::new();
		set.fading.push(particle_at(1.0, 0.0, 0.0005));
		set.fading.push(particle_at(2.0, 0.0, 0.5));
		set.active.push(particle_at(3.0, 0.0, 0.0));

		sim.step(&mut set, DT, &mut rng);

		assert_eq!(set.fading.len(), 1);
		assert_eq!(set.fading[0].x, 2.0);
		assert!(set.fading[0].opacity < 0.5);
		assert!(set.active[0].opacity > 0.0);
	}

	#[test]
	fn jitter_fires_at_its_own_rate() {
		let mut rng = StdRng::seed_from_u64(11);
		let mut sim = Simulation::new(&PhysicsConfig::default());
		let mut set = ParticleSet::new();
		set.active.push(particle_at(10.0, 10.0, 1.0));

		// 90 Hz physics, 15 Hz jitter: one jitter every six steps.
		let mut jitters = 0;
		for _ in 0..90 {
			let mut expected = set.active[0].clone();
			sim.integrate(&mut expected, Fade::In, DT);
			sim.step(&mut set, DT, &mut rng);
			let offset = set.active[0].x - expected.x;
			assert!(offset.abs() <= 0.5 + 1e-9);
			if offset != 0.0 {
				jitters += 1;
			}
		}
		assert!((14..=15).contains(&jitters), "jitters = {jitters}");
		assert_eq!(set.active[0].y, 10.0);
	}
}
