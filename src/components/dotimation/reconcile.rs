//! Retargeting an existing particle set onto a freshly sampled shape.
//!
//! Particles are reused wherever possible so a shape change reads as motion
//! rather than a cut: existing particles get new homes, extra ones are
//! cloned from existing ones, and surplus ones fade out in place.

use rand::Rng;

use super::particles::{Particle, ParticleSet};
use super::types::Sample;

/// Rebuilds `set` around `samples`.
///
/// Afterwards `set.active.len() == samples.len()`, and the total particle
/// count grows by exactly `max(0, samples.len() - previous_active)`.
/// `entry_stagger` bounds the negative starting opacity of particles seeded
/// into an empty set.
pub fn reconcile<R: Rng>(
	set: &mut ParticleSet,
	samples: &[Sample],
	entry_stagger: f64,
	rng: &mut R,
) {
	let current = set.active.len();

	if current == 0 {
		set.active = samples
			.iter()
			.map(|s| Particle::seeded(s, -rng.random::<f64>() * entry_stagger))
			.collect();
		return;
	}

	if samples.len() > current {
		for (p, s) in set.active.iter_mut().zip(samples) {
			retarget(p, s);
		}
		set.active.reserve(samples.len() - current);
		for (i, s) in samples.iter().enumerate().skip(current) {
			let mut clone = set.active[i % current].clone();
			clone.set_home(s);
			set.active.push(clone);
		}
		return;
	}

	let surplus = set.active.split_off(samples.len());
	set.fading.extend(surplus);
	for (p, s) in set.active.iter_mut().zip(samples) {
		retarget(p, s);
	}
	if !samples.is_empty() {
		for (i, p) in set.fading.iter_mut().enumerate() {
			p.set_home(&samples[i % samples.len()]);
		}
	}
}

/// New home for an active particle; its velocity restarts from rest.
fn retarget(p: &mut Particle, s: &Sample) {
	p.set_home(s);
	p.vx = 0.0;
	p.vy = 0.0;
}
