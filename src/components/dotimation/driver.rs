//! Frame pacing and the animation session.
//!
//! The host calls [`Session::tick`] once per display frame with a monotonic
//! timestamp. Wall-clock time is clamped and accumulated by a [`FrameClock`],
//! which releases a bounded number of fixed physics steps; all of them run
//! before the frame is composited and presented.
//!
//! Shape changes arrive through retarget tickets. Sampling may finish out of
//! order (images decode asynchronously), so only the newest ticket is applied
//! and nothing is applied after cancellation.

use image::RgbaImage;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::error::DotimationError;
use super::options::{DotimationOptions, PhysicsConfig, capped_device_pixel_ratio};
use super::particles::ParticleSet;
use super::reconcile::reconcile;
use super::render::{Compositor, Surface};
use super::sampler::{Sampler, Shape, TextRasterizer};
use super::simulation::Simulation;
use super::types::{ImageSpec, Sample, TextSpec};

/// Fixed-step accumulator decoupling display frames from physics steps.
#[derive(Clone, Debug)]
pub struct FrameClock {
	fixed_dt: f64,
	max_steps: usize,
	max_delta: f64,
	last_ms: Option<f64>,
	accumulator: f64,
}

impl FrameClock {
	pub fn new(config: &PhysicsConfig) -> Self {
		Self {
			fixed_dt: config.fixed_dt(),
			max_steps: config.max_steps_per_frame,
			max_delta: config.max_frame_delta.max(0.0),
			last_ms: None,
			accumulator: 0.0,
		}
	}

	/// Seconds per physics step.
	pub fn fixed_dt(&self) -> f64 {
		self.fixed_dt
	}

	/// Simulated seconds not yet consumed by a step.
	pub fn accumulator(&self) -> f64 {
		self.accumulator
	}

	/// Records a frame at `now_ms` and returns how many fixed steps to run.
	///
	/// The first frame only sets the reference time. Deltas are clamped to
	/// `[0, max_frame_delta]`; time beyond the per-frame step cap stays in
	/// the accumulator for later frames.
	pub fn advance(&mut self, now_ms: f64) -> usize {
		let delta = match self.last_ms {
			Some(last) => ((now_ms - last) / 1000.0).max(0.0).min(self.max_delta),
			None => 0.0,
		};
		self.last_ms = Some(now_ms);
		if delta.is_finite() {
			self.accumulator += delta;
		}

		let mut steps = 0;
		while self.accumulator >= self.fixed_dt && steps < self.max_steps {
			self.accumulator -= self.fixed_dt;
			steps += 1;
		}
		steps
	}
}

/// Identifies one requested shape change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetargetTicket(u64);

/// What happened to a finished sampling request.
#[derive(Debug)]
pub enum RetargetOutcome {
	/// The particles now form the new shape.
	Applied { active: usize, fading: usize },
	/// Sampling produced no points; the previous shape stays.
	Empty,
	/// A newer request was made after this one; the result was dropped.
	Stale,
	/// The session ended before the result arrived.
	Cancelled,
	/// Sampling failed; the previous shape stays.
	Failed(DotimationError),
}

/// One running effect: particles, physics, compositor and the surface they
/// are shown on.
pub struct Session<S: Surface> {
	particles: ParticleSet,
	simulation: Simulation,
	compositor: Compositor,
	clock: FrameClock,
	sampler: Sampler,
	surface: S,
	physics: PhysicsConfig,
	rng: StdRng,
	latest_request: u64,
	cancelled: bool,
}

impl<S: Surface> Session<S> {
	/// Starts an empty session on `surface` for a `width`×`height` logical
	/// canvas. Nothing is drawn until a retarget is applied.
	pub fn start(
		surface: S,
		width: f64,
		height: f64,
		dpr: f64,
		options: &DotimationOptions,
		seed: u64,
	) -> Self {
		let dpr = capped_device_pixel_ratio(dpr);
		let (dev_w, dev_h) = surface.device_size();
		info!("dotimation: session started ({width}x{height} @ {dpr}x, seed {seed})");

		Self {
			particles: ParticleSet::new(),
			simulation: Simulation::new(&options.physics),
			compositor: Compositor::new(dev_w, dev_h, dpr),
			clock: FrameClock::new(&options.physics),
			sampler: Sampler::new(width, height, dpr, options),
			surface,
			physics: options.physics.clone(),
			rng: StdRng::seed_from_u64(seed),
			latest_request: 0,
			cancelled: false,
		}
	}

	pub fn particles(&self) -> &ParticleSet {
		&self.particles
	}

	pub fn surface(&self) -> &S {
		&self.surface
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancelled
	}

	/// Opens a shape-change request. Any earlier open request becomes stale.
	pub fn begin_retarget(&mut self) -> RetargetTicket {
		self.latest_request += 1;
		RetargetTicket(self.latest_request)
	}

	/// Samples `shape` with this session's canvas size, options and RNG.
	pub fn sample<T: TextRasterizer + ?Sized>(
		&mut self,
		shape: Shape<'_>,
		rasterizer: &mut T,
	) -> Result<Vec<Sample>, DotimationError> {
		self.sampler.sample(shape, rasterizer, &mut self.rng)
	}

	/// Applies the result of the request behind `ticket`, unless it has been
	/// superseded, the session is cancelled, or the result is unusable.
	pub fn finish_retarget(
		&mut self,
		ticket: RetargetTicket,
		result: Result<Vec<Sample>, DotimationError>,
	) -> RetargetOutcome {
		if self.cancelled {
			debug!("dotimation: dropping result of request {} after cancel", ticket.0);
			return RetargetOutcome::Cancelled;
		}
		if ticket.0 != self.latest_request {
			debug!(
				"dotimation: dropping stale request {} (latest {})",
				ticket.0, self.latest_request
			);
			return RetargetOutcome::Stale;
		}

		let samples = match result {
			Ok(samples) => samples,
			Err(e) => {
				warn!("dotimation: sampling failed, keeping current shape: {e}");
				return RetargetOutcome::Failed(e);
			}
		};
		if samples.is_empty() {
			debug!("dotimation: request {} produced no samples", ticket.0);
			return RetargetOutcome::Empty;
		}

		reconcile(&mut self.particles, &samples, self.physics.entry_stagger, &mut self.rng);
		let (active, fading) = (self.particles.active.len(), self.particles.fading.len());
		info!("dotimation: retargeted to {active} particles ({fading} fading)");
		RetargetOutcome::Applied { active, fading }
	}

	/// Samples and applies a text shape in one go.
	pub fn retarget_text<T: TextRasterizer + ?Sized>(
		&mut self,
		spec: &TextSpec,
		rasterizer: &mut T,
	) -> RetargetOutcome {
		let ticket = self.begin_retarget();
		let result = self.sample(Shape::Text(spec), rasterizer);
		self.finish_retarget(ticket, result)
	}

	/// Samples and applies an already decoded image shape in one go.
	pub fn retarget_image(&mut self, spec: &ImageSpec, image: &RgbaImage) -> RetargetOutcome {
		let ticket = self.begin_retarget();
		let samples = self.sampler.sample_image(spec, image, &mut self.rng);
		self.finish_retarget(ticket, Ok(samples))
	}

	/// Runs the physics steps due at `now_ms`, then composites and presents
	/// one frame. Returns `false` once the session is cancelled, in which
	/// case nothing is stepped or drawn.
	pub fn tick(&mut self, now_ms: f64) -> bool {
		if self.cancelled {
			return false;
		}

		let steps = self.clock.advance(now_ms);
		let dt = self.clock.fixed_dt();
		for _ in 0..steps {
			self.simulation.step(&mut self.particles, dt, &mut self.rng);
		}

		self.compositor.present(&self.particles, &mut self.surface);
		true
	}

	/// Ends the session. Particles are dropped and later ticks and results
	/// are ignored.
	pub fn cancel(&mut self) {
		if !self.cancelled {
			self.cancelled = true;
			self.particles.clear();
			info!("dotimation: session cancelled");
		}
	}
}

#[cfg(test)]
mod tests {
	use image::Rgba;

	use super::*;
	use crate::components::dotimation::sampler::testing::BlockRasterizer;

	const FRAME_MS: f64 = 1000.0 / 60.0;

	#[derive(Default)]
	struct CountingSurface {
		presented: usize,
		last_opaque: usize,
	}

	impl Surface for CountingSurface {
		fn device_size(&self) -> (u32, u32) {
			(100, 100)
		}

		fn present(&mut self, frame: &RgbaImage) {
			self.presented += 1;
			self.last_opaque = frame.pixels().filter(|px| px[3] > 0).count();
		}
	}

	fn session() -> Session<CountingSurface> {
		Session::start(
			CountingSurface::default(),
			100.0,
			100.0,
			1.0,
			&DotimationOptions::default(),
			42,
		)
	}

	fn text(content: &str) -> TextSpec {
		TextSpec {
			content: content.into(),
			..TextSpec::default()
		}
	}

	fn samples(n: usize) -> Vec<Sample> {
		(0..n)
			.map(|i| Sample {
				x: (i % 100) as f64,
				y: (i / 100) as f64,
				r: 255,
				g: 255,
				b: 255,
			})
			.collect()
	}

	#[test]
	fn first_frame_only_sets_reference_time() {
		let mut clock = FrameClock::new(&PhysicsConfig::default());
		assert_eq!(clock.advance(1000.0), 0);
		assert_eq!(clock.accumulator(), 0.0);
	}

	#[test]
	fn long_frame_is_clamped_before_stepping() {
		let mut clock = FrameClock::new(&PhysicsConfig::default());
		clock.advance(0.0);
		// 60 ms is clamped to 50 ms: four 11.1 ms steps, 5.6 ms carried.
		assert_eq!(clock.advance(60.0), 4);
		assert!((clock.accumulator() - (0.05 - 4.0 / 90.0)).abs() < 1e-12);
	}

	#[test]
	fn sixty_ms_in_two_frames_runs_five_steps() {
		let mut clock = FrameClock::new(&PhysicsConfig::default());
		clock.advance(0.0);
		let steps = clock.advance(30.0) + clock.advance(60.0);
		assert_eq!(steps, 5);
		assert!((clock.accumulator() - (0.06 - 5.0 / 90.0)).abs() < 1e-12);
	}

	#[test]
	fn step_cap_carries_time_forward() {
		let config = PhysicsConfig {
			physics_hz: 240.0,
			..PhysicsConfig::default()
		};
		let mut clock = FrameClock::new(&config);
		clock.advance(0.0);
		assert_eq!(clock.advance(50.0), 8);
		// Remaining four steps' worth runs on the next frame.
		assert_eq!(clock.advance(50.0), 4);
	}

	#[test]
	fn backwards_timestamps_run_nothing() {
		let mut clock = FrameClock::new(&PhysicsConfig::default());
		clock.advance(100.0);
		assert_eq!(clock.advance(50.0), 0);
		assert_eq!(clock.accumulator(), 0.0);
	}

	#[test]
	fn negative_frame_delta_limit_stops_time() {
		let config = PhysicsConfig {
			max_frame_delta: -0.05,
			..PhysicsConfig::default()
		};
		let mut clock = FrameClock::new(&config);
		clock.advance(0.0);
		assert_eq!(clock.advance(30.0), 0);
		assert_eq!(clock.accumulator(), 0.0);
	}

	#[test]
	fn text_fades_in_and_renders() {
		let mut s = session();
		let outcome = s.retarget_text(&text("Hi"), &mut BlockRasterizer);
		assert!(matches!(outcome, RetargetOutcome::Applied { fading: 0, .. }));

		let mut now = 0.0;
		for _ in 0..240 {
			assert!(s.tick(now));
			now += FRAME_MS;
		}
		assert_eq!(s.surface().presented, 240);
		assert!(s.surface().last_opaque > 0);
		assert!(s.particles().active.iter().all(|p| p.opacity == 1.0));
	}

	#[test]
	fn stale_results_are_dropped() {
		let mut s = session();
		let older = s.begin_retarget();
		let newer = s.begin_retarget();

		assert!(matches!(
			s.finish_retarget(newer, Ok(samples(40))),
			RetargetOutcome::Applied { active: 40, fading: 0 }
		));
		assert!(matches!(s.finish_retarget(older, Ok(samples(90))), RetargetOutcome::Stale));
		assert_eq!(s.particles().active.len(), 40);
	}

	#[test]
	fn failures_and_empty_results_keep_last_shape() {
		let mut s = session();
		let t = s.begin_retarget();
		s.finish_retarget(t, Ok(samples(30)));

		let t = s.begin_retarget();
		let failed = s.finish_retarget(
			t,
			Err(DotimationError::ImageLoad {
				uri: "missing.png".into(),
				reason: "404".into(),
			}),
		);
		assert!(matches!(failed, RetargetOutcome::Failed(_)));

		let t = s.begin_retarget();
		assert!(matches!(s.finish_retarget(t, Ok(Vec::new())), RetargetOutcome::Empty));
		assert_eq!(s.particles().active.len(), 30);
		assert!(s.particles().fading.is_empty());
	}

	#[test]
	fn shrinking_retarget_fades_out_surplus() {
		let mut s = session();
		let t = s.begin_retarget();
		s.finish_retarget(t, Ok(samples(100)));
		let t = s.begin_retarget();
		assert!(matches!(
			s.finish_retarget(t, Ok(samples(40))),
			RetargetOutcome::Applied { active: 40, fading: 60 }
		));

		let mut now = 0.0;
		for _ in 0..180 {
			s.tick(now);
			now += FRAME_MS;
		}
		assert!(s.particles().fading.is_empty());
		assert_eq!(s.particles().active.len(), 40);
	}

	#[test]
	fn cancel_stops_frames_and_ignores_in_flight_results() {
		let mut s = session();
		let t = s.begin_retarget();
		assert!(s.tick(0.0));
		s.cancel();

		assert!(matches!(s.finish_retarget(t, Ok(samples(10))), RetargetOutcome::Cancelled));
		assert!(!s.tick(FRAME_MS));
		assert_eq!(s.surface().presented, 1);
		assert!(s.particles().is_empty());
		assert!(s.is_cancelled());
	}

	#[test]
	fn image_retarget_uses_session_canvas() {
		let mut s = session();
		let image = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 255, 255]));
		let outcome = s.retarget_image(&ImageSpec::default(), &image);
		// 10x10 scaled to fill 100x100, sampled every 2 px.
		assert!(matches!(outcome, RetargetOutcome::Applied { active: 2500, .. }));
		assert!(s.particles().active.iter().all(|p| p.home_b > 250.0 && p.home_r < 5.0));
	}
}
