//! Browser collaborators for a session.
//!
//! The core only needs three things from the page: a font engine, a place
//! to show frames, and a frame callback. Here they are backed by an
//! offscreen 2D canvas, the visible canvas, and `requestAnimationFrame`.
//! Image shapes are loaded through an `<img>` element and decoded
//! asynchronously.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use image::{RgbaImage, imageops};
use log::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, ImageData};

use super::driver::Session;
use super::error::DotimationError;
use super::options::{DotimationOptions, capped_device_pixel_ratio};
use super::render::Surface;
use super::sampler::{Shape, TextLayout, TextRasterizer};
use super::types::ShapeSpec;

/// The window's device pixel ratio, capped.
pub fn device_pixel_ratio() -> f64 {
	capped_device_pixel_ratio(
		web_sys::window()
			.map(|w| w.device_pixel_ratio())
			.unwrap_or(1.0),
	)
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, DotimationError> {
	canvas
		.get_context("2d")?
		.ok_or_else(|| DotimationError::Canvas("2d context unavailable".into()))?
		.dyn_into::<CanvasRenderingContext2d>()
		.map_err(|_| DotimationError::Canvas("context is not 2d".into()))
}

fn create_canvas(width: u32, height: u32) -> Result<HtmlCanvasElement, DotimationError> {
	let document = web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| DotimationError::Canvas("no document".into()))?;
	let canvas: HtmlCanvasElement = document
		.create_element("canvas")?
		.dyn_into()
		.map_err(|_| DotimationError::Canvas("created element is not a canvas".into()))?;
	canvas.set_width(width);
	canvas.set_height(height);
	Ok(canvas)
}

fn read_pixels(
	ctx: &CanvasRenderingContext2d,
	width: u32,
	height: u32,
) -> Result<RgbaImage, DotimationError> {
	let data = ctx.get_image_data(0.0, 0.0, width as f64, height as f64)?;
	RgbaImage::from_raw(width, height, data.data().0)
		.ok_or_else(|| DotimationError::Canvas("image data size mismatch".into()))
}

/// Draws text with the browser's font engine on a throwaway canvas.
pub struct CanvasTextRasterizer;

impl TextRasterizer for CanvasTextRasterizer {
	fn fill_text(
		&mut self,
		raster: &mut RgbaImage,
		layout: &TextLayout,
	) -> Result<(), DotimationError> {
		let (w, h) = raster.dimensions();
		let canvas = create_canvas(w, h)?;
		let ctx = context_2d(&canvas)?;

		// 1 logical px == dpr device px
		ctx.set_transform(layout.dpr, 0.0, 0.0, layout.dpr, 0.0, 0.0)?;
		ctx.set_image_smoothing_enabled(false);
		ctx.set_font(&layout.font);
		ctx.set_fill_style_str(&layout.fill_style);
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		for line in &layout.lines {
			ctx.fill_text(&line.text, line.x, line.y)?;
		}

		imageops::replace(raster, &read_pixels(&ctx, w, h)?, 0, 0);
		Ok(())
	}
}

/// Fetches and decodes `uri` into an RGBA raster at its natural size.
pub async fn load_image(uri: &str) -> Result<RgbaImage, DotimationError> {
	let load_error = |reason: String| DotimationError::ImageLoad {
		uri: uri.to_string(),
		reason,
	};

	let img = HtmlImageElement::new()?;
	img.set_cross_origin(Some("anonymous"));
	img.set_src(uri);
	JsFuture::from(img.decode())
		.await
		.map_err(|e| load_error(e.as_string().unwrap_or_else(|| format!("{e:?}"))))?;

	let (w, h) = (img.natural_width(), img.natural_height());
	if w == 0 || h == 0 {
		return Err(load_error("image has no pixels".into()));
	}
	let canvas = create_canvas(w, h)?;
	let ctx = context_2d(&canvas)?;
	ctx.draw_image_with_html_image_element(&img, 0.0, 0.0)?;
	read_pixels(&ctx, w, h)
}

/// The visible canvas, sized in device pixels and shown at logical size.
pub struct CanvasSurface {
	ctx: CanvasRenderingContext2d,
	size: (u32, u32),
}

impl CanvasSurface {
	/// Sizes `canvas` for a `width`×`height` logical area at `dpr`.
	///
	/// `None` when the area is empty or the canvas has no 2D context.
	pub fn acquire(canvas: &HtmlCanvasElement, width: f64, height: f64, dpr: f64) -> Option<Self> {
		let (dev_w, dev_h) = ((width * dpr).round(), (height * dpr).round());
		if !(dev_w.is_finite() && dev_h.is_finite()) || dev_w < 1.0 || dev_h < 1.0 {
			warn!("dotimation: surface {width}x{height} has no area");
			return None;
		}
		let size = (dev_w as u32, dev_h as u32);

		canvas.set_width(size.0);
		canvas.set_height(size.1);
		let style = canvas.style();
		let _ = style.set_property("width", &format!("{width}px"));
		let _ = style.set_property("height", &format!("{height}px"));

		match context_2d(canvas) {
			Ok(ctx) => Some(Self { ctx, size }),
			Err(e) => {
				warn!("dotimation: {e}");
				None
			}
		}
	}
}

impl Surface for CanvasSurface {
	fn device_size(&self) -> (u32, u32) {
		self.size
	}

	fn present(&mut self, frame: &RgbaImage) {
		let (w, h) = frame.dimensions();
		let pixels = Clamped(frame.as_raw().as_slice());
		match ImageData::new_with_u8_clamped_array_and_sh(pixels, w, h) {
			Ok(data) => {
				let _ = self.ctx.put_image_data(&data, 0.0, 0.0);
			}
			Err(e) => warn!("dotimation: cannot present frame: {e:?}"),
		}
	}
}

fn random_seed() -> u64 {
	let half = || (js_sys::Math::random() * u32::MAX as f64) as u64;
	(half() << 32) | half()
}

fn request_frame(callback: &Closure<dyn FnMut(f64)>) -> Option<i32> {
	web_sys::window()?
		.request_animation_frame(callback.as_ref().unchecked_ref())
		.ok()
}

/// A session running on a page canvas, driven by `requestAnimationFrame`.
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct SessionHandle {
	session: Rc<RefCell<Session<CanvasSurface>>>,
	frame: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>,
	frame_id: Rc<Cell<Option<i32>>>,
}

impl SessionHandle {
	/// Starts animating `spec` on `canvas`.
	///
	/// `None` when the canvas cannot be used; the effect then simply does not
	/// render.
	pub fn start(
		canvas: &HtmlCanvasElement,
		spec: &ShapeSpec,
		width: f64,
		height: f64,
		options: &DotimationOptions,
	) -> Option<Self> {
		let dpr = device_pixel_ratio();
		let surface = CanvasSurface::acquire(canvas, width, height, dpr)?;
		let session = Session::start(surface, width, height, dpr, options, random_seed());

		let handle = Self {
			session: Rc::new(RefCell::new(session)),
			frame: Rc::new(RefCell::new(None)),
			frame_id: Rc::new(Cell::new(None)),
		};
		handle.run_frames();
		handle.retarget(spec);
		Some(handle)
	}

	fn run_frames(&self) {
		let (session, frame_inner, frame_id) =
			(self.session.clone(), self.frame.clone(), self.frame_id.clone());
		*self.frame.borrow_mut() = Some(Closure::new(move |now: f64| {
			if !session.borrow_mut().tick(now) {
				frame_id.set(None);
				return;
			}
			if let Some(ref cb) = *frame_inner.borrow() {
				frame_id.set(request_frame(cb));
			}
		}));
		if let Some(ref cb) = *self.frame.borrow() {
			self.frame_id.set(request_frame(cb));
		}
	}

	/// Morphs the particles into `spec`.
	///
	/// Text is sampled immediately. Images are loaded in the background; if
	/// another retarget or a cancel happens first, the loaded image is
	/// discarded.
	pub fn retarget(&self, spec: &ShapeSpec) {
		match spec {
			ShapeSpec::Text(text) => {
				self.session
					.borrow_mut()
					.retarget_text(text, &mut CanvasTextRasterizer);
			}
			ShapeSpec::Image(image) => {
				let ticket = self.session.borrow_mut().begin_retarget();
				let (session, image) = (self.session.clone(), image.clone());
				wasm_bindgen_futures::spawn_local(async move {
					let loaded = load_image(&image.source).await;
					let mut session = session.borrow_mut();
					let result = match loaded {
						Ok(_) if session.is_cancelled() => Ok(Vec::new()),
						Ok(raster) => {
							session.sample(Shape::Image(&image, &raster), &mut CanvasTextRasterizer)
						}
						Err(e) => Err(e),
					};
					session.finish_retarget(ticket, result);
				});
			}
		}
	}

	/// Stops the frame loop and ends the session.
	pub fn cancel(&self) {
		self.session.borrow_mut().cancel();
		if let Some(id) = self.frame_id.take() {
			if let Some(window) = web_sys::window() {
				let _ = window.cancel_animation_frame(id);
			}
		}
		self.frame.borrow_mut().take();
	}
}
