//! Error types for sampling and browser interop.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Errors that can occur while producing particles for a shape.
#[derive(Debug, Error)]
pub enum DotimationError {
	/// The browser could not fetch or decode an image.
	#[error("failed to load image {uri}: {reason}")]
	ImageLoad { uri: String, reason: String },

	/// In-memory image bytes were not a supported image.
	#[error("failed to decode image: {0}")]
	ImageDecode(#[from] image::ImageError),

	/// A canvas call threw.
	#[error("canvas error: {0}")]
	Canvas(String),
}

impl From<JsValue> for DotimationError {
	fn from(value: JsValue) -> Self {
		Self::Canvas(value.as_string().unwrap_or_else(|| format!("{value:?}")))
	}
}
