//! dotimation: text and images drawn as swarms of spring-driven particles.
//!
//! This crate provides a WASM-based canvas component that samples a shape
//! into colored points and animates particles toward them, morphing between
//! shapes as the displayed item changes.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use serde::Deserialize;
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::dotimation::{
	Dotimation, DotimationError, DotimationOptions, ImageSpec, PhysicsConfig, SessionHandle,
	ShapeSpec, TextSpec,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("dotimation: logging initialized");
}

/// What the demo page shows: the items to cycle through and the canvas
/// they are drawn on.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneData {
	/// Shapes shown in turn; clicking the canvas advances to the next.
	pub items: Vec<ShapeSpec>,
	/// Logical canvas width in CSS pixels.
	pub width: f64,
	/// Logical canvas height in CSS pixels.
	pub height: f64,
	/// Sampling and physics settings.
	pub options: DotimationOptions,
}

impl Default for SceneData {
	fn default() -> Self {
		Self {
			items: vec![ShapeSpec::text("dotimation")],
			width: 640.0,
			height: 320.0,
			options: DotimationOptions::default(),
		}
	}
}

impl SceneData {
	/// Parses scene JSON, falling back to the default item list when the
	/// scene names none.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		let mut scene: Self = serde_json::from_str(json)?;
		if scene.items.is_empty() {
			scene.items = Self::default().items;
		}
		Ok(scene)
	}
}

/// Load the scene from a script element with id="dotimation-data".
/// Expected format: JSON with { items: [...], width, height, options }
fn load_scene_data() -> Option<SceneData> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("dotimation-data")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match SceneData::from_json(&json_text) {
		Ok(scene) => {
			info!(
				"dotimation: loaded {} items for a {}x{} canvas",
				scene.items.len(),
				scene.width,
				scene.height
			);
			Some(scene)
		}
		Err(e) => {
			warn!("dotimation: failed to parse scene data: {}", e);
			None
		}
	}
}

/// Main application component.
/// Loads the scene from the DOM and cycles through its items on click.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let SceneData {
		items,
		width,
		height,
		options,
	} = load_scene_data().unwrap_or_default();
	let count = items.len();
	let index = RwSignal::new(0usize);
	let item = Signal::derive(move || items[index.get() % count].clone());

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="dotimation" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="dotimation-stage" on:click=move |_| index.update(|i| *i = (*i + 1) % count)>
			<Dotimation item=item width=width height=height options=options />
			<p class="subtitle">"Click to morph to the next item."</p>
		</div>
	}
}
