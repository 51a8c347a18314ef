//! Leptos component wrapping a dotimation canvas.
//!
//! The first effect run starts a session on the mounted canvas; later runs
//! retarget the running session whenever `item` changes. The session is
//! cancelled when the component is unmounted.

use leptos::prelude::*;
use log::warn;
use web_sys::HtmlCanvasElement;

use super::options::DotimationOptions;
use super::types::ShapeSpec;
use super::web::SessionHandle;

/// Renders `item` as a cloud of particles on a `width`×`height` canvas.
///
/// Changing `item` morphs the existing particles into the new shape.
#[component]
pub fn Dotimation(
	#[prop(into)] item: Signal<ShapeSpec>,
	width: f64,
	height: f64,
	#[prop(optional)] options: DotimationOptions,
	#[prop(optional, into)] class: Option<String>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let handle = StoredValue::new_local(None::<SessionHandle>);

	Effect::new(move |_| {
		let spec = item.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};

		if let Some(running) = handle.get_value() {
			running.retarget(&spec);
			return;
		}

		let canvas: HtmlCanvasElement = canvas.into();
		let started = SessionHandle::start(&canvas, &spec, width, height, &options);
		if started.is_none() {
			warn!("dotimation: canvas unusable, nothing will be drawn");
		}
		handle.set_value(started);
	});

	on_cleanup(move || {
		if let Some(running) = handle.try_get_value().flatten() {
			running.cancel();
		}
	});

	view! {
		<canvas
			node_ref=canvas_ref
			class=class.unwrap_or_else(|| "dotimation-canvas".to_string())
			style="display: block;"
		/>
	}
}
