//! Particle animation of text and images.
//!
//! A shape (a line or two of text, or a picture) is sampled into a set of
//! colored points. Each point becomes a particle that springs toward its home
//! position, and switching shapes reuses the particles already on screen:
//! existing ones are retargeted, extra ones are cloned from them, surplus
//! ones fade out. Frames are composited into an RGBA buffer at device
//! resolution and handed to a [`render::Surface`].
//!
//! Everything except [`web`] and the component is plain Rust and runs
//! natively.
//!
//! # Example
//!
//! ```ignore
//! use dotimation::{Dotimation, ShapeSpec};
//!
//! let item = RwSignal::new(ShapeSpec::text("Hello"));
//! view! { <Dotimation item=item width=400.0 height=200.0 /> }
//! ```

pub mod color;
mod component;
pub mod driver;
pub mod error;
pub mod font;
pub mod options;
pub mod particles;
pub mod reconcile;
pub mod render;
pub mod sampler;
pub mod simulation;
pub mod types;
pub mod web;

pub use component::Dotimation;
pub use driver::{FrameClock, RetargetOutcome, RetargetTicket, Session};
pub use error::DotimationError;
pub use options::{DotimationOptions, PhysicsConfig};
pub use types::{AutoFontSize, FontSizeMode, ImageSpec, Sample, ShapeSpec, TextSpec};
pub use web::SessionHandle;
