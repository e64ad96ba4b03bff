//! Annotation scene model and editing surface.
//!
//! A [`Surface`](surface::Surface) is a stateful editing session bound to
//! one photo at a time. It owns the vector objects drawn over the photo,
//! serializes them to portable [`SceneSnapshot`](scene::SceneSnapshot)s,
//! and can rasterize the whole scene onto the full-resolution photo for
//! export.

pub mod flatten;
pub mod scene;
pub mod surface;

pub use flatten::flatten;
pub use scene::{SceneError, SceneObject, SceneSnapshot};
pub use surface::{fit_scale, Surface, TextPrompt, Tool};
