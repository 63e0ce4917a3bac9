//! Procedural point-cloud fields: a spiral galaxy and a background star field.
//!
//! Generators turn a parameter snapshot and a random source into immutable
//! position/colour buffers. The [`FieldController`] owns the snapshots and the
//! buffers currently shown on a [`DisplaySurface`], replacing them whenever a
//! settled parameter change arrives. Rendering itself stays outside of the
//! crate so that everything here runs headless.

pub mod buffers;
pub mod color;
pub mod controller;
pub mod error;
pub mod generator;
pub mod params;
pub mod preset;
pub mod surface;

pub use buffers::{PointCloudBuffers, PointVertex};
pub use color::Color;
pub use controller::{field_transform, ChangePhase, FieldController, FieldResource, SharedController};
pub use error::FieldError;
pub use generator::{generate_galaxy, generate_stars};
pub use params::{
    ranges, GalaxyChange, GalaxyParameters, ParamRange, StarFieldChange, StarFieldParameters,
};
pub use preset::Preset;
pub use surface::{
    Blending, DisplaySurface, FieldKind, LiveCloud, PointCloud, PointStyle, RecordingSurface,
    SurfaceHandle,
};
