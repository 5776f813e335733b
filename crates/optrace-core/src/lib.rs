//! # optrace Core
//!
//! The ray-tracing and polarization engine of the optrace optical layout
//! tool. Given optical elements (mirrors, thin lenses, beamsplitters,
//! waveplates, refractive interfaces) and light sources, it computes every
//! resulting ray path with its vertices, branch intensity, and Jones-vector
//! polarization, forking rays at partially reflecting or polarizing
//! elements.
//!
//! ## Architecture
//!
//! The engine sits on the [`optrace_geometry`] kernel. For each ray in
//! flight the [`tracer`] asks the kernel for the nearest element hit, hands
//! the hit to [`interaction`] for the element's transform, and then either
//! continues the ray or pushes its two branches onto the work list.
//!
//! ## Modules
//!
//! - [`types`] — Elements, sources, and ray paths.
//! - [`jones`] — Jones vectors, Jones matrices, Stokes parameters.
//! - [`fresnel`] — Snell's law and Fresnel coefficients.
//! - [`interaction`] — Per-element-kind direction and polarization transforms.
//! - [`tracer`] — The work-list ray tracer.
//! - [`inspect`] — Intensity and Stokes parameters at a point of a path.
//! - [`color`] — Display colour from wavelength and intensity.

pub mod color;
pub mod fresnel;
pub mod inspect;
pub mod interaction;
pub mod jones;
pub mod tracer;
pub mod types;

pub use jones::{Polarization, PolarizationSpec, Stokes};
pub use tracer::{trace, RayTracer, TraceOptions};
pub use types::{ElementKind, OpticalElement, RayPath, SourceParams};
