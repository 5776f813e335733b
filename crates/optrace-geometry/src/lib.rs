//! # optrace Geometry
//!
//! The 2D geometry kernel underneath the optrace ray tracer. This crate
//! provides:
//!
//! - **Vector algebra** ([`vector`]) — Angle conversion, guarded
//!   normalisation, mirror reflection, and the scalar 2D cross product.
//! - **Intersection** ([`intersect`]) — Ray/segment and ray/arc hits,
//!   returning the local tangent/normal frame at the hit point.
//! - **Placement** ([`transform`]) — Rigid frames that rotate and translate
//!   points in the layout plane.
//!
//! All lengths are in millimetres. The kernel has no knowledge of optical
//! elements; it only answers "where does this ray meet this curve".

pub mod intersect;
pub mod transform;
pub mod vector;

pub use intersect::{canonical_normal, ray_hit_arc, ray_hit_element, SegmentHit};
pub use vector::{deg2rad, normalize, reflect_vec, Vec2};
