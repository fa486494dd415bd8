//! Shared data model for the extraction pipeline.

pub mod poi;

pub use poi::{BoundingBox, Poi, PoiCollection, RawRow};
