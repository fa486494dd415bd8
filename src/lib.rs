//! Tamarack - point-of-interest extraction from the Overture Places release
//!
//! This library provides the spatial extraction pipeline shared by the
//! `extract` binary: region resolution, query planning, remote fetch,
//! clipping, merge, and output materialization.

pub mod clip;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod plan;

pub use error::ExtractError;
pub use models::{BoundingBox, Poi, PoiCollection, RawRow};
