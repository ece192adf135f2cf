//! Draw-call batching.
//!
//! Responsibilities:
//! - render-state keys per primitive class (lines, polygons, points)
//! - hashed batch tables that accumulate one frame of geometry
//! - flattening the tables into upload arrays + a draw-call list
//!
//! Merge rules differ per class:
//! - lines: same key → same index list
//! - polygons: same key → separate index ranges, never coalesced
//! - points: same key → same vertex list

mod frame;
mod key;
mod table;
mod vertex;

pub use frame::{DrawCall, FrameAssembler, FrameBatches};
pub use key::{DrawKey, LineKey, PointKey, PolygonKey, Topology};
pub use table::{
    IndexRange, LineBatches, LineWriter, PointBatches, PolygonBatches, PolygonWriter,
};
pub use vertex::{LineVertex, PointVertex, PolyVertex};
