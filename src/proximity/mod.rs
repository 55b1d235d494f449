//! Proximity queries between pairs of tessellated shapes.
//!
//! [`ShapeProximity`] is the entry point. With a finite tolerance it reports
//! every pair of sub-shapes closer than the tolerance; with the tolerance
//! left unset it computes the proximity value, the tightest shell thickness
//! that encloses one shape around the other.

mod point_query;
mod shape;
mod value;

pub use point_query::{Candidate, NearestPointMetric, SampleDistance};
pub use shape::ShapeProximity;
pub use value::{PairCandidate, ProximityValue};
