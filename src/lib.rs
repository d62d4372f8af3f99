//! A reader for ADCIRC fort.14 meshes.
//!
//! A fort.14 file holds a 2D triangle mesh (nodes with a depth attribute and
//! triangles referencing them by id) followed by an optional boundary section
//! made of elevation and normal-flux segments.
//!
//! ```
//! let input = "two triangles
//! 2 4
//! 1 0.0 0.0 5.0
//! 2 1.0 0.0 5.0
//! 3 1.0 1.0 5.0
//! 4 0.0 1.0 5.0
//! 1 3 1 2 3
//! 2 3 1 3 4
//! ";
//! let mesh: fort14::Mesh = input.parse()?;
//! assert_eq!(mesh.node_count(), 4);
//! assert_eq!(mesh.elements()[1].vertices, [1, 3, 4]);
//! # Ok::<(), fort14::ParseError>(())
//! ```
//!
//! [`assemble()`] additionally derives the triangulation and the boundary
//! outline of the mesh through a [`Geometry`] implementation.

pub mod assemble;
pub mod geometry;
mod mesh;
pub mod parser;
pub mod progress;
#[cfg(feature = "sprs")]
pub mod topology;


pub use crate::assemble::assemble;
pub use crate::assemble::AssembleError;
pub use crate::assemble::Assembled;
pub use crate::geometry::BoundaryOutline;
pub use crate::geometry::Geometry;
pub use crate::geometry::GeometryError;
pub use crate::geometry::MeshGeometry;
pub use crate::geometry::Point2D;
pub use crate::geometry::Triangulation;
pub use crate::mesh::BoundaryKind;
pub use crate::mesh::BoundarySegment;
pub use crate::mesh::Element;
pub use crate::mesh::Mesh;
pub use crate::mesh::Node;
pub use crate::parser::boundary::BoundaryClass;
pub use crate::parser::boundary::RecordShape;
pub use crate::parser::parse_mesh;
pub use crate::parser::parse_mesh_with;
pub use crate::parser::Error as ParseError;
pub use crate::parser::ErrorKind;
pub use crate::parser::Options;
pub use crate::parser::Stage;
pub use crate::progress::ProgressReporter;

#[cfg(feature = "sprs")]
pub use sprs;
