use crate::parser;
use crate::parser::boundary::RecordShape;
use itertools::Itertools as _;
use std::fs;
use std::io;
use std::path::Path;
use std::str;

/// A mesh vertex.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Node {
    /// Positive id, expected to run from 1 to the node count.
    pub id: usize,
    pub x: f64,
    pub y: f64,
    /// Scalar attribute, usually the depth below the datum.
    pub z: f64,
}

/// A triangle of the mesh.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub id: usize,
    /// Node ids, in the order that defines the orientation of the triangle.
    pub vertices: [usize; 3],
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BoundaryKind {
    /// Open boundary with prescribed elevation.
    Elevation,
    /// Normal-flux boundary and its type code.
    NormalFlux(i32),
}

/// An ordered run of boundary nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundarySegment {
    kind: BoundaryKind,
    nodes: Vec<usize>,
    data: Vec<f64>,
}

impl BoundarySegment {
    /// # Panics
    ///
    /// Panics if `data` does not hold one record per node, as laid out by the
    /// record shape of `kind`.
    pub fn new(kind: BoundaryKind, nodes: Vec<usize>, data: Vec<f64>) -> Self {
        let field_count = match kind {
            BoundaryKind::Elevation => 0,
            BoundaryKind::NormalFlux(code) => {
                RecordShape::from_code(code).map_or(0, RecordShape::field_count)
            }
        };
        assert_eq!(data.len(), nodes.len() * field_count);
        Self { kind, nodes, data }
    }

    pub fn kind(&self) -> BoundaryKind {
        self.kind
    }

    /// Node ids of the segment, in boundary order.
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Layout of the per-node records, `None` for elevation boundaries.
    pub fn record_shape(&self) -> Option<RecordShape> {
        match self.kind {
            BoundaryKind::Elevation => None,
            BoundaryKind::NormalFlux(code) => RecordShape::from_code(code),
        }
    }

    fn field_count(&self) -> usize {
        self.record_shape().map_or(0, RecordShape::field_count)
    }

    /// The per-node numbers, one slice per node.
    ///
    /// Yields nothing when the boundary type carries no auxiliary data.
    pub fn data(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(usize::max(self.field_count(), 1))
    }

    /// The numbers attached to the `i`-th node of the segment.
    pub fn record(&self, i: usize) -> &[f64] {
        let field_count = self.field_count();
        &self.data[i * field_count..(i + 1) * field_count]
    }

    /// `(node id, numbers)` for each node of the segment.
    pub fn records(&self) -> impl Iterator<Item = (usize, &[f64])> {
        let field_count = self.field_count();
        self.nodes
            .iter()
            .enumerate()
            .map(move |(i, node)| (*node, &self.data[i * field_count..(i + 1) * field_count]))
    }
}

/// A fort.14 mesh.
///
/// Nodes, elements and boundary segments are kept in file order.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct Mesh {
    id: String,
    nodes: Vec<Node>,
    elements: Vec<Element>,
    boundary_segments: Vec<BoundarySegment>,
}

impl Mesh {
    pub fn from_raw_parts(
        id: String,
        nodes: Vec<Node>,
        elements: Vec<Element>,
        boundary_segments: Vec<BoundarySegment>,
    ) -> Self {
        Self {
            id,
            nodes,
            elements,
            boundary_segments,
        }
    }

    /// Reads a mesh file, boundary section included.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Mesh, parser::Error> {
        let file = fs::File::open(path).map_err(parser::Error::from)?;
        let r = io::BufReader::new(file);
        Mesh::from_reader(r)
    }

    /// Reads a mesh, boundary section included.
    pub fn from_reader(r: impl io::BufRead) -> Result<Mesh, parser::Error> {
        parser::parse_mesh(r, true, &mut ())
    }

    /// The free-text title of the mesh, verbatim.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the title is longer than the format allows.
    pub fn id_is_oversized(&self) -> bool {
        parser::MAX_ID_LEN < self.id.trim_end().chars().count()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn boundary_segments(&self) -> &[BoundarySegment] {
        &self.boundary_segments
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Looks up a node by id.
    pub fn node(&self, id: usize) -> Option<&Node> {
        // Ids are usually contiguous from 1.
        match id.checked_sub(1).and_then(|idx| self.nodes.get(idx)) {
            Some(node) if node.id == id => Some(node),
            _ => self.nodes.iter().find(|node| node.id == id),
        }
    }

    pub fn elevation_segments(&self) -> impl Iterator<Item = &BoundarySegment> {
        self.boundary_segments
            .iter()
            .filter(|segment| segment.kind == BoundaryKind::Elevation)
    }

    pub fn flux_segments(&self) -> impl Iterator<Item = &BoundarySegment> {
        self.boundary_segments
            .iter()
            .filter(|segment| matches!(segment.kind, BoundaryKind::NormalFlux(_)))
    }

    /// Smallest and largest node attribute, `None` for a mesh without nodes.
    pub fn depth_range(&self) -> Option<(f64, f64)> {
        self.nodes
            .iter()
            .map(|node| node.z)
            .minmax_by(f64::total_cmp)
            .into_option()
    }
}

impl str::FromStr for Mesh {
    type Err = parser::Error;

    fn from_str(s: &str) -> Result<Mesh, parser::Error> {
        Mesh::from_reader(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn barrier() -> BoundarySegment {
        BoundarySegment::new(
            BoundaryKind::NormalFlux(3),
            vec![7, 8],
            vec![1.0, 0.5, 2.0, 0.25],
        )
    }

    #[test]
    fn test_segment_records() {
        let segment = barrier();
        assert_eq!(segment.len(), 2);
        assert_eq!(segment.record(1), &[2.0, 0.25]);
        let records: Vec<_> = segment.records().collect();
        assert_eq!(records, vec![(7, &[1.0, 0.5][..]), (8, &[2.0, 0.25][..])]);

        let wall = BoundarySegment::new(BoundaryKind::NormalFlux(20), vec![1, 2, 3], vec![]);
        assert_eq!(wall.data().count(), 0);
        assert_eq!(wall.record(2), &[] as &[f64]);
        assert_eq!(wall.records().count(), 3);
    }

    #[test]
    #[should_panic]
    fn test_segment_shape_mismatch() {
        BoundarySegment::new(BoundaryKind::NormalFlux(4), vec![1], vec![1.0]);
    }

    #[test]
    fn test_node_lookup() {
        let node = |id: usize| Node {
            id,
            x: id as f64,
            y: 0.0,
            z: 0.0,
        };
        let mesh = Mesh::from_raw_parts(
            String::from("m"),
            vec![node(1), node(2), node(5)],
            vec![],
            vec![],
        );
        assert_eq!(mesh.node(2).unwrap().x, 2.0);
        assert_eq!(mesh.node(5).unwrap().x, 5.0);
        assert!(mesh.node(0).is_none());
        assert!(mesh.node(3).is_none());
    }

    #[test]
    fn test_depth_range() {
        assert_eq!(Mesh::default().depth_range(), None);
        let mesh: Mesh = "m\n0 3\n1 0 0 4.5\n2 0 0 -1.0\n3 0 0 2\n".parse().unwrap();
        assert_eq!(mesh.depth_range(), Some((-1.0, 4.5)));
    }

    #[test]
    fn test_oversized_id() {
        let mesh: Mesh = "a mesh title that is way too long\n0 0\n".parse().unwrap();
        assert!(mesh.id_is_oversized());
        let mesh: Mesh = "short title             \n0 0\n".parse().unwrap();
        assert!(!mesh.id_is_oversized());
    }
}
