//! Geometric artifacts derived from node coordinates and element
//! connectivity: the triangulation itself and the outline of the domain.

use crate::Element;
use crate::Node;
use itertools::Itertools as _;
use nalgebra::Vector2;
use rayon::prelude::*;
use std::collections::HashMap;
use std::error;
use std::fmt;

pub type Point2D = Vector2<f64>;

/// Builds derived geometry out of a mesh's nodes and elements.
pub trait Geometry {
    type Triangulation;
    type Outline;
    type Error: error::Error;

    fn derive(
        &self,
        nodes: &[Node],
        elements: &[Element],
    ) -> Result<(Self::Triangulation, Self::Outline), Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// An element references a node id that is not in the node list.
    UnknownNode { element: usize, node: usize },
    /// There is no triangle or no boundary edge to draw an outline around.
    DegenerateMesh,
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::UnknownNode { element, node } => {
                write!(f, "element {} references unknown node {}", element, node)
            }
            GeometryError::DegenerateMesh => write!(f, "mesh has no boundary"),
        }
    }
}

impl error::Error for GeometryError {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub p_min: Point2D,
    pub p_max: Point2D,
}

impl BoundingBox {
    /// Returns `None` when `points` is empty.
    pub fn from_points<P>(points: P) -> Option<Self>
    where
        P: IntoParallelIterator<Item = Point2D>,
    {
        points
            .into_par_iter()
            .map(|p| BoundingBox { p_min: p, p_max: p })
            .reduce_with(BoundingBox::union)
    }

    pub fn union(self, other: BoundingBox) -> BoundingBox {
        BoundingBox {
            p_min: self.p_min.inf(&other.p_min),
            p_max: self.p_max.sup(&other.p_max),
        }
    }

    pub fn width(&self) -> f64 {
        self.p_max.x - self.p_min.x
    }

    pub fn height(&self) -> f64 {
        self.p_max.y - self.p_min.y
    }

    pub fn contains(&self, p: Point2D) -> bool {
        self.p_min.x <= p.x && p.x <= self.p_max.x && self.p_min.y <= p.y && p.y <= self.p_max.y
    }
}

fn signed_area(a: Point2D, b: Point2D, c: Point2D) -> f64 {
    0.5 * (b - a).perp(&(c - a))
}

/// Triangles of a mesh, expressed as indices into its point list.
#[derive(Debug, Clone)]
pub struct Triangulation {
    points: Vec<Point2D>,
    triangles: Vec<[usize; 3]>,
    signed_areas: Vec<f64>,
}

impl Triangulation {
    pub fn new(nodes: &[Node], elements: &[Element]) -> Result<Self, GeometryError> {
        let index: HashMap<usize, usize> = nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id, idx))
            .collect();
        let points: Vec<Point2D> = nodes
            .iter()
            .map(|node| Point2D::new(node.x, node.y))
            .collect();

        let triangles = elements
            .iter()
            .map(|element| -> Result<[usize; 3], GeometryError> {
                let mut triangle = [0; 3];
                for (idx, id) in triangle.iter_mut().zip(element.vertices) {
                    *idx = *index.get(&id).ok_or(GeometryError::UnknownNode {
                        element: element.id,
                        node: id,
                    })?;
                }
                Ok(triangle)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let signed_areas = triangles
            .par_iter()
            .map(|&[a, b, c]| signed_area(points[a], points[b], points[c]))
            .collect();

        Ok(Triangulation {
            points,
            triangles,
            signed_areas,
        })
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    /// Vertex indices of each triangle, in element order.
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Positive for counter-clockwise triangles.
    pub fn signed_areas(&self) -> &[f64] {
        &self.signed_areas
    }

    /// Total area covered by the triangles.
    pub fn area(&self) -> f64 {
        self.signed_areas.par_iter().map(|a| a.abs()).sum()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.points.par_iter().cloned())
    }

    /// Number of triangles whose vertices are (nearly) aligned.
    pub fn degenerate_count(&self) -> usize {
        let scale = match self.bounding_box() {
            Some(bb) => bb.width() * bb.height(),
            None => return 0,
        };
        let epsilon = f64::EPSILON * scale;
        self.signed_areas
            .par_iter()
            .filter(|area| approx::abs_diff_eq!(**area, 0.0, epsilon = epsilon))
            .count()
    }

    /// Number of triangles whose vertices are listed clockwise.
    pub fn clockwise_count(&self) -> usize {
        self.signed_areas.par_iter().filter(|area| **area < 0.0).count()
    }

    /// Edges that belong to exactly one triangle.
    fn boundary_edges(&self) -> Vec<(usize, usize)> {
        let mut counts: HashMap<(usize, usize), usize> = HashMap::new();
        for &[a, b, c] in &self.triangles {
            for (p, q) in [(a, b), (b, c), (c, a)] {
                *counts.entry((usize::min(p, q), usize::max(p, q))).or_insert(0) += 1;
            }
        }
        counts
            .into_iter()
            .filter(|(_edge, count)| *count == 1)
            .map(|(edge, _count)| edge)
            .sorted_unstable()
            .collect()
    }
}

/// A closed path along the boundary of the domain.
#[derive(Debug, Clone)]
pub struct Ring {
    nodes: Vec<usize>,
    points: Vec<Point2D>,
    signed_area: f64,
}

impl Ring {
    fn new(nodes: Vec<usize>, all_points: &[Point2D]) -> Ring {
        let points: Vec<Point2D> = nodes.iter().map(|n| all_points[*n]).collect();
        let signed_area = 0.5
            * points
                .iter()
                .circular_tuple_windows()
                .map(|(p, q)| p.perp(q))
                .sum::<f64>();
        Ring {
            nodes,
            points,
            signed_area,
        }
    }

    fn reverse(&mut self) {
        self.nodes.reverse();
        self.points.reverse();
        self.signed_area = -self.signed_area;
    }

    /// Point indices, without repeating the first one at the end.
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    /// Positive when the ring runs counter-clockwise.
    pub fn signed_area(&self) -> f64 {
        self.signed_area
    }
}

/// Removes the edge `from`-`to` from the graph and returns `to`.
fn take_edge(neighbors: &mut HashMap<usize, Vec<usize>>, from: usize) -> Option<usize> {
    let to = neighbors.get_mut(&from)?.pop()?;
    if let Some(back) = neighbors.get_mut(&to) {
        if let Some(pos) = back.iter().position(|n| *n == from) {
            back.swap_remove(pos);
        }
    }
    Some(to)
}

/// The outline of a triangulated domain: one outer ring and zero or more
/// islands.
///
/// The outer ring runs counter-clockwise, islands run clockwise.
#[derive(Debug, Clone)]
pub struct BoundaryOutline {
    rings: Vec<Ring>,
}

impl BoundaryOutline {
    pub fn new(triangulation: &Triangulation) -> Result<Self, GeometryError> {
        if triangulation.triangles.is_empty() {
            return Err(GeometryError::DegenerateMesh);
        }

        let mut neighbors: HashMap<usize, Vec<usize>> = HashMap::new();
        for (a, b) in triangulation.boundary_edges() {
            neighbors.entry(a).or_default().push(b);
            neighbors.entry(b).or_default().push(a);
        }

        let mut paths = Vec::new();
        for start in neighbors.keys().copied().sorted_unstable().collect::<Vec<_>>() {
            while let Some(mut current) = take_edge(&mut neighbors, start) {
                let mut path = vec![start];
                while current != start {
                    path.push(current);
                    current = match take_edge(&mut neighbors, current) {
                        Some(v) => v,
                        None => break,
                    };
                }
                paths.push(path);
            }
        }

        let mut rings: Vec<Ring> = paths
            .into_iter()
            .map(|path| Ring::new(path, &triangulation.points))
            .collect();
        if rings.is_empty() {
            // Every edge is shared, e.g. by duplicated triangles.
            return Err(GeometryError::DegenerateMesh);
        }
        rings.sort_by(|r1, r2| f64::total_cmp(&r2.signed_area.abs(), &r1.signed_area.abs()));
        for (i, ring) in rings.iter_mut().enumerate() {
            let is_outer = i == 0;
            if is_outer != (0.0 < ring.signed_area) {
                ring.reverse();
            }
        }

        Ok(BoundaryOutline { rings })
    }

    /// All rings, the outer one first, then islands by decreasing area.
    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn outer(&self) -> &Ring {
        &self.rings[0]
    }

    pub fn islands(&self) -> &[Ring] {
        &self.rings[1..]
    }

    /// Area enclosed by the outer ring minus the islands.
    pub fn area(&self) -> f64 {
        self.rings.iter().map(Ring::signed_area).sum()
    }
}

/// Derives the [`Triangulation`] and [`BoundaryOutline`] of a mesh.
#[derive(Debug, Default, Clone, Copy)]
pub struct MeshGeometry;

impl Geometry for MeshGeometry {
    type Triangulation = Triangulation;
    type Outline = BoundaryOutline;
    type Error = GeometryError;

    fn derive(
        &self,
        nodes: &[Node],
        elements: &[Element],
    ) -> Result<(Triangulation, BoundaryOutline), GeometryError> {
        let _span = tracing::info_span!("derive geometry").entered();
        let triangulation = Triangulation::new(nodes, elements)?;
        let outline = BoundaryOutline::new(&triangulation)?;
        tracing::debug!(
            area = triangulation.area(),
            rings = outline.rings().len(),
            "derived geometry"
        );
        Ok((triangulation, outline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn node(id: usize, x: f64, y: f64) -> Node {
        Node { id, x, y, z: 0.0 }
    }

    fn element(id: usize, vertices: [usize; 3]) -> Element {
        Element { id, vertices }
    }

    /// A 4x4 grid of unit squares with the middle square left out.
    ///
    /// Node ids are `1 + x + 5 * y`.
    fn grid_with_hole() -> (Vec<Node>, Vec<Element>) {
        let mut nodes = Vec::new();
        for y in 0..5 {
            for x in 0..5 {
                nodes.push(node(1 + x + 5 * y, x as f64, y as f64));
            }
        }
        let mut elements = Vec::new();
        for y in 0..4 {
            for x in 0..4 {
                if (x, y) == (1, 1) || (x, y) == (2, 1) || (x, y) == (1, 2) || (x, y) == (2, 2) {
                    continue;
                }
                let n = 1 + x + 5 * y;
                let id = elements.len() + 1;
                elements.push(element(id, [n, n + 1, n + 6]));
                elements.push(element(id + 1, [n, n + 6, n + 5]));
            }
        }
        (nodes, elements)
    }

    #[test]
    fn test_bounding_box() {
        let points = vec![
            Point2D::new(-1.0, 2.0),
            Point2D::new(3.0, -4.0),
            Point2D::new(0.5, 0.5),
        ];
        let bb = BoundingBox::from_points(points.par_iter().cloned()).unwrap();
        assert_eq!(bb.p_min, Point2D::new(-1.0, -4.0));
        assert_eq!(bb.p_max, Point2D::new(3.0, 2.0));
        assert!(bb.contains(Point2D::new(0.0, 0.0)));
        assert!(!bb.contains(Point2D::new(4.0, 0.0)));
        assert!(BoundingBox::from_points(Vec::<Point2D>::new()).is_none());
    }

    #[test]
    fn test_triangulation() {
        let nodes = vec![
            node(1, 0.0, 0.0),
            node(2, 1.0, 0.0),
            node(3, 1.0, 1.0),
            node(4, 0.0, 1.0),
        ];
        let elements = vec![element(1, [1, 2, 3]), element(2, [1, 4, 3])];
        let triangulation = Triangulation::new(&nodes, &elements).unwrap();
        assert_eq!(triangulation.triangles(), &[[0, 1, 2], [0, 3, 2]]);
        assert_relative_eq!(triangulation.signed_areas()[0], 0.5);
        assert_relative_eq!(triangulation.signed_areas()[1], -0.5);
        assert_relative_eq!(triangulation.area(), 1.0);
        assert_eq!(triangulation.clockwise_count(), 1);
        assert_eq!(triangulation.degenerate_count(), 0);
    }

    #[test]
    fn test_unknown_node() {
        let nodes = vec![node(1, 0.0, 0.0), node(2, 1.0, 0.0), node(3, 1.0, 1.0)];
        let elements = vec![element(7, [1, 2, 9])];
        let err = Triangulation::new(&nodes, &elements).unwrap_err();
        assert_eq!(err, GeometryError::UnknownNode { element: 7, node: 9 });
    }

    #[test]
    fn test_degenerate() {
        let nodes = vec![node(1, 0.0, 0.0), node(2, 1.0, 0.0), node(3, 2.0, 0.0)];
        let elements = vec![element(1, [1, 2, 3])];
        let triangulation = Triangulation::new(&nodes, &elements).unwrap();
        assert_eq!(triangulation.degenerate_count(), 1);

        let triangulation = Triangulation::new(&nodes, &[]).unwrap();
        assert!(matches!(
            BoundaryOutline::new(&triangulation),
            Err(GeometryError::DegenerateMesh)
        ));
    }

    #[test]
    fn test_duplicate_triangles() {
        let nodes = vec![node(1, 0.0, 0.0), node(2, 1.0, 0.0), node(3, 0.0, 1.0)];
        let elements = vec![element(1, [1, 2, 3]), element(2, [1, 2, 3])];
        let triangulation = Triangulation::new(&nodes, &elements).unwrap();
        assert!(matches!(
            BoundaryOutline::new(&triangulation),
            Err(GeometryError::DegenerateMesh)
        ));
        assert!(MeshGeometry.derive(&nodes, &elements).is_err());
    }

    #[test]
    fn test_outline_with_island() {
        let (nodes, elements) = grid_with_hole();
        let (triangulation, outline) = MeshGeometry.derive(&nodes, &elements).unwrap();
        assert_relative_eq!(triangulation.area(), 12.0);

        assert_eq!(outline.rings().len(), 2);
        assert_eq!(outline.outer().nodes().len(), 16);
        assert_relative_eq!(outline.outer().signed_area(), 16.0);
        assert_eq!(outline.islands().len(), 1);
        assert_eq!(outline.islands()[0].nodes().len(), 8);
        assert_relative_eq!(outline.islands()[0].signed_area(), -4.0);
        assert_relative_eq!(outline.area(), triangulation.area());
    }

    #[test]
    fn test_outline_ignores_orientation() {
        let (nodes, mut elements) = grid_with_hole();
        for element in elements.iter_mut().step_by(3) {
            element.vertices.swap(1, 2);
        }
        let (triangulation, outline) = MeshGeometry.derive(&nodes, &elements).unwrap();
        assert!(0 < triangulation.clockwise_count());
        assert_eq!(outline.rings().len(), 2);
        assert_relative_eq!(outline.area(), 12.0);
    }
}
