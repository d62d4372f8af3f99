//! Sparse-matrix views of a triangulation's connectivity.

use crate::geometry::Triangulation;
use rayon::iter::IntoParallelIterator as _;
use rayon::iter::ParallelIterator as _;
use sprs::CsMat;
use sprs::CsMatView;
use sprs::TriMat;

/// The element/node incidence matrix of a triangulation.
///
/// Entry `(e, n)` is 1 if and only if node `n` is a vertex of triangle `e`.
pub fn connectivity(triangulation: &Triangulation) -> CsMat<u32> {
    let shape = (
        triangulation.triangles().len(),
        triangulation.points().len(),
    );
    let mut conn = TriMat::with_capacity(shape, 3 * shape.0);
    for (e, triangle) in triangulation.triangles().iter().enumerate() {
        for n in triangle {
            conn.add_triplet(e, *n, 1);
        }
    }
    conn.to_csr()
}

/// Links the triangles that have exactly `shared` vertices in common.
///
/// `conn` is a [`connectivity`] matrix. Entry `(a, b)` of `conn * conn^T`
/// counts the vertices triangles `a` and `b` share, and the diagonal holds
/// 3, so `shared = 2` gives edge neighbors and `shared = 1` gives triangles
/// that touch at a single vertex.
pub fn shared_node_graph(conn: CsMatView<u32>, shared: u32) -> CsMat<f64> {
    let common = &conn * &conn.transpose_view();
    let mut graph = TriMat::new(common.shape());
    for (count, (a, b)) in common.iter() {
        if *count == shared && a != b {
            graph.add_triplet(a, b, 1.0);
        }
    }
    graph.to_csr()
}

/// Triangles that share an edge are neighbors in the dual graph.
pub fn dual_graph(triangulation: &Triangulation) -> CsMat<f64> {
    let _span = tracing::info_span!("dual graph").entered();
    let conn = connectivity(triangulation);
    shared_node_graph(conn.view(), 2)
}

/// Triangles with at least one edge on the boundary of the domain, in
/// increasing order.
pub fn boundary_elements(dual: CsMatView<f64>) -> Vec<usize> {
    (0..dual.outer_dims())
        .into_par_iter()
        .filter(|e| match dual.outer_view(*e) {
            Some(neighbors) => neighbors.nnz() < 3,
            None => false,
        })
        .collect()
}
