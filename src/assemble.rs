//! Reading a mesh together with its derived geometry.

use crate::geometry::Geometry;
use crate::parser;
use crate::parser::Options;
use crate::progress::ProgressReporter;
use crate::Mesh;
use std::error;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum AssembleError<E> {
    Parse(parser::Error),
    Geometry(E),
}

impl<E: fmt::Display> fmt::Display for AssembleError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssembleError::Parse(err) => write!(f, "failed to parse mesh: {}", err),
            AssembleError::Geometry(err) => write!(f, "failed to derive geometry: {}", err),
        }
    }
}

impl<E> error::Error for AssembleError<E>
where
    E: error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            AssembleError::Parse(err) => Some(err),
            AssembleError::Geometry(err) => Some(err),
        }
    }
}

impl<E> From<parser::Error> for AssembleError<E> {
    fn from(err: parser::Error) -> Self {
        AssembleError::Parse(err)
    }
}

/// A parsed mesh and the geometry derived from it.
///
/// The triangulation and the outline are not stored in the [`Mesh`]; only
/// the geometry collaborator can rebuild them.
pub struct Assembled<G: Geometry> {
    pub mesh: Mesh,
    pub triangulation: G::Triangulation,
    pub outline: G::Outline,
}

impl<G> fmt::Debug for Assembled<G>
where
    G: Geometry,
    G::Triangulation: fmt::Debug,
    G::Outline: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assembled")
            .field("mesh", &self.mesh)
            .field("triangulation", &self.triangulation)
            .field("outline", &self.outline)
            .finish()
    }
}

/// Runs `geometry` on an already parsed mesh.
pub fn derive<G: Geometry>(mesh: Mesh, geometry: &G) -> Result<Assembled<G>, G::Error> {
    let (triangulation, outline) = geometry.derive(mesh.nodes(), mesh.elements())?;
    Ok(Assembled {
        mesh,
        triangulation,
        outline,
    })
}

/// Parses a mesh, then derives its triangulation and outline.
///
/// No partial result is returned: either side failing fails the whole.
pub fn assemble<R, G, P>(
    input: R,
    options: &Options,
    geometry: &G,
    progress: &mut P,
) -> Result<Assembled<G>, AssembleError<G::Error>>
where
    R: io::BufRead,
    G: Geometry,
    P: ProgressReporter + ?Sized,
{
    let mesh = parser::parse_mesh_with(input, options, progress)?;
    derive(mesh, geometry).map_err(AssembleError::Geometry)
}
