//! Sequential reader for the fort.14 text format.
//!
//! ```text
//! mesh id                                    (free text)
//! element_count node_count                   (rest of line ignored)
//! node_count x     node_id x y z             (rest of line ignored)
//! element_count x  element_id 3 n1 n2 n3     (rest of line ignored)
//! [elevation boundaries, normal-flux boundaries]
//! ```
//!
//! Each stage consumes exactly the tokens it declares and the next stage
//! starts where the previous one stopped.

use crate::progress::ProgressReporter;
use crate::Element;
use crate::Mesh;
use crate::Node;
use cursor::parse_float;
use cursor::Cursor;
use cursor::CursorError;
use std::error;
use std::fmt;
use std::io;

pub mod boundary;
pub mod cursor;

/// Longest mesh identifier the format allows.
pub const MAX_ID_LEN: usize = 24;

/// Upper bound on the number of items reserved up front from a declared count.
const PREALLOCATION_LIMIT: usize = 1 << 20;

/// Share of the progress range given to nodes and elements when the boundary
/// section is read as well.
const TABULAR_SHARE: f64 = 0.95;

/// The part of the file being read.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    Header,
    Nodes,
    Elements,
    ElevationBoundaries,
    FluxBoundaries,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Header => "header",
            Stage::Nodes => "node list",
            Stage::Elements => "element list",
            Stage::ElevationBoundaries => "elevation boundaries",
            Stage::FluxBoundaries => "normal flux boundaries",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum ErrorKind {
    Io(io::Error),
    InvalidUtf8,
    MalformedHeader,
    TruncatedNodeList { declared: usize, read: usize },
    TruncatedElementList { declared: usize, read: usize },
    MalformedBoundaryHeader,
    SegmentLengthMismatch { declared: usize, read: usize },
    UnknownBoundaryType(i32),
    BoundaryTotalMismatch { declared: usize, found: usize },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Io(err) => write!(f, "io error: {}", err),
            ErrorKind::InvalidUtf8 => write!(f, "stream is not valid UTF-8"),
            ErrorKind::MalformedHeader => write!(f, "missing or non-numeric element/node count"),
            ErrorKind::TruncatedNodeList { declared, read } => {
                write!(f, "expected {} nodes, found {} valid records", declared, read)
            }
            ErrorKind::TruncatedElementList { declared, read } => {
                write!(
                    f,
                    "expected {} elements, found {} valid records",
                    declared, read
                )
            }
            ErrorKind::MalformedBoundaryHeader => {
                write!(f, "missing or non-numeric boundary count")
            }
            ErrorKind::SegmentLengthMismatch { declared, read } => {
                write!(
                    f,
                    "segment declares {} nodes, found {} valid records",
                    declared, read
                )
            }
            ErrorKind::UnknownBoundaryType(code) => write!(f, "unknown boundary type {}", code),
            ErrorKind::BoundaryTotalMismatch { declared, found } => {
                write!(
                    f,
                    "section declares {} boundary nodes, segments hold {}",
                    declared, found
                )
            }
        }
    }
}

impl From<CursorError> for ErrorKind {
    fn from(err: CursorError) -> ErrorKind {
        match err {
            CursorError::UnexpectedEof => ErrorKind::Io(io::ErrorKind::UnexpectedEof.into()),
            CursorError::InvalidUtf8 => ErrorKind::InvalidUtf8,
            CursorError::Io(err) => ErrorKind::Io(err),
        }
    }
}

/// A fatal parsing error, located by stage, record and line.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    stage: Stage,
    record: Option<usize>,
    lineno: usize,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// 0-based index of the node, element or segment being read, if any.
    pub fn record(&self) -> Option<usize> {
        self.record
    }

    /// 1-based line number, 0 if nothing could be read.
    pub fn lineno(&self) -> usize {
        self.lineno
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "in {}", self.stage)?;
        if let Some(record) = self.record {
            write!(f, ", record {}", record)?;
        }
        write!(f, ", at line {}: {}", self.lineno, self.kind)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error {
            kind: ErrorKind::Io(err),
            stage: Stage::Header,
            record: None,
            lineno: 0,
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Parser settings.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Read the boundary section. When unset, nothing past the element list
    /// is read.
    pub boundary: bool,

    /// Check that the segments of each boundary section hold as many nodes
    /// as the section header declares.
    pub check_boundary_totals: bool,

    /// Count each internal barrier record (types 4, 24, 5 and 25) as two
    /// nodes, front and back, when checking the normal-flux total. Some
    /// ADCIRC tools write the total that way.
    pub count_barrier_back_nodes: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            boundary: true,
            check_boundary_totals: true,
            count_barrier_back_nodes: false,
        }
    }
}

pub(crate) fn parse_index(token: &str) -> Option<usize> {
    token.parse().ok()
}

pub(crate) fn capacity(declared: usize) -> usize {
    usize::min(declared, PREALLOCATION_LIMIT)
}

/// A cursor that knows where it is in the file, to locate errors.
pub(crate) struct Reader<R> {
    cursor: Cursor<R>,
    stage: Stage,
    record: Option<usize>,
}

impl<R> Reader<R> {
    fn error(&self, kind: ErrorKind) -> Error {
        Error {
            kind,
            stage: self.stage,
            record: self.record,
            lineno: self.cursor.lineno(),
        }
    }

    fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        self.record = None;
    }
}

impl<R: io::BufRead> Reader<R> {
    pub(crate) fn new(input: R) -> Self {
        Self {
            cursor: Cursor::new(input),
            stage: Stage::Header,
            record: None,
        }
    }

    /// Reads one token and converts it with `parse`.
    ///
    /// A missing or unparsable token is reported as `fail()`, I/O errors as
    /// themselves.
    fn field<T>(
        &mut self,
        parse: impl FnOnce(&str) -> Option<T>,
        fail: impl FnOnce() -> ErrorKind,
    ) -> Result<T, Error> {
        let parsed = match self.cursor.next_token() {
            Ok(token) => Ok(parse(token)),
            Err(err) => Err(err),
        };
        match parsed {
            Ok(Some(v)) => Ok(v),
            Ok(None) | Err(CursorError::UnexpectedEof) => Err(self.error(fail())),
            Err(err) => Err(self.error(err.into())),
        }
    }

    fn at_eof(&mut self) -> Result<bool, Error> {
        self.cursor.at_eof().map_err(|err| self.error(err.into()))
    }
}

struct Header {
    id: String,
    element_count: usize,
    node_count: usize,
}

fn read_header<R: io::BufRead>(reader: &mut Reader<R>) -> Result<Header, Error> {
    reader.enter(Stage::Header);
    let id = match reader.cursor.next_line() {
        Ok(line) => line.to_owned(),
        Err(CursorError::UnexpectedEof) => return Err(reader.error(ErrorKind::MalformedHeader)),
        Err(err) => return Err(reader.error(err.into())),
    };
    if MAX_ID_LEN < id.trim_end().chars().count() {
        tracing::debug!(id = id.as_str(), "mesh id is longer than {MAX_ID_LEN} characters");
    }

    let element_count = reader.field(parse_index, || ErrorKind::MalformedHeader)?;
    let node_count = reader.field(parse_index, || ErrorKind::MalformedHeader)?;
    reader.cursor.skip_line();

    Ok(Header {
        id,
        element_count,
        node_count,
    })
}

fn read_nodes<R: io::BufRead>(reader: &mut Reader<R>, count: usize) -> Result<Vec<Node>, Error> {
    reader.enter(Stage::Nodes);
    let mut nodes = Vec::with_capacity(capacity(count));
    for read in 0..count {
        reader.record = Some(read);
        let truncated = || ErrorKind::TruncatedNodeList {
            declared: count,
            read,
        };
        let id = reader.field(parse_index, truncated)?;
        let x = reader.field(parse_float, truncated)?;
        let y = reader.field(parse_float, truncated)?;
        let z = reader.field(parse_float, truncated)?;
        reader.cursor.skip_line();
        nodes.push(Node { id, x, y, z });
    }
    Ok(nodes)
}

fn read_elements<R: io::BufRead>(
    reader: &mut Reader<R>,
    count: usize,
) -> Result<Vec<Element>, Error> {
    reader.enter(Stage::Elements);
    let mut elements = Vec::with_capacity(capacity(count));
    for read in 0..count {
        reader.record = Some(read);
        let truncated = || ErrorKind::TruncatedElementList {
            declared: count,
            read,
        };
        let id = reader.field(parse_index, truncated)?;
        let _vertex_count = reader.field(parse_index, truncated)?;
        let mut vertices = [0; 3];
        for vertex in &mut vertices {
            *vertex = reader.field(parse_index, truncated)?;
        }
        reader.cursor.skip_line();
        elements.push(Element { id, vertices });
    }
    Ok(elements)
}

/// Parses a fort.14 mesh.
///
/// When `include_boundary_data` is unset, the stream is left right after the
/// element list. `progress` is notified after the node list, after the
/// element list and, when read, after the boundary section.
///
/// Wrapping `input` in a [`std::io::BufReader`] is recommended.
pub fn parse_mesh<R, P>(
    input: R,
    include_boundary_data: bool,
    progress: &mut P,
) -> Result<Mesh, Error>
where
    R: io::BufRead,
    P: ProgressReporter + ?Sized,
{
    let options = Options {
        boundary: include_boundary_data,
        ..Options::default()
    };
    parse_mesh_with(input, &options, progress)
}

/// Like [`parse_mesh`], with explicit [`Options`].
pub fn parse_mesh_with<R, P>(input: R, options: &Options, progress: &mut P) -> Result<Mesh, Error>
where
    R: io::BufRead,
    P: ProgressReporter + ?Sized,
{
    let mut reader = Reader::new(input);

    let header = read_header(&mut reader)?;
    tracing::debug!(
        id = header.id.as_str(),
        nodes = header.node_count,
        elements = header.element_count,
        "read header"
    );

    let tabular_share = if options.boundary { TABULAR_SHARE } else { 1.0 };
    let record_count = header.node_count + header.element_count;
    let node_share = if record_count == 0 {
        0.0
    } else {
        header.node_count as f64 / record_count as f64
    };

    let nodes = {
        let _span = tracing::info_span!("read nodes", count = header.node_count).entered();
        read_nodes(&mut reader, header.node_count)?
    };
    progress.report("nodes", tabular_share * node_share);

    let elements = {
        let _span = tracing::info_span!("read elements", count = header.element_count).entered();
        read_elements(&mut reader, header.element_count)?
    };
    progress.report("elements", tabular_share);

    let boundary_segments = if options.boundary {
        let _span = tracing::info_span!("read boundaries").entered();
        let segments = boundary::read_boundaries(&mut reader, options)?;
        progress.report("boundary", 1.0);
        segments
    } else {
        Vec::new()
    };

    Ok(Mesh::from_raw_parts(
        header.id,
        nodes,
        elements,
        boundary_segments,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = "square
2 4 = NE NP
1 0.0 0.0 -1.0
2 1.0 0.0 -2.0 extra columns
3 1.0 1.0 -3.0
4 0.0 1.0 -4.0
1 3 1 2 3
2 3 1 3 4
";

    #[test]
    fn test_parse() {
        let mesh = parse_mesh(SQUARE.as_bytes(), false, &mut ()).unwrap();
        assert_eq!(mesh.id(), "square");
        assert_eq!(mesh.node_count(), 4);
        assert_eq!(mesh.element_count(), 2);
        assert_eq!(
            mesh.nodes()[1],
            Node {
                id: 2,
                x: 1.0,
                y: 0.0,
                z: -2.0
            }
        );
        assert_eq!(mesh.elements()[1].vertices, [1, 3, 4]);
        assert!(mesh.boundary_segments().is_empty());
    }

    #[test]
    fn test_header_errors() {
        let err = parse_mesh("".as_bytes(), true, &mut ()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MalformedHeader));

        let err = parse_mesh("mesh\n2\n".as_bytes(), true, &mut ()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MalformedHeader));
        assert_eq!(err.stage(), Stage::Header);

        let err = parse_mesh("mesh\nNE NP\n".as_bytes(), true, &mut ()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MalformedHeader));
        assert_eq!(err.lineno(), 2);
    }

    #[test]
    fn test_node_list_non_numeric() {
        let input = "m\n1 3\n1 0 0 0\n2 0 zero 0\n3 0 0 0\n";
        let err = parse_mesh(input.as_bytes(), false, &mut ()).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::TruncatedNodeList {
                declared: 3,
                read: 1
            }
        ));
        assert_eq!(err.record(), Some(1));
        assert_eq!(err.lineno(), 4);
    }

    #[test]
    fn test_element_list_truncated() {
        let input = "m\n2 3\n1 0 0 0\n2 1 0 0\n3 0 1 0\n1 3 1 2 3\n";
        let err = parse_mesh(input.as_bytes(), false, &mut ()).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::TruncatedElementList {
                declared: 2,
                read: 1
            }
        ));
        assert_eq!(err.stage(), Stage::Elements);
    }

    #[test]
    fn test_boundary_opt_out_stops_after_elements() {
        let input = format!("{SQUARE}this is not a boundary section\n");
        let mesh = parse_mesh(input.as_bytes(), false, &mut ()).unwrap();
        assert!(mesh.boundary_segments().is_empty());

        let err = parse_mesh(input.as_bytes(), true, &mut ()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MalformedBoundaryHeader));
    }

    #[test]
    fn test_fortran_exponents() {
        let input = "m\n0 1\n1 1.5D+01 -2.0d0 3.0E-1\n";
        let mesh = parse_mesh(input.as_bytes(), true, &mut ()).unwrap();
        assert_eq!(mesh.nodes()[0].x, 15.0);
        assert_eq!(mesh.nodes()[0].y, -2.0);
    }

    #[test]
    fn test_progress() {
        let mut reports = Vec::new();
        let mut progress = |phase: &str, fraction: f64| reports.push((phase.to_owned(), fraction));
        parse_mesh(SQUARE.as_bytes(), true, &mut progress).unwrap();
        let phases: Vec<&str> = reports.iter().map(|(phase, _)| phase.as_str()).collect();
        assert_eq!(phases, ["nodes", "elements", "boundary"]);
        assert!(reports.windows(2).all(|w| w[0].1 <= w[1].1));
        assert_eq!(reports.last().unwrap().1, 1.0);

        reports.clear();
        let mut progress = |phase: &str, fraction: f64| reports.push((phase.to_owned(), fraction));
        parse_mesh(SQUARE.as_bytes(), false, &mut progress).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].1, 1.0);
    }

    #[test]
    fn test_error_display() {
        let input = "m\n1 3\n1 0 0 0\n";
        let err = parse_mesh(input.as_bytes(), false, &mut ()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "in node list, record 1, at line 3: expected 3 nodes, found 1 valid records",
        );
    }
}
