//! The boundary section of a fort.14 file: open (elevation) boundaries first,
//! then normal-flux boundaries whose per-node record layout depends on an
//! integer type code.

use super::cursor::parse_float;
use super::parse_index;
use super::ErrorKind;
use super::Options;
use super::Reader;
use super::Stage;
use crate::BoundaryKind;
use crate::BoundarySegment;
use std::fmt;
use std::io;

/// What a normal-flux boundary type code stands for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BoundaryClass {
    NoNormalFlow,
    NonZeroNormalFlow,
    ExternalBarrier,
    SpecialBarrier,
    InternalBarrier,
    InternalBarrierWithPipe,
}

impl BoundaryClass {
    pub const ALL: [BoundaryClass; 6] = [
        BoundaryClass::NoNormalFlow,
        BoundaryClass::NonZeroNormalFlow,
        BoundaryClass::ExternalBarrier,
        BoundaryClass::SpecialBarrier,
        BoundaryClass::InternalBarrier,
        BoundaryClass::InternalBarrierWithPipe,
    ];

    /// The type codes that map to this class.
    pub fn codes(self) -> &'static [i32] {
        match self {
            BoundaryClass::NoNormalFlow => &[0, 1, 10, 11, 20, 21, 30],
            BoundaryClass::NonZeroNormalFlow => &[2, 102, 12, 112, 22, 122, 52],
            BoundaryClass::ExternalBarrier => &[3, 13, 23],
            BoundaryClass::SpecialBarrier => &[18],
            BoundaryClass::InternalBarrier => &[4, 24],
            BoundaryClass::InternalBarrierWithPipe => &[5, 25],
        }
    }

    /// Names of the numbers that follow the node id in each record.
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            BoundaryClass::NoNormalFlow | BoundaryClass::NonZeroNormalFlow => &[],
            BoundaryClass::ExternalBarrier => &["barrier_height", "subcritical_coefficient"],
            BoundaryClass::SpecialBarrier => &["barrier_coefficient"],
            BoundaryClass::InternalBarrier => &[
                "back_node",
                "barrier_height",
                "subcritical_coefficient",
                "supercritical_coefficient",
            ],
            BoundaryClass::InternalBarrierWithPipe => &[
                "back_node",
                "barrier_height",
                "subcritical_coefficient",
                "supercritical_coefficient",
                "pipe_height",
                "pipe_coefficient",
                "pipe_diameter",
            ],
        }
    }
}

impl fmt::Display for BoundaryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BoundaryClass::NoNormalFlow => "no normal flow",
            BoundaryClass::NonZeroNormalFlow => "non-zero normal flow",
            BoundaryClass::ExternalBarrier => "external barrier",
            BoundaryClass::SpecialBarrier => "special barrier",
            BoundaryClass::InternalBarrier => "internal barrier",
            BoundaryClass::InternalBarrierWithPipe => "internal barrier with pipe",
        };
        f.write_str(name)
    }
}

/// Layout of one record of a normal-flux boundary segment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordShape {
    class: BoundaryClass,
}

impl RecordShape {
    /// Looks up the record layout of a normal-flux boundary type code.
    ///
    /// Returns `None` for codes that are not part of the format.
    pub fn from_code(code: i32) -> Option<RecordShape> {
        let class = match code {
            0 | 1 | 10 | 11 | 20 | 21 | 30 => BoundaryClass::NoNormalFlow,
            2 | 102 | 12 | 112 | 22 | 122 | 52 => BoundaryClass::NonZeroNormalFlow,
            3 | 13 | 23 => BoundaryClass::ExternalBarrier,
            18 => BoundaryClass::SpecialBarrier,
            4 | 24 => BoundaryClass::InternalBarrier,
            5 | 25 => BoundaryClass::InternalBarrierWithPipe,
            _ => return None,
        };
        Some(RecordShape { class })
    }

    pub fn class(self) -> BoundaryClass {
        self.class
    }

    /// Number of floats after the node id.
    pub fn field_count(self) -> usize {
        self.class.labels().len()
    }

    pub fn labels(self) -> &'static [&'static str] {
        self.class.labels()
    }

    /// Whether each record links a front node to a back node.
    ///
    /// See [`Options::count_barrier_back_nodes`].
    pub fn is_paired(self) -> bool {
        matches!(
            self.class,
            BoundaryClass::InternalBarrier | BoundaryClass::InternalBarrierWithPipe
        )
    }
}

/// Reads `(count, total)` from a section header.
///
/// Returns `None` when the stream ends before the header.
fn read_section_header<R: io::BufRead>(
    reader: &mut Reader<R>,
) -> Result<Option<(usize, usize)>, super::Error> {
    if reader.at_eof()? {
        return Ok(None);
    }
    let count = reader.field(parse_index, || ErrorKind::MalformedBoundaryHeader)?;
    reader.cursor.skip_annotation();
    let total = reader.field(parse_index, || ErrorKind::MalformedBoundaryHeader)?;
    reader.cursor.skip_annotation();
    Ok(Some((count, total)))
}

fn check_total<R>(reader: &Reader<R>, declared: usize, found: usize) -> Result<(), super::Error> {
    if declared != found {
        return Err(reader.error(ErrorKind::BoundaryTotalMismatch { declared, found }));
    }
    Ok(())
}

fn read_elevation_segment<R: io::BufRead>(
    reader: &mut Reader<R>,
) -> Result<BoundarySegment, super::Error> {
    let len = reader.field(parse_index, || ErrorKind::MalformedBoundaryHeader)?;
    reader.cursor.skip_annotation();

    let mut nodes = Vec::with_capacity(super::capacity(len));
    for read in 0..len {
        let mismatch = || ErrorKind::SegmentLengthMismatch {
            declared: len,
            read,
        };
        nodes.push(reader.field(parse_index, mismatch)?);
        reader.cursor.skip_annotation();
    }

    Ok(BoundarySegment::new(BoundaryKind::Elevation, nodes, Vec::new()))
}

fn read_flux_segment<R: io::BufRead>(
    reader: &mut Reader<R>,
) -> Result<BoundarySegment, super::Error> {
    let len = reader.field(parse_index, || ErrorKind::MalformedBoundaryHeader)?;
    let code = reader.field(
        |token| token.parse::<i32>().ok(),
        || ErrorKind::MalformedBoundaryHeader,
    )?;
    reader.cursor.skip_annotation();

    let shape = match RecordShape::from_code(code) {
        Some(v) => v,
        None => return Err(reader.error(ErrorKind::UnknownBoundaryType(code))),
    };
    let field_count = shape.field_count();

    let mut nodes = Vec::with_capacity(super::capacity(len));
    let mut data = Vec::with_capacity(super::capacity(len.saturating_mul(field_count)));
    for read in 0..len {
        let mismatch = || ErrorKind::SegmentLengthMismatch {
            declared: len,
            read,
        };
        nodes.push(reader.field(parse_index, mismatch)?);
        for _ in 0..field_count {
            data.push(reader.field(parse_float, mismatch)?);
        }
        reader.cursor.skip_annotation();
    }

    Ok(BoundarySegment::new(
        BoundaryKind::NormalFlux(code),
        nodes,
        data,
    ))
}

/// Reads the elevation section then the normal-flux section.
///
/// A stream that ends right before either section header is read as if the
/// section declared no segment.
pub(super) fn read_boundaries<R: io::BufRead>(
    reader: &mut Reader<R>,
    options: &Options,
) -> Result<Vec<BoundarySegment>, super::Error> {
    let mut segments = Vec::new();

    reader.enter(Stage::ElevationBoundaries);
    let (elevation_count, elevation_total) = read_section_header(reader)?.unwrap_or((0, 0));
    tracing::debug!(elevation_count, elevation_total, "elevation boundary header");
    segments.reserve(super::capacity(elevation_count));
    let mut found = 0;
    for segment in 0..elevation_count {
        reader.record = Some(segment);
        let segment = read_elevation_segment(reader)?;
        found += segment.len();
        segments.push(segment);
    }
    reader.record = None;
    if options.check_boundary_totals {
        check_total(reader, elevation_total, found)?;
    }

    reader.enter(Stage::FluxBoundaries);
    let (flux_count, flux_total) = read_section_header(reader)?.unwrap_or((0, 0));
    tracing::debug!(flux_count, flux_total, "normal flux boundary header");
    segments.reserve(super::capacity(flux_count));
    let mut found = 0;
    for segment in 0..flux_count {
        reader.record = Some(segment);
        let segment = read_flux_segment(reader)?;
        let paired = segment.record_shape().map_or(false, RecordShape::is_paired);
        if paired && options.count_barrier_back_nodes {
            found += 2 * segment.len();
        } else {
            found += segment.len();
        }
        segments.push(segment);
    }
    reader.record = None;
    if options.check_boundary_totals {
        check_total(reader, flux_total, found)?;
    }

    Ok(segments)
}
