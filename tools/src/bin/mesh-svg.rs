use anyhow::Context as _;
use anyhow::Result;
use fort14::geometry::BoundingBox;
use fort14::BoundaryKind;
use fort14::Mesh;
use fort14::MeshGeometry;
use fort14::Point2D;
use rayon::iter::IntoParallelRefIterator as _;
use rayon::iter::ParallelIterator as _;
use std::io;

const USAGE: &str = "Usage: mesh-svg [options] [in-mesh [out-svg]] <in.14 >out.svg";

/// Returns the coordinates from a path and removes redundant nodes.
fn simplify(path: &[Point2D]) -> Vec<Point2D> {
    fn are_aligned(p1: Point2D, p2: Point2D, p3: Point2D) -> bool {
        const EPSILON: f64 = 1e-9;
        let scale = (p3 - p1).norm() * (p2 - p1).norm();
        f64::abs((p2 - p1).perp(&(p3 - p1))) <= EPSILON * scale
    }

    let mut coords: Vec<Point2D> = Vec::with_capacity(path.len());
    for p in path {
        let len = coords.len();
        if 2 <= len && are_aligned(coords[len - 2], coords[len - 1], *p) {
            coords[len - 1] = *p;
            continue;
        }
        coords.push(*p);
    }
    coords
}

fn segment_color(kind: BoundaryKind) -> &'static str {
    match kind {
        BoundaryKind::Elevation => "#1f77b4",
        BoundaryKind::NormalFlux(code) => match fort14::RecordShape::from_code(code) {
            Some(shape) if shape.field_count() == 0 => "#2ca02c",
            Some(_) => "#d62728",
            None => "#7f7f7f",
        },
    }
}

fn write_svg<W>(mut w: W, mesh: Mesh) -> Result<()>
where
    W: io::Write,
{
    let bb = match BoundingBox::from_points(
        mesh.nodes()
            .par_iter()
            .map(|node| Point2D::new(node.x, node.y)),
    ) {
        Some(v) => v,
        None => return Ok(()),
    };
    let xmin = bb.p_min.x;
    let ymin = bb.p_min.y;
    let ymax = bb.p_max.y;
    let width = bb.width();
    let height = bb.height();
    let stroke = f64::max(width, height) / 500.0;
    writeln!(
        w,
        r#"<svg viewBox="{xmin} {ymin} {width} {height}" xmlns="http://www.w3.org/2000/svg">"#,
    )?;

    let assembled =
        fort14::assemble::derive(mesh, &MeshGeometry).context("failed to derive geometry")?;

    write!(w, "<path fill=\"#dddddd\" fill-rule=\"evenodd\" d=\"")?;
    for ring in assembled.outline.rings() {
        let coords = simplify(ring.points());
        let (first, rest) = match coords.split_first() {
            Some(v) => v,
            None => continue,
        };
        write!(w, " M{},{} L", first.x, ymax - first.y + ymin)?;
        for p in rest {
            write!(w, "{},{} ", p.x, ymax - p.y + ymin)?;
        }
        write!(w, "Z")?;
    }
    writeln!(w, "\"/>")?;

    let mesh = &assembled.mesh;
    for segment in mesh.boundary_segments() {
        let points: Vec<Point2D> = segment
            .nodes()
            .iter()
            .filter_map(|id| mesh.node(*id))
            .map(|node| Point2D::new(node.x, node.y))
            .collect();
        let coords = simplify(&points);
        if coords.len() < 2 {
            continue;
        }
        write!(
            w,
            "<polyline fill=\"none\" stroke=\"{}\" stroke-width=\"{stroke}\" points=\"",
            segment_color(segment.kind()),
        )?;
        for p in coords {
            write!(w, "{},{} ", p.x, ymax - p.y + ymin)?;
        }
        writeln!(w, "\"/>")?;
    }

    writeln!(w, "</svg>")?;

    Ok(())
}

fn main() -> Result<()> {
    let options = getopts::Options::new();

    let matches = fort14_tools::parse_args(options, USAGE, 2)?;
    let _chrome_trace_guard = fort14_tools::init_tracing(None);

    let mesh = fort14_tools::read_mesh(matches.free.get(0), &fort14::Options::default())?;
    let output = fort14_tools::writer(matches.free.get(1))?;
    write_svg(output, mesh)?;

    Ok(())
}
