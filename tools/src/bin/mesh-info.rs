use anyhow::Context as _;
use anyhow::Result;
use fort14::BoundaryKind;
use fort14::Mesh;
use fort14::MeshGeometry;
use itertools::Itertools as _;
use std::io;
use std::io::Write as _;

const USAGE: &str = "Usage: mesh-info [options] [in-mesh [out-info]] <in.14 >out.txt";

fn write_boundaries(mut w: impl io::Write, mesh: &Mesh) -> Result<()> {
    writeln!(w, "boundary segments: {}", mesh.boundary_segments().len())?;

    let elevation_nodes: usize = mesh.elevation_segments().map(|s| s.len()).sum();
    writeln!(
        w,
        "  elevation: {} segments, {} nodes",
        mesh.elevation_segments().count(),
        elevation_nodes,
    )?;

    let by_code = mesh
        .flux_segments()
        .filter_map(|segment| match segment.kind() {
            BoundaryKind::NormalFlux(code) => Some((code, segment.len())),
            BoundaryKind::Elevation => None,
        })
        .into_group_map();
    for (code, lengths) in by_code.into_iter().sorted_unstable_by_key(|(code, _)| *code) {
        let class = match fort14::RecordShape::from_code(code) {
            Some(shape) => shape.class().to_string(),
            None => String::from("unknown"),
        };
        writeln!(
            w,
            "  flux type {code} ({class}): {} segments, {} nodes",
            lengths.len(),
            lengths.iter().sum::<usize>(),
        )?;
    }

    Ok(())
}

fn write_geometry(mut w: impl io::Write, mesh: Mesh) -> Result<()> {
    let assembled =
        fort14::assemble::derive(mesh, &MeshGeometry).context("failed to derive geometry")?;
    let triangulation = &assembled.triangulation;
    let outline = &assembled.outline;

    if let Some(bb) = triangulation.bounding_box() {
        writeln!(
            w,
            "bounding box: ({}, {}) - ({}, {})",
            bb.p_min.x, bb.p_min.y, bb.p_max.x, bb.p_max.y,
        )?;
    }
    writeln!(w, "area: {}", triangulation.area())?;
    writeln!(
        w,
        "clockwise triangles: {}",
        triangulation.clockwise_count()
    )?;
    writeln!(
        w,
        "degenerate triangles: {}",
        triangulation.degenerate_count()
    )?;
    writeln!(
        w,
        "outline: {} nodes, {} islands, enclosed area {}",
        outline.outer().nodes().len(),
        outline.islands().len(),
        outline.area(),
    )?;

    let dual = fort14::topology::dual_graph(triangulation);
    let boundary_elements = fort14::topology::boundary_elements(dual.view());
    writeln!(
        w,
        "dual graph: {} edges, {} elements on the boundary",
        dual.nnz() / 2,
        boundary_elements.len(),
    )?;

    Ok(())
}

fn main() -> Result<()> {
    let mut options = getopts::Options::new();
    options.optflag("B", "no-boundary", "do not read the boundary section");
    options.optflag("", "no-check", "do not check boundary node totals");
    options.optflag(
        "",
        "barrier-back-nodes",
        "count internal barrier back nodes in the normal flux total",
    );
    options.optflag("g", "geometry", "also print triangulation statistics");
    options.optopt("t", "trace", "emit a chrome trace", "FILE");

    let matches = fort14_tools::parse_args(options, USAGE, 2)?;
    let _chrome_trace_guard = fort14_tools::init_tracing(matches.opt_str("t"));

    let parse_options = fort14::Options {
        boundary: !matches.opt_present("B"),
        check_boundary_totals: !matches.opt_present("no-check"),
        count_barrier_back_nodes: matches.opt_present("barrier-back-nodes"),
    };
    let mesh = fort14_tools::read_mesh(matches.free.get(0), &parse_options)?;
    let mut output = fort14_tools::writer(matches.free.get(1))?;

    writeln!(output, "id: {}", mesh.id().trim_end())?;
    writeln!(output, "nodes: {}", mesh.node_count())?;
    writeln!(output, "elements: {}", mesh.element_count())?;
    if let Some((min, max)) = mesh.depth_range() {
        writeln!(output, "depth: {min} to {max}")?;
    }
    if parse_options.boundary {
        write_boundaries(&mut output, &mesh)?;
    }
    if matches.opt_present("g") {
        write_geometry(&mut output, mesh)?;
    }

    Ok(())
}
