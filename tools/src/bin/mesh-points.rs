use anyhow::Result;
use fort14::Mesh;
use std::collections::HashSet;
use std::io;

const USAGE: &str = "Usage: mesh-points [options] [in-mesh [out-plot]] <in.14 >out.plot";

fn write_points(
    mut w: impl io::Write,
    mesh: &Mesh,
    with_ids: bool,
    boundary_only: bool,
) -> Result<()> {
    let boundary_nodes: HashSet<usize> = mesh
        .boundary_segments()
        .iter()
        .flat_map(|segment| segment.nodes())
        .copied()
        .collect();

    for node in mesh.nodes() {
        if boundary_only && !boundary_nodes.contains(&node.id) {
            continue;
        }
        if with_ids {
            write!(w, "{} ", node.id)?;
        }
        writeln!(w, "{} {} {}", node.x, node.y, node.z)?;
    }

    Ok(())
}

fn main() -> Result<()> {
    let mut options = getopts::Options::new();
    options.optflag("", "with-ids", "prefix each line with the node id");
    options.optflag("b", "boundary", "only print nodes on a boundary segment");

    let matches = fort14_tools::parse_args(options, USAGE, 2)?;
    let _chrome_trace_guard = fort14_tools::init_tracing(None);

    let boundary_only = matches.opt_present("b");
    let parse_options = fort14::Options {
        boundary: boundary_only,
        ..fort14::Options::default()
    };
    let mesh = fort14_tools::read_mesh(matches.free.get(0), &parse_options)?;
    let output = fort14_tools::writer(matches.free.get(1))?;
    write_points(output, &mesh, matches.opt_present("with-ids"), boundary_only)?;

    Ok(())
}
