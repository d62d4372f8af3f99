use anyhow::Context as _;
use anyhow::Result;
use fort14::Mesh;
use std::env;
use std::fs;
use std::io;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::Registry;
use tracing_tree::HierarchicalLayer;

/// Parses the command-line arguments, handling `--help` and `--version`.
///
/// Returns an error if more than `max_free_args` positional arguments are
/// given.
pub fn parse_args(
    mut options: getopts::Options,
    usage: &str,
    max_free_args: usize,
) -> Result<getopts::Matches> {
    options.optflag("h", "help", "print this help menu");
    options.optflag("", "version", "print version information");

    let matches = options.parse(env::args().skip(1))?;

    if matches.opt_present("h") {
        println!("{}", options.usage(usage));
        std::process::exit(0);
    }
    if matches.opt_present("version") {
        println!("version: {}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }
    if matches.free.len() > max_free_args {
        anyhow::bail!("too many arguments\n\n{}", options.usage(usage));
    }

    Ok(matches)
}

/// Installs the tracing subscriber, filtered through the `LOG` environment
/// variable, and a chrome trace writer when `trace_file` is set.
///
/// The returned guard must be kept alive until the end of the program for the
/// trace to be complete.
pub fn init_tracing(trace_file: Option<String>) -> Option<tracing_chrome::FlushGuard> {
    let registry = Registry::default().with(EnvFilter::from_env("LOG")).with(
        HierarchicalLayer::new(4)
            .with_thread_ids(true)
            .with_targets(true)
            .with_bracketed_fields(true),
    );
    match trace_file {
        Some(filename) => {
            let (chrome_layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
                .file(filename)
                .build();
            registry.with(chrome_layer).init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

/// Reads a mesh from the given file, or from standard input.
pub fn read_mesh(filename: Option<&String>, options: &fort14::Options) -> Result<Mesh> {
    let mut progress = |phase: &str, fraction: f64| {
        tracing::info!(phase, fraction, "reading mesh");
    };
    let mesh = match filename.map(|f| f.as_str()) {
        None | Some("-") => {
            let stdin = io::stdin();
            let stdin = stdin.lock();
            fort14::parse_mesh_with(stdin, options, &mut progress)
                .context("failed to read mesh from stdin")?
        }
        Some(filename) => {
            let file = fs::File::open(filename)
                .with_context(|| format!("failed to open {filename:?}"))?;
            let file = io::BufReader::new(file);
            fort14::parse_mesh_with(file, options, &mut progress)
                .with_context(|| format!("failed to read mesh from {filename:?}"))?
        }
    };
    Ok(mesh)
}

/// Returns a buffered writer to the given file, or to standard output.
pub fn writer(filename: Option<&String>) -> Result<impl io::Write> {
    let w: Box<dyn io::Write> = match filename.map(|f| f.as_str()) {
        None | Some("-") => Box::new(io::stdout()),
        Some(filename) => Box::new(
            fs::File::create(filename).with_context(|| format!("failed to create {filename:?}"))?,
        ),
    };
    Ok(io::BufWriter::new(w))
}
