use colcheck::{Harness, HarnessConfig, ProcessRunner, SUCCESS_MESSAGE, Variant};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const USAGE_EXIT_CODE: i32 = 64;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Harness(colcheck::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Harness(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<colcheck::Error> for CliError {
    fn from(value: colcheck::Error) -> Self {
        Self::Harness(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Default)]
struct Args {
    variant: Variant,
    config: Option<PathBuf>,
    root: Option<PathBuf>,
    passes: Option<u32>,
    engine: Option<String>,
    json: bool,
    pretty: bool,
    verbose: bool,
}

fn usage() -> &'static str {
    "colcheck\n\
\n\
USAGE:\n\
  colcheck [--variant columen|columnspread] [--config <file.yaml>] [--root <dir>] [--passes <n>] [--engine <program>] [--json] [--pretty] [--verbose]\n\
\n\
NOTES:\n\
  - With no arguments the columen demo in the current directory is checked.\n\
  - --config is layered over the selected variant; --passes/--engine override both.\n\
  - Exit codes: 0 pass, 1 mismatch or fatal error, 2 missing document, 64 usage.\n\
  - Set COLCHECK_LOG (e.g. COLCHECK_LOG=debug) to see per-pass progress on stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "--json" => args.json = true,
            "--pretty" => args.pretty = true,
            "--verbose" | "-v" => args.verbose = true,
            "--variant" => {
                let Some(name) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.variant = name
                    .parse::<Variant>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(PathBuf::from(path));
            }
            "--root" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.root = Some(PathBuf::from(path));
            }
            "--passes" => {
                let Some(n) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let n = n.parse::<u32>().map_err(|_| CliError::Usage(usage()))?;
                if n == 0 {
                    return Err(CliError::Usage(usage()));
                }
                args.passes = Some(n);
            }
            "--engine" => {
                let Some(program) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                if program.trim().is_empty() {
                    return Err(CliError::Usage(usage()));
                }
                args.engine = Some(program.trim().to_string());
            }
            _ => return Err(CliError::Usage(usage())),
        }
    }

    Ok(args)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_env("COLCHECK_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false),
        )
        .init();
}

fn run(args: Args) -> Result<(), CliError> {
    let root = match args.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    let mut config = match args.config.as_deref() {
        Some(path) => HarnessConfig::load_over(args.variant.config(), path)?,
        None => args.variant.config(),
    };
    if let Some(passes) = args.passes {
        config.passes = passes;
    }
    if let Some(program) = args.engine {
        config.engine.program = program;
    }
    config.validate()?;

    tracing::debug!(root = %root.display(), variant = %args.variant, "starting check");
    let report = Harness::new(config, root).run(&ProcessRunner)?;

    if args.json {
        let out = if args.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        println!("{out}");
    } else {
        println!("{SUCCESS_MESSAGE}");
    }
    Ok(())
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(USAGE_EXIT_CODE);
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };
    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => {}
        Err(CliError::Harness(err)) => {
            // Mismatches and a missing document get a plain diagnostic; anything else is fatal.
            if err.is_mismatch() || matches!(err, colcheck::Error::MissingInput { .. }) {
                eprintln!("{err}");
            } else {
                eprintln!("error: {err}");
            }
            std::process::exit(err.exit_code());
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
