use kurenai::app::{AppStartupOptions, run_with_startup};
use kurenai::model::AppMode;
use std::path::PathBuf;

#[derive(Debug, Default)]
struct CliArgs {
    dev: bool,
    null_audio: bool,
    paths: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;
    let mode = if args.dev {
        AppMode::Development
    } else {
        AppMode::from_env()
    };

    let _log_guard = kurenai::logging::init_logging(mode)?;

    run_with_startup(AppStartupOptions {
        mode,
        null_audio: args.null_audio,
        initial_paths: args.paths,
    })
    .inspect_err(|err| tracing::error!("fatal: {err:#}"))
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut positional_only = false;
    for arg in args {
        if positional_only {
            out.paths.push(PathBuf::from(arg));
            continue;
        }
        match arg.as_str() {
            "--dev" => out.dev = true,
            "--null-audio" => out.null_audio = true,
            "--" => positional_only = true,
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other if other.starts_with('-') => anyhow::bail!("unknown argument {other}"),
            other => out.paths.push(PathBuf::from(other)),
        }
    }
    Ok(out)
}

fn print_help() {
    println!("KURENAI");
    println!("  [PATH]...         Files or folders to queue at startup");
    println!("  --dev             Development mode (verbose logs, dev asset server)");
    println!("  --null-audio      Run without an audio device");
}
