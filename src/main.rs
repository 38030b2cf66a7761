use plume::{
    diagnostics,
    project::{BundledHost, FileSystemHost, RuntimeConfig, SourceFile},
    runtime::Interpreter,
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: plume run <file.plm> [--config <plume.toml>]";

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 || args[1] != "run" {
        eprintln!("{USAGE}");
        process::exit(1);
    }

    let filename = PathBuf::from(&args[2]);
    let explicit_config = match &args[3..] {
        [] => None,
        [flag, path] if flag == "--config" => Some(PathBuf::from(path)),
        _ => {
            eprintln!("{USAGE}");
            process::exit(1);
        }
    };

    let script_dir = filename
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let (config, root) = load_config(explicit_config, &script_dir);
    init_tracing(&config);

    let expected = config.modules.extension.as_str();
    if filename.extension().and_then(|ext| ext.to_str()) != Some(expected) {
        eprintln!("Invalid file extension. Only .{expected} files are allowed.");
        process::exit(1);
    }

    let text = match fs::read_to_string(&filename) {
        Ok(text) => text,
        Err(error) => {
            diagnostics::report_io_error(&filename, &error);
            process::exit(1);
        }
    };

    let mut files = FileSystemHost::from_config(&config, &root);
    files.add_search_path(script_dir);
    let host = BundledHost::new(files, &config);

    let mut interp = match Interpreter::bootstrap(host, &config) {
        Ok(interp) => interp,
        Err(error) => {
            diagnostics::report_runtime_error(&error);
            process::exit(1);
        }
    };

    let source = SourceFile::new(filename.display().to_string(), text);
    if let Err(error) = interp.interpret(source) {
        diagnostics::report_runtime_error(&error);
        process::exit(1);
    }
}

/// An explicit `--config` wins; otherwise look for `plume.toml` next to the
/// script or above it. Search paths are relative to the config's directory.
fn load_config(explicit: Option<PathBuf>, script_dir: &Path) -> (RuntimeConfig, PathBuf) {
    let found = match explicit {
        Some(path) => RuntimeConfig::load(&path).map(|config| Some((path, config))),
        None => RuntimeConfig::discover(script_dir),
    };
    match found {
        Ok(Some((path, config))) => {
            let root = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| script_dir.to_path_buf());
            (config, root)
        }
        Ok(None) => (RuntimeConfig::default(), script_dir.to_path_buf()),
        Err(error) => {
            diagnostics::report_config_error(&error);
            process::exit(1);
        }
    }
}

fn init_tracing(config: &RuntimeConfig) {
    let filter = EnvFilter::try_from_env("PLUME_LOG")
        .unwrap_or_else(|_| EnvFilter::new(config.log.filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
