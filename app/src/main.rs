use bookshelf_server::{logging, EnvPaths};
use std::process::ExitCode;

fn main() -> ExitCode {
    let env_paths = match EnvPaths::from_env() {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Failed to load environment paths: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let _guard = match logging::init_logging(&env_paths) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging system: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Built after logging so the local-time lookup runs single-threaded
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create Tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(bookshelf_server::run(env_paths)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
