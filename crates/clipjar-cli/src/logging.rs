use tracing_subscriber::{fmt, EnvFilter};

/// Env var checked before `RUST_LOG`.
pub const LOG_ENV: &str = "CLIPJAR_LOG";

fn env_directives() -> Option<String> {
    [LOG_ENV, "RUST_LOG"].iter().find_map(|var| {
        std::env::var(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
    })
}

/// Picks the filter directives. `-v` beats the environment, except for
/// commands that own the terminal (`quiet`): those only log when a filter is
/// named explicitly in the environment.
fn directives(verbose: u8, quiet: bool, env: Option<String>) -> String {
    if quiet {
        return env.unwrap_or_else(|| "off".into());
    }
    match (verbose, env) {
        (0, Some(env)) => env,
        (0, None) => "warn".into(),
        (1, _) => "debug".into(),
        _ => "trace".into(),
    }
}

/// Installs the stderr subscriber.
pub fn init(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_new(directives(verbose, quiet, env_directives()))
        .unwrap_or_else(|_| EnvFilter::new(if quiet { "off" } else { "warn" }));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 1)
        .try_init();
}
