use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` filters (default `info`);
/// `RUST_LOG_FORMAT=json` switches to JSON lines. With `to_stderr` the
/// output never touches stdout.
pub fn init_tracing(to_stderr: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let json = std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json");

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
    match (json, to_stderr) {
        (true, true) => builder.json().with_writer(std::io::stderr).init(),
        (true, false) => builder.json().init(),
        (false, true) => builder.with_writer(std::io::stderr).init(),
        (false, false) => builder.init(),
    }
}
