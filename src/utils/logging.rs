use tracing::Level;

/// Install the stderr subscriber used for diagnostics.
///
/// Results go to stdout; everything logged here goes to stderr so
/// `--json` output stays machine-readable.
pub(crate) fn init_logging(debug: bool, quiet: bool) {
    let level = if debug {
        Level::DEBUG
    } else if quiet {
        Level::ERROR
    } else {
        Level::WARN
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
