use tracing::Level;

/// Installs the global `fmt` subscriber at `level`.
///
/// Accepts any name `tracing::Level` parses (`warn`, `DEBUG`, `3`, ...) and
/// falls back to `info`. Only the first call installs anything.
pub fn init(level: &str) {
    let max = level.trim().parse::<Level>().unwrap_or(Level::INFO);

    let _ = tracing_subscriber::fmt()
        .with_max_level(max)
        .with_target(false)
        .try_init();
}
