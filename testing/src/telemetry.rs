//! Log output for test processes.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs a subscriber that writes through libtest's captured output.
///
/// Honors `RUST_LOG`, defaulting to `info`. Safe to call from every test;
/// only the first call in a process installs anything.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_test_tracing();
        init_test_tracing();
        tracing::info!("still logging");
    }
}
