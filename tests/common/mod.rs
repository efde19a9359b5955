//! Shared test helpers

use std::path::PathBuf;
use std::sync::Once;

use tempfile::TempDir;

static TRACING: Once = Once::new();

/// Install the env-filter subscriber once so RUST_LOG works in tests
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Temp directory plus a database path inside it
pub fn setup_temp_db() -> (TempDir, PathBuf) {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("test.grove");
    (temp_dir, path)
}
