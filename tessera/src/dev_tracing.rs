//! Development logging setup.

/// Install a `tracing` subscriber filtered by `RUST_LOG`, if set.
///
/// Tests and demos call `tessera::dev_tracing::init_tracing()` to see the
/// `[SOCKET]`-prefixed debug output. This is a no-op when `RUST_LOG` is not
/// set or a global subscriber is already installed, so calling it from
/// every test is fine.
pub fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
