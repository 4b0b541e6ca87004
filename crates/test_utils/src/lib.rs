#![deny(missing_docs)]
//! Test utilities to help with testing zkvote.

use rand::RngCore;

pub mod id;
pub mod noop_discovery;

/// Enable tracing with the RUST_LOG environment variable.
///
/// This is intended to be used in tests, so it defaults to DEBUG level.
pub fn enable_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::DEBUG.into())
                .from_env_lossy(),
        )
        .try_init();
}

/// Create random bytes of a specified length.
pub fn random_bytes(length: u16) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let mut bytes = vec![0; length as usize];
    rng.fill_bytes(&mut bytes);
    bytes
}

/// Repeatedly run a check until it breaks or returns, or a timeout elapses.
///
/// - `iter_check!(timeout_ms, sleep_ms, { .. })`
/// - `iter_check!(timeout_ms, { .. })` sleeps 1ms between iterations.
/// - `iter_check!({ .. })` times out after 1s.
///
/// Use `break` to finish a check with no value, or `return value` to
/// make the whole macro evaluate to `value`. Panics on timeout.
#[macro_export]
macro_rules! iter_check {
    ($timeout_ms:expr, $sleep_ms:expr, $code:block) => {
        tokio::time::timeout(
            std::time::Duration::from_millis($timeout_ms),
            async {
                loop {
                    tokio::time::sleep(std::time::Duration::from_millis(
                        $sleep_ms,
                    ))
                    .await;

                    $code
                }
            },
        )
        .await
        .expect("iter_check timed out")
    };
    ($timeout_ms:expr, $code:block) => {
        $crate::iter_check!($timeout_ms, 1, $code)
    };
    ($code:block) => {
        $crate::iter_check!(1000, $code)
    };
}
