//! Logging initialization.
//!
//! The crate logs through the `log` facade everywhere; hosts that
//! already own a logger just work. For hosts and demos that do not,
//! `init()` installs an env_logger-backed subscriber once.

use std::sync::Once;

static INIT: Once = Once::new();

/// Install the default env_logger subscriber.
///
/// Respects `RUST_LOG`; defaults to `info`. Safe to call more than once
/// and safe to call when the host has already installed a logger (the
/// second install attempt is ignored).
pub fn init() {
    INIT.call_once(|| {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        log::debug!("logger initialized twice without panicking");
    }
}
