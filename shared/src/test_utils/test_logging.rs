use env_logger::Env;

/// Initializes env_logger for tests. Safe to call from every test.
pub fn init_test_logging() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}
