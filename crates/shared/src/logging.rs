use log::LevelFilter;

// Logging bootstrap shared by the binaries in this workspace

pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_uppercase().as_str() {
        "OFF" => LevelFilter::Off,
        "ERROR" => LevelFilter::Error,
        "WARN" => LevelFilter::Warn,
        "INFO" => LevelFilter::Info,
        "DEBUG" => LevelFilter::Debug,
        "TRACE" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Installs env_logger at `level`. RUST_LOG directives still apply on top.
/// Calling it twice keeps the first logger.
pub fn init_logging(level: &str) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(parse_level(level));

    // Template lookups and connection pooling are noisy below WARN
    builder.filter_module("handlebars", LevelFilter::Warn);
    builder.filter_module("hyper", LevelFilter::Warn);
    builder.filter_module("reqwest", LevelFilter::Warn);

    match builder.try_init() {
        Ok(()) => log::info!("Logging initialized with level: {}", level),
        Err(e) => log::debug!("Logger already initialized: {}", e),
    }
}
