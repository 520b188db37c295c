use once_cell::sync::Lazy;
pub use slog::*;

fn wrap<D: Drain<Err = Never, Ok = ()> + Send + 'static>(drain: D) -> Fuse<slog_async::Async> {
    slog_async::Async::default(slog_envlogger::new(drain)).fuse()
}

/// Root logger. The output format comes from `logging.rust_log_format`
/// ("json" or terminal), which `LOG_FORMAT` overrides.
pub static DEFAULT: Lazy<Logger> = Lazy::new(|| {
    // stdout is left for the run summary
    let mk_term = || {
        slog_term::FullFormat::new(slog_term::TermDecorator::new().stderr().build())
            .build()
            .fuse()
    };

    let mk_json = || slog_json::Json::default(std::io::stderr()).fuse();

    let format = common::config::config().logging.rust_log_format.clone();
    let drain = match format.as_str() {
        "json" => wrap(mk_json()),
        _ => wrap(mk_term()),
    };

    Logger::root(
        drain,
        o!(
            "version" => env!("CARGO_PKG_VERSION"),
        ),
    )
});
