use indicatif::MultiProgress;
use log::LevelFilter;

fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Install `pretty_env_logger` behind `indicatif-log-bridge` so log lines do
/// not tear active spinners. `RUST_LOG` overrides the default level.
///
/// Returns the [`MultiProgress`] that spinners must be added to.
#[must_use]
pub fn init_logger(verbose: bool) -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .filter_level(default_level(verbose))
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // Already initialized (e.g. in tests) is not an error
    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok();

    log::set_max_level(level);

    multi
}
