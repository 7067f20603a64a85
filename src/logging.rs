use crate::config::Config;
use log::{debug, info};

/// Initialize the logger with appropriate level based on verbosity
pub fn init_logger(verbose: bool, quiet: bool) {
    let level = level_filter(verbose, quiet);

    // a logger may already be installed
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .try_init();

    debug!("Logger initialized with level: {level:?}");
}

/// `--quiet` wins over `--verbose`; warnings are shown by default.
pub fn level_filter(verbose: bool, quiet: bool) -> log::LevelFilter {
    if quiet {
        log::LevelFilter::Off
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    }
}

/// Log configuration information
pub fn log_config_info(config: &Config) {
    let (width, height) = config.figure_size();
    info!("Configuration: strategy={}, teams={:?}", config.strategy(), config.team_names());
    info!("Output: dir={}, figure={width}x{height}", config.output_dir().display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter() {
        assert_eq!(level_filter(false, false), log::LevelFilter::Warn);
        assert_eq!(level_filter(true, false), log::LevelFilter::Debug);
        assert_eq!(level_filter(true, true), log::LevelFilter::Off);
        assert_eq!(level_filter(false, true), log::LevelFilter::Off);
    }

    #[test]
    fn test_init_logger_twice() {
        init_logger(false, true);
        init_logger(true, false);
    }
}
