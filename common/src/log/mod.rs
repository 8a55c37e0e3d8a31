//! Tracing subscriber bootstrap.

use std::sync::Once;

use tracing::Level;
use tracing_subscriber::fmt;

static INIT: Once = Once::new();

#[derive(Debug, Clone)]
pub struct TracingFactory {
    options: TracingFactoryOptions,
}

#[derive(Debug, Clone)]
pub struct TracingFactoryOptions {
    debug: bool,
    level: Level,
}

impl Default for TracingFactoryOptions {
    fn default() -> Self {
        TracingFactoryOptions::new_with_debug(false)
    }
}

impl TracingFactoryOptions {
    pub fn new_with_debug(debug: bool) -> Self {
        let level = if debug { Level::DEBUG } else { Level::INFO };
        TracingFactoryOptions { debug, level }
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }
}

impl TracingFactory {
    pub fn init_log(debug: bool) -> Self {
        TracingFactory::init_log_with_options(TracingFactoryOptions::new_with_debug(debug))
    }

    /// Initializes the global subscriber once. Safe to call repeatedly
    /// (e.g. from multiple test modules); later calls are no-ops.
    pub fn init_log_with_options(opts: TracingFactoryOptions) -> Self {
        INIT.call_once(|| {
            let format = fmt::format()
                .with_file(true)
                .with_line_number(false)
                .with_target(false)
                .with_thread_ids(true)
                .with_thread_names(true)
                .compact();

            let _ = tracing_subscriber::fmt()
                .with_max_level(opts.level)
                .event_format(format)
                .try_init();
        });

        TracingFactory { options: opts }
    }

    pub fn options(&self) -> &TracingFactoryOptions {
        &self.options
    }
}

#[cfg(test)]
mod test {
    use tracing::{debug, error, info, warn};

    use super::TracingFactory;

    #[test]
    fn init_is_idempotent() {
        TracingFactory::init_log(true);
        TracingFactory::init_log(true);

        debug!("tracing factory test: {:?}", "test");
        info!("tracing factory test: {:?}", "test");
        warn!("tracing factory test: {:?}", "test");
        error!("tracing factory test: {:?}", "test");
    }
}
