use std::sync::Once;

use env_logger::WriteStyle;
use log::LevelFilter;

/// How the `tkdocs` binaries set up `env_logger`.
///
/// Filter precedence: an explicit [`filter`](Self::filter) string, then
/// `RUST_LOG`, then `default_level` for everything.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `env_logger` filter syntax, e.g. `"tkdocs=debug,tkdocs_markup=trace"`.
    pub env_filter: Option<String>,
    pub default_level: LevelFilter,
    pub write_style: WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { env_filter: None, default_level: LevelFilter::Info, write_style: WriteStyle::Auto }
    }
}

impl LoggingConfig {
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    pub fn level(mut self, level: LevelFilter) -> Self {
        self.default_level = level;
        self
    }

    pub fn write_style(mut self, style: WriteStyle) -> Self {
        self.write_style = style;
        self
    }

    fn builder(&self) -> env_logger::Builder {
        let mut builder = env_logger::Builder::new();
        match self.env_filter.clone().or_else(|| std::env::var("RUST_LOG").ok()) {
            Some(filter) => builder.parse_filters(&filter),
            None => builder.filter_level(self.default_level),
        };
        builder.write_style(self.write_style).format_timestamp(None);
        builder
    }
}

static INIT: Once = Once::new();

/// Install the global logger. Only the first call does anything.
///
/// Libraries in this workspace only emit through `log`; whoever owns `main`
/// decides whether a backend exists.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        // Someone else already installed a logger; theirs stays.
        if config.builder().try_init().is_err() {
            return;
        }
        log::debug!("logging initialized ({:?})", config.env_filter);
    });
}
