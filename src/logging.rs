//! Subscriber setup for the engine's `tracing` events
//!
//! The engine only emits events (target `di_engine`); installing a
//! subscriber is left to the application. These helpers cover the common
//! cases on top of `tracing-subscriber`.
//!
//! # Features
//!
//! - `logging` - emit registration, resolution and disposal events (default)
//! - `logging-json` - JSON subscriber output
//! - `logging-pretty` - multi-line human readable output
//!
//! # Example
//!
//! ```rust,ignore
//! use di_engine::logging;
//!
//! // Engine events only, at TRACE, honoring RUST_LOG when set
//! logging::builder()
//!     .trace()
//!     .di_only()
//!     .from_env()
//!     .pretty()
//!     .init();
//! ```

use tracing::Level;

/// Log target used by every event this crate emits
pub const TARGET: &str = "di_engine";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event
    #[default]
    Json,
    /// Multi-line output with source locations
    Pretty,
    /// Single-line output
    Compact,
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct LoggingBuilder {
    level: Level,
    format: LogFormat,
    target: Option<&'static str>,
    from_env: bool,
    with_file: bool,
    with_line_number: bool,
    with_thread_ids: bool,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Json,
            target: None,
            from_env: false,
            with_file: false,
            with_line_number: false,
            with_thread_ids: false,
        }
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn trace(self) -> Self {
        self.with_level(Level::TRACE)
    }

    pub fn debug(self) -> Self {
        self.with_level(Level::DEBUG)
    }

    pub fn info(self) -> Self {
        self.with_level(Level::INFO)
    }

    /// Only keep events from `target`
    pub fn with_target_filter(mut self, target: &'static str) -> Self {
        self.target = Some(target);
        self
    }

    /// Only keep events emitted by this crate
    pub fn di_only(self) -> Self {
        self.with_target_filter(TARGET)
    }

    /// Prefer `RUST_LOG` over the configured level and target when it is set
    pub fn from_env(mut self) -> Self {
        self.from_env = true;
        self
    }

    pub fn with_file(mut self) -> Self {
        self.with_file = true;
        self
    }

    pub fn with_line_number(mut self) -> Self {
        self.with_line_number = true;
        self
    }

    pub fn with_thread_ids(mut self) -> Self {
        self.with_thread_ids = true;
        self
    }

    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    pub fn compact(mut self) -> Self {
        self.format = LogFormat::Compact;
        self
    }

    /// Filter directive built from level and target, e.g. `di_engine=trace`
    pub fn directive(&self) -> String {
        let level = self.level.to_string().to_lowercase();
        match self.target {
            Some(target) => format!("{target}={level}"),
            None => level,
        }
    }

    /// Install the subscriber globally.
    ///
    /// Returns `false` when a global subscriber was already installed.
    #[cfg(any(feature = "logging-json", feature = "logging-pretty"))]
    pub fn init(self) -> bool {
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;
        use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

        let filter = self
            .from_env
            .then(|| EnvFilter::try_from_default_env().ok())
            .flatten()
            .unwrap_or_else(|| EnvFilter::new(self.directive()));

        let base = fmt::layer()
            .with_file(self.with_file)
            .with_line_number(self.with_line_number)
            .with_thread_ids(self.with_thread_ids)
            .with_target(true);

        let layer: Box<dyn Layer<Registry> + Send + Sync> = match self.format {
            #[cfg(feature = "logging-json")]
            LogFormat::Json => base.json().boxed(),
            // Without JSON support the default format degrades to compact
            #[cfg(not(feature = "logging-json"))]
            LogFormat::Json => base.compact().boxed(),
            LogFormat::Pretty => base.pretty().boxed(),
            LogFormat::Compact => base.compact().boxed(),
        };

        tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .try_init()
            .is_ok()
    }

    /// No subscriber backend compiled in; always `false`
    #[cfg(not(any(feature = "logging-json", feature = "logging-pretty")))]
    pub fn init(self) -> bool {
        false
    }
}

pub fn builder() -> LoggingBuilder {
    LoggingBuilder::new()
}

/// Install a DEBUG subscriber: JSON with `logging-json`, else pretty.
pub fn init() -> bool {
    if cfg!(feature = "logging-json") {
        init_json()
    } else {
        init_pretty()
    }
}

/// JSON output at DEBUG.
///
/// ```json
/// {"timestamp":"2026-01-01T00:00:00.000Z","level":"DEBUG","fields":{"message":"Registering provider","token":"db","provider":"class","lifecycle":"Singleton","depth":0},"target":"di_engine"}
/// ```
pub fn init_json() -> bool {
    builder().json().debug().init()
}

/// Pretty output at DEBUG.
pub fn init_pretty() -> bool {
    builder().pretty().debug().init()
}

/// Engine events only, at TRACE.
pub fn init_di_only() -> bool {
    builder().di_only().trace().init()
}
