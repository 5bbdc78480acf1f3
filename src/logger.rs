use chrono::Utc;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use crate::config::{Config, FilterOptions, Options, OutputMode};
use crate::error::{BoxError, ConfigError, SinkError};
use crate::event::{capture_stack, Event, Location};
use crate::filter;
use crate::format::{self, JsonRecord};
use crate::level::Level;
use crate::remote::{default_transport, RemoteConfig, RemoteDispatcher, RemoteTransport};
use crate::sink::{CallbackSink, ConsoleSink, FileSink, LogSink};
use crate::stats::{DeliveryStats, StatsSnapshot};

/// Per-call options of [`Logger::log_with`] and [`Logger::log_at`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogOptions {
    pub level: Level,
    /// Merged with the configured default tags.
    pub tags: Vec<String>,
    /// Overrides [`Config::stack_enabled`] for this call.
    pub include_stack: Option<bool>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: Level::Info,
            tags: Vec::new(),
            include_stack: None,
        }
    }
}

impl LogOptions {
    pub fn level(level: Level) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn include_stack(mut self, include: bool) -> Self {
        self.include_stack = Some(include);
        self
    }
}

struct State {
    config: Config,
    console: ConsoleSink,
    file: Option<FileSink>,
}

/// The logging pipeline: filter, format, then fan out to the sinks.
///
/// One instance is meant to be shared by the whole application, usually as
/// `Arc<Logger>`. Configuration reads and writes and the local sink writes
/// all happen under one lock, so every call sees a complete configuration
/// and file lines never interleave. Remote delivery happens after the lock
/// is released, on a background task.
pub struct Logger {
    state: Mutex<State>,
    stats: Arc<DeliveryStats>,
    transport: Option<Arc<dyn RemoteTransport>>,
    remote_config: RemoteConfig,
    remote: OnceLock<Option<RemoteDispatcher>>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::build(Config::default(), None, RemoteConfig::default())
    }
}

impl Logger {
    /// Logger with the default configuration: colored console output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Logger with an explicit configuration, validated up front.
    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, None, RemoteConfig::default()))
    }

    /// Logger delivering remote events through `transport` instead of the
    /// built-in HTTP client.
    pub fn with_transport(
        config: Config,
        transport: Arc<dyn RemoteTransport>,
        remote_config: RemoteConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, Some(transport), remote_config))
    }

    fn build(config: Config, transport: Option<Arc<dyn RemoteTransport>>, remote_config: RemoteConfig) -> Self {
        Self {
            state: Mutex::new(State {
                config,
                console: ConsoleSink,
                file: None,
            }),
            stats: Arc::new(DeliveryStats::default()),
            transport,
            remote_config,
            remote: OnceLock::new(),
        }
    }

    // Logging must keep working after a panic elsewhere; the state is
    // always left consistent between statements.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Log `message` at `level` from the caller's location.
    #[track_caller]
    pub fn log(&self, level: Level, message: impl Into<String>) {
        self.log_at(Location::caller(), message, LogOptions::level(level));
    }

    /// Log `message` with explicit tags and stack settings.
    #[track_caller]
    pub fn log_with(&self, message: impl Into<String>, options: LogOptions) {
        self.log_at(Location::caller(), message, options);
    }

    /// Run one event through the pipeline.
    ///
    /// Never fails: rejected events are dropped silently and sink failures
    /// are counted in [`Logger::stats`] and reported through `tracing`.
    ///
    /// An event logged to this logger from inside one of its own sinks,
    /// for instance by a callback or by a `tracing` event the callback
    /// raises while [`crate::init::init_tracing`] is installed, is dropped
    /// and counted as filtered.
    pub fn log_at(&self, location: Location, message: impl Into<String>, options: LogOptions) {
        let timestamp = Utc::now();
        DeliveryStats::incr(&self.stats.events_seen);

        let Some(_entered) = Reentry::enter(self) else {
            DeliveryStats::incr(&self.stats.events_filtered);
            return;
        };

        // Resolving symbols is slow, so the stack is captured before the
        // pipeline lock is taken.
        let include_stack = match options.include_stack {
            Some(include) => include,
            None => self.lock().config.stack_enabled,
        };
        let stack = if include_stack { capture_stack() } else { None };

        let remote = {
            let mut state = self.lock();
            let config = &state.config;

            let mut tags: BTreeSet<String> = config.tags.clone();
            tags.extend(options.tags);
            let event = Event {
                timestamp,
                level: options.level,
                message: message.into(),
                tags,
                location,
                stack,
            };

            if !filter::accept(&event, config) {
                DeliveryStats::incr(&self.stats.events_filtered);
                return;
            }
            DeliveryStats::incr(&self.stats.events_accepted);

            state.dispatch(&event, &self.stats);

            state
                .config
                .remote_target()
                .map(|url| (url.to_string(), JsonRecord::from_event(&event)))
        };

        if let Some((url, record)) = remote {
            self.dispatch_remote(&url, record);
        }
    }

    fn dispatch_remote(&self, url: &str, record: JsonRecord) {
        match self.remote.get_or_init(|| self.start_remote()) {
            Some(dispatcher) => dispatcher.dispatch(url, record),
            None => DeliveryStats::incr(&self.stats.remote_dropped),
        }
    }

    fn start_remote(&self) -> Option<RemoteDispatcher> {
        let transport = match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => match default_transport(self.remote_config.timeout) {
                Ok(transport) => transport,
                Err(e) => {
                    tracing::warn!(error = %e, "remote log transport unavailable");
                    return None;
                }
            },
        };
        match RemoteDispatcher::start(transport, self.remote_config.clone(), Arc::clone(&self.stats)) {
            Ok(dispatcher) => Some(dispatcher),
            Err(e) => {
                tracing::warn!(error = %e, "failed to start remote log dispatcher");
                None
            }
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    // === Configuration ===

    /// Copy of the current configuration.
    pub fn config(&self) -> Config {
        self.lock().config.clone()
    }

    /// Apply every set field of `options` at once. On error nothing
    /// changes.
    pub fn configure(&self, options: Options) -> Result<(), ConfigError> {
        self.try_update(|config| {
            options.apply_to(config);
            Ok(())
        })
    }

    // Validate a modified copy, then swap it in.
    fn try_update(&self, f: impl FnOnce(&mut Config) -> Result<(), ConfigError>) -> Result<(), ConfigError> {
        let mut state = self.lock();
        let mut next = state.config.clone();
        f(&mut next)?;
        next.validate()?;
        state.config = next;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut Config)) {
        f(&mut self.lock().config);
    }

    pub fn set_output(&self, mode: OutputMode) -> Result<(), ConfigError> {
        self.try_update(|config| {
            config.output = mode;
            Ok(())
        })
    }

    /// Install `callback` and switch to [`OutputMode::Callback`].
    pub fn set_output_callback<F>(&self, callback: F)
    where
        F: Fn(&str, &Event) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.update(|config| {
            config.callback = Some(Arc::new(callback));
            config.output = OutputMode::Callback;
        });
    }

    /// Install `callback` without changing the output mode.
    pub fn set_callback<F>(&self, callback: F)
    where
        F: Fn(&str, &Event) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.update(|config| config.callback = Some(Arc::new(callback)));
    }

    pub fn set_log_file(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.update(|config| config.log_file = Some(path));
    }

    pub fn set_format(&self, template: impl Into<String>) -> Result<(), ConfigError> {
        let template = template.into();
        self.try_update(|config| {
            if template.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    option: "format",
                    value: template,
                });
            }
            config.format = template;
            Ok(())
        })
    }

    pub fn enable_json(&self) {
        self.update(|config| config.json_mode = true);
    }

    pub fn disable_json(&self) {
        self.update(|config| config.json_mode = false);
    }

    pub fn enable_stack(&self) {
        self.update(|config| config.stack_enabled = true);
    }

    pub fn disable_stack(&self) {
        self.update(|config| config.stack_enabled = false);
    }

    pub fn enable_colors(&self) {
        self.update(|config| config.use_colors = true);
    }

    pub fn disable_colors(&self) {
        self.update(|config| config.use_colors = false);
    }

    /// Replace the default tags merged into every event.
    pub fn set_tags<I, T>(&self, tags: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let tags: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
        self.update(|config| config.tags = tags);
    }

    pub fn clear_tags(&self) {
        self.update(|config| config.tags.clear());
    }

    pub fn enable_level(&self, level: Level) {
        self.update(|config| {
            config.enabled_levels.insert(level);
        });
    }

    pub fn disable_level(&self, level: Level) {
        self.update(|config| {
            config.enabled_levels.remove(&level);
        });
    }

    /// Replace the filter dimensions that are set in `filters`.
    pub fn set_filters(&self, filters: FilterOptions) {
        self.update(|config| filters.apply_to(&mut config.filters));
    }

    pub fn set_whitelist<I, T>(&self, modules: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let modules: BTreeSet<String> = modules.into_iter().map(Into::into).collect();
        self.update(|config| config.whitelist = modules);
    }

    pub fn set_remote_url(&self, url: impl Into<String>) -> Result<(), ConfigError> {
        let url = url.into();
        self.try_update(|config| {
            config.remote_url = Some(url);
            Ok(())
        })
    }

    /// Enable remote delivery. Without a URL this is a silent no-op sink.
    pub fn enable_remote(&self) {
        self.update(|config| config.remote_enabled = true);
    }

    pub fn disable_remote(&self) {
        self.update(|config| config.remote_enabled = false);
    }
}

thread_local! {
    // Loggers the current thread is logging through, innermost last.
    static ACTIVE: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks `logger` as active on this thread until dropped.
struct Reentry(usize);

impl Reentry {
    fn enter(logger: &Logger) -> Option<Self> {
        let id = logger as *const Logger as usize;
        ACTIVE.with(|active| {
            let mut active = active.borrow_mut();
            if active.contains(&id) {
                return None;
            }
            active.push(id);
            Some(Reentry(id))
        })
    }
}

impl Drop for Reentry {
    fn drop(&mut self) {
        ACTIVE.with(|active| active.borrow_mut().retain(|&id| id != self.0));
    }
}

impl State {
    /// Local sinks in fixed order: console, file, callback.
    fn dispatch(&mut self, event: &Event, stats: &DeliveryStats) {
        let State { config, console, file } = self;

        if config.output.writes_console() {
            let line = format::render_console(event, config);
            if let Err(e) = console.emit(&line, event) {
                report(stats, console.name(), &e);
            }
        }

        let wants_file = config.output.writes_file();
        let wants_callback = config.output == OutputMode::Callback && config.callback.is_some();
        if !wants_file && !wants_callback {
            return;
        }
        let rendered = format::render(event, config);

        if wants_file {
            if let Some(path) = &config.log_file {
                if file.as_ref().map_or(true, |sink| sink.path() != path.as_path()) {
                    *file = Some(FileSink::new(path.clone()));
                }
            }
            if let Some(sink) = file.as_mut() {
                if let Err(e) = sink.emit(&rendered, event) {
                    report(stats, sink.name(), &e);
                }
            }
        }

        if wants_callback {
            if let Some(callback) = &config.callback {
                let mut sink = CallbackSink::new(Arc::clone(callback));
                if let Err(e) = sink.emit(&rendered, event) {
                    report(stats, sink.name(), &e);
                }
            }
        }
    }
}

fn report(stats: &DeliveryStats, sink: &'static str, err: &SinkError) {
    DeliveryStats::incr(&stats.sink_failures);
    tracing::warn!(sink, error = %err, "log sink delivery failed");
}
