//! Tracing setup for the `gearing` binary.
//!
//! Two layers share one global level filter: a console layer on stderr and
//! a file layer that discards output until a log file is attached. Both the
//! level and the console gate can be changed after startup.

use std::{
    fs::File,
    io::{self, IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError},
};

use anyhow::{Result, anyhow, bail};
use chrono::Local;
use tracing::{Event, Level, Subscriber, error};
use tracing_subscriber::{
    EnvFilter,
    Layer, // for .with_filter() on the console layer
    fmt::{
        FmtContext, MakeWriter,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    reload,
    util::SubscriberInitExt,
};

const DEFAULT_FILTER: &str = "info";

/// What the command line asked for.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Filter directive; overrides `RUST_LOG`.
    pub level: Option<String>,
    pub file: Option<PathBuf>,
    pub quiet: bool,
}

// --- Formatter ---

/// `HH:MM:SS.mmm LEVEL target: fields`, in local time.
struct LocalFmt;

fn level_colour(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "1;31",
        Level::WARN => "1;33",
        Level::INFO => "1;32",
        Level::DEBUG => "1;34",
        Level::TRACE => "1;35",
    }
}

impl<S, N> FormatEvent<S, N> for LocalFmt
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let time = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");

        if writer.has_ansi_escapes() {
            write!(
                writer,
                "\x1b[2m{time}\x1b[0m \x1b[{}m{:>5}\x1b[0m \x1b[36m{}\x1b[0m: ",
                level_colour(meta.level()),
                meta.level(),
                meta.target()
            )?;
        } else {
            write!(writer, "{time} {:>5} {}: ", meta.level(), meta.target())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

// --- Late-bound file writer ---

type SharedFile = Arc<Mutex<Option<File>>>;

/// Writes to the attached log file, or nowhere while none is attached.
#[derive(Clone)]
struct FileSlot(SharedFile);

struct SlotWriter<'a>(MutexGuard<'a, Option<File>>);

impl Write for SlotWriter<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        self.0.as_mut().map_or(Ok(buf.len()), |f| f.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.as_mut().map_or(Ok(()), |f| f.flush())
    }
}

impl<'a> MakeWriter<'a> for FileSlot {
    type Writer = SlotWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SlotWriter(self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

// --- Runtime handles ---

type Reloader = Box<dyn Fn(EnvFilter) -> Result<()> + Send + Sync>;

struct Handles {
    level: Reloader,
    console: Reloader,
    file: SharedFile,
}

static HANDLES: OnceLock<Handles> = OnceLock::new();
static APP_NAME: OnceLock<String> = OnceLock::new();

fn reloader<S>(
    handle: reload::Handle<EnvFilter, S>,
    what: &'static str,
) -> Reloader
where
    S: Subscriber + Send + Sync + 'static,
{
    Box::new(move |filter| {
        handle
            .reload(filter)
            .map_err(|e| anyhow!("{what} filter reload failed: {e}"))
    })
}

fn handles() -> Result<&'static Handles> {
    match HANDLES.get() {
        Some(handles) => Ok(handles),
        None => bail!("logging not yet initialized"),
    }
}

// --- Public API ---

/// Installs the global subscriber and applies `options`.
///
/// A second call leaves the first subscriber in place and only re-applies
/// the options.
pub fn init(options: &LogOptions) -> Result<()> {
    let _ = app_name();

    if HANDLES.get().is_none() {
        let file: SharedFile = Arc::new(Mutex::new(None));
        let (console_gate, console_handle) = reload::Layer::new(EnvFilter::new("trace"));
        let (level_filter, level_handle) = reload::Layer::new(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        );

        let console_layer = tracing_subscriber::fmt::layer()
            .event_format(LocalFmt)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_filter(console_gate);
        let file_layer = tracing_subscriber::fmt::layer()
            .event_format(LocalFmt)
            .with_ansi(false)
            .with_writer(FileSlot(file.clone()));

        tracing_subscriber::registry()
            .with(level_filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()?;

        let _ = HANDLES.set(Handles {
            level: reloader(level_handle, "level"),
            console: reloader(console_handle, "console"),
            file,
        });
    }

    if let Some(level) = &options.level {
        set_log_level(level)?;
    }
    if let Some(path) = &options.file {
        enable_file_logging(path)?;
    }
    set_console_enabled(!options.quiet)
}

/// Changes the active filter. Accepts a bare level (`warn`) or any
/// `EnvFilter` directive (`tax_core=debug,info`).
pub fn set_log_level(level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_new(level).map_err(|e| anyhow!("invalid log level '{level}': {e}"))?;
    (handles()?.level)(filter)
}

/// Shows or hides console output. File logging is unaffected.
pub fn set_console_enabled(enabled: bool) -> Result<()> {
    let gate = if enabled { "trace" } else { "off" };
    (handles()?.console)(EnvFilter::new(gate))
}

/// Appends log output to `path`, replacing any file already attached.
pub fn enable_file_logging(path: &Path) -> Result<()> {
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| anyhow!("cannot open log file '{}': {e}", path.display()))?;

    *handles()?.file.lock().unwrap_or_else(PoisonError::into_inner) = Some(file);
    Ok(())
}

/// Executable stem, or `gearing` if it cannot be determined.
pub fn app_name() -> &'static str {
    APP_NAME.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "gearing".to_string())
    })
}

/// Logs a failed background step and carries on.
pub fn log_task_error(
    task_name: &'static str,
    result: Result<()>,
) {
    if let Err(error) = result {
        error!(task = task_name, ?error, "background task failed");
    }
}
