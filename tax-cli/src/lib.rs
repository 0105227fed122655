pub mod app;
pub mod coerce;
pub mod csv_loader;
pub mod debounce;
pub mod logging;
pub mod report;
pub mod settings;
pub mod storage;
pub mod watch;
