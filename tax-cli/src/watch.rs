//! Recompute a scenario whenever its state file settles after an edit.

use std::time::{Duration, SystemTime};

use anyhow::Result;
use tax_core::TaxYearRepository;
use tax_core::calculations::EngineSettings;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::app::evaluate;
use crate::debounce::Debouncer;
use crate::logging::log_task_error;
use crate::report::{OutputFormat, render};
use crate::storage::StateStore;

const MIN_POLL: Duration = Duration::from_millis(25);

pub struct Watch<'a> {
    repository: &'a dyn TaxYearRepository,
    store: &'a StateStore,
    settings: &'a EngineSettings,
    format: OutputFormat,
}

impl<'a> Watch<'a> {
    pub fn new(
        repository: &'a dyn TaxYearRepository,
        store: &'a StateStore,
        settings: &'a EngineSettings,
        format: OutputFormat,
    ) -> Self {
        Self {
            repository,
            store,
            settings,
            format,
        }
    }

    fn render_once(&self) -> Result<()> {
        let report = evaluate(self.repository, self.store, self.settings)?;
        println!("{}", render(&report, self.format)?);
        Ok(())
    }

    /// Records a new modification time in `last_seen` and reports whether it
    /// changed. A failed stat is logged and counts as no change, so a
    /// transient I/O error never ends the watch.
    fn detect_edit(
        &self,
        last_seen: &mut Option<SystemTime>,
    ) -> bool {
        match self.store.modified() {
            Ok(modified) if modified != *last_seen => {
                *last_seen = modified;
                true
            }
            Ok(_) => false,
            Err(error) => {
                log_task_error("watch", Err(error.into()));
                false
            }
        }
    }

    /// Runs until Ctrl-C. A failed recompute is logged and the watch goes on.
    pub async fn run(
        &self,
        quiet: Duration,
    ) -> Result<()> {
        let mut debouncer = Debouncer::new(quiet);
        let mut ticker = tokio::time::interval((quiet / 4).max(MIN_POLL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_seen: Option<SystemTime> = None;
        self.detect_edit(&mut last_seen);
        info!(
            path = %self.store.path().display(),
            quiet_ms = quiet.as_millis() as u64,
            "watching scenario"
        );
        log_task_error("recompute", self.render_once());

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debouncer.cancel();
                    info!("stopping watch");
                    return Ok(());
                }
                tick = ticker.tick() => {
                    let now = tick.into_std();
                    if self.detect_edit(&mut last_seen) {
                        debug!("state file changed");
                        debouncer.note_edit(now);
                    }
                    if debouncer.poll(now) {
                        log_task_error("recompute", self.render_once());
                    }
                }
            }
        }
    }
}
