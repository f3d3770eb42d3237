//! Periodic sheet synchronisation.
//!
//! Every tick drains the update queue, reads all configured ranges in one
//! request, locates each pending name and submits every resulting cell format
//! in one bulk write. A failed write abandons the tick; there is no retry.

use std::future::Future;
use std::sync::Arc;

use rollcall_engine::engine::{FetchedRange, Rgb, find_cell_for_name};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::config::Config;
use crate::queue::{DrainTiming, PendingUpdate, UpdateReceiver};
use crate::sheets::{CellFormat, SheetsApi};

/// What a single tick did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing was queued.
    Idle,
    /// Updates were drained but could not be written at all.
    Dropped { updates: usize, reason: &'static str },
    /// Every update in the batch was skipped.
    NothingToWrite { skipped: usize },
    Submitted { cells: usize, skipped: usize },
    /// A sheet request failed; the batch is lost.
    Failed { updates: usize },
}

/// Resolve a drained batch against freshly fetched ranges.
///
/// Returns the formats in arrival order, so a later update for the same name
/// overrides an earlier one when applied, and the number of updates skipped
/// because their name was not found or their colour did not decode.
pub fn build_formats(batch: &[PendingUpdate], fetched: &[FetchedRange]) -> (Vec<CellFormat>, usize) {
    let mut formats = Vec::with_capacity(batch.len());
    let mut skipped = 0;

    for update in batch {
        let located = match find_cell_for_name(fetched, &update.name) {
            Ok(located) => located,
            Err(err) => {
                tracing::warn!(name = %update.name, "skipping update: {err}");
                skipped += 1;
                continue;
            }
        };
        let colour = match Rgb::from_hex(&update.colour) {
            Ok(colour) => colour,
            Err(err) => {
                tracing::warn!(name = %update.name, "skipping update: {err}");
                skipped += 1;
                continue;
            }
        };
        tracing::info!(
            name = %update.name,
            cell = %located.cell,
            sheet = located.sheet.as_deref().unwrap_or_default(),
            %colour,
            "setting cell colour"
        );
        formats.push(CellFormat {
            sheet: located.sheet,
            cell: located.cell,
            colour,
        });
    }

    (formats, skipped)
}

pub struct SyncDriver<S> {
    sheets: Arc<S>,
    settings: watch::Receiver<Arc<Config>>,
    updates: UpdateReceiver,
}

impl<S: SheetsApi> SyncDriver<S> {
    pub fn new(sheets: Arc<S>, settings: watch::Receiver<Arc<Config>>, updates: UpdateReceiver) -> Self {
        SyncDriver {
            sheets,
            settings,
            updates,
        }
    }

    /// Run one drain/read/write cycle against the latest settings.
    pub async fn tick(&mut self) -> TickOutcome {
        let config = self.settings.borrow_and_update().clone();
        let timing = DrainTiming {
            idle: config.sync.idle_flush(),
            max_wait: config.sync.max_drain(),
        };

        let batch = self.updates.drain_batch(timing).await;
        if batch.is_empty() {
            tracing::debug!("nothing to sync");
            return TickOutcome::Idle;
        }

        let sheet_id = config.google.sheet_id.as_str();
        if sheet_id.is_empty() {
            return dropped(batch.len(), "no sheet ID set");
        }
        if config.google.sheet_ranges.is_empty() {
            return dropped(batch.len(), "no sheet ranges set");
        }
        let ranges: Vec<String> = config.google.sheet_ranges.iter().cloned().collect();

        let fetched = match self.sheets.batch_get_values(sheet_id, &ranges).await {
            Ok(fetched) => fetched,
            Err(err) => {
                tracing::error!(updates = batch.len(), "failed to read sheet ranges, abandoning tick: {err}");
                return TickOutcome::Failed { updates: batch.len() };
            }
        };

        let (formats, skipped) = build_formats(&batch, &fetched);
        if formats.is_empty() {
            tracing::debug!(skipped, "no cells to update");
            return TickOutcome::NothingToWrite { skipped };
        }

        match self.sheets.batch_update_formatting(sheet_id, &formats).await {
            Ok(()) => {
                tracing::info!(cells = formats.len(), skipped, "submitted sheet update");
                TickOutcome::Submitted {
                    cells: formats.len(),
                    skipped,
                }
            }
            Err(err) => {
                tracing::error!(cells = formats.len(), "sheet update failed, abandoning tick: {err}");
                TickOutcome::Failed { updates: batch.len() }
            }
        }
    }

    /// Tick on the configured period until `shutdown` resolves, then flush
    /// whatever is still queued.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) {
        let period = self.settings.borrow().sync.period();
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Skip the first immediate tick.
        ticker.tick().await;

        tokio::pin!(shutdown);
        tracing::info!(period_ms = period.as_millis() as u64, "sync driver started");

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        while self.tick().await != TickOutcome::Idle {}
        tracing::info!("sync driver stopped");
    }
}

fn dropped(updates: usize, reason: &'static str) -> TickOutcome {
    tracing::warn!(updates, "dropping updates: {reason}");
    TickOutcome::Dropped { updates, reason }
}
