//! Spreadsheet collaborator.
//!
//! The driver only needs two calls: one batched read of every configured
//! range and one batched formatting write per tick. [`GoogleSheets`] is the
//! production implementation.

mod google;

use std::future::Future;

use rollcall_engine::engine::{CellRef, FetchedRange, Rgb};

use crate::error::Result;

pub use google::{AccessToken, GoogleSheets};

/// Set the background of one cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellFormat {
    /// Sheet title; `None` targets the first sheet.
    pub sheet: Option<String>,
    pub cell: CellRef,
    pub colour: Rgb,
}

pub trait SheetsApi: Send + Sync {
    /// Fetch the current values of `ranges`, one [`FetchedRange`] per range in
    /// request order.
    fn batch_get_values(
        &self,
        sheet_id: &str,
        ranges: &[String],
    ) -> impl Future<Output = Result<Vec<FetchedRange>>> + Send;

    /// Apply every format in one request. Either all succeed or the whole
    /// submission is reported as failed.
    fn batch_update_formatting(
        &self,
        sheet_id: &str,
        formats: &[CellFormat],
    ) -> impl Future<Output = Result<()>> + Send;
}
