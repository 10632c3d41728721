use std::future::Future;

use futures_util::{Stream, StreamExt};
use tracing::{info, warn};

use crate::commands::checkin_commands;
use crate::{AppError, AppState};
use backend_domain::{CheckInReceipt, ScanSessionSummary};

#[derive(Debug)]
pub enum ScanOutcome {
    Recorded(CheckInReceipt),
    /// Blank code, unknown event or an account that may not scan.
    Rejected(String),
    Failed(String),
}

/// One operator scanning codes for one event.
///
/// Decoded values are handled strictly one after another: each check-in
/// runs to completion before the next value is pulled. Repeated decodes of
/// the same code are not filtered here; the upsert absorbs them.
pub struct ScanSession {
    state: AppState,
    event_id: String,
    operator_id: String,
}

impl ScanSession {
    pub fn new(state: AppState, event_id: impl Into<String>, operator_id: impl Into<String>) -> Self {
        Self {
            state,
            event_id: event_id.into(),
            operator_id: operator_id.into(),
        }
    }

    pub async fn scan(&self, code: &str) -> ScanOutcome {
        match checkin_commands::check_in(&self.state, &self.event_id, &self.operator_id, code).await {
            Ok(receipt) => ScanOutcome::Recorded(receipt),
            Err(err @ (AppError::BadRequest(_) | AppError::NotFound(_) | AppError::Unauthorized)) => {
                ScanOutcome::Rejected(err.to_string())
            }
            Err(err) => ScanOutcome::Failed(err.to_string()),
        }
    }

    /// Drains `codes` until it ends or `shutdown` resolves. A check-in that
    /// is already running when shutdown fires is awaited, not dropped.
    pub async fn run<S, F, C>(&self, codes: S, shutdown: F, mut on_outcome: C) -> ScanSessionSummary
    where
        S: Stream<Item = String>,
        F: Future<Output = ()>,
        C: FnMut(&str, &ScanOutcome),
    {
        tokio::pin!(codes);
        tokio::pin!(shutdown);
        let mut summary = ScanSessionSummary::default();
        info!(
            "scan session started: event={}, operator={}",
            self.event_id, self.operator_id
        );
        loop {
            let code = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("scan session stopped by shutdown");
                    break;
                }
                next = codes.next() => match next {
                    Some(code) => code,
                    None => break,
                },
            };
            summary.decoded += 1;
            let outcome = self.scan(&code).await;
            match &outcome {
                ScanOutcome::Recorded(_) => summary.recorded += 1,
                ScanOutcome::Rejected(reason) => {
                    summary.rejected += 1;
                    warn!("scan rejected: code={:?}, reason={}", code.trim(), reason);
                }
                ScanOutcome::Failed(reason) => {
                    summary.failed += 1;
                    warn!("scan failed: code={:?}, reason={}", code.trim(), reason);
                }
            }
            on_outcome(code.trim(), &outcome);
        }
        info!(
            "scan session finished: decoded={}, recorded={}, rejected={}, failed={}",
            summary.decoded, summary.recorded, summary.rejected, summary.failed
        );
        summary
    }
}
