//! Batch relocation: several urls into one directory.
//!
//! Each unique url gets its own `RelocationTask` on the rayon pool. Duplicate
//! urls are dropped (first occurrence wins) so one batch never races itself on
//! a record. Once a shutdown is requested, tasks that haven't started are
//! skipped; running ones finish.

use rayon::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::FailReason;
use crate::listener::{Dispatch, RelocationListener};
use crate::shutdown;
use crate::store::MetadataStore;
use crate::task::{RelocationOutcome, RelocationRequest, RelocationTask};

/// Per-url results of a batch, each list in input order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, FailReason)>,
    pub skipped: Vec<String>,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

enum ItemResult {
    Done(RelocationOutcome),
    Skipped,
}

/// Relocate every url in `urls` into `destination_dir`.
pub fn relocate_all<S: AsRef<str>>(
    store: Arc<dyn MetadataStore>,
    urls: &[S],
    destination_dir: &Path,
    listener: Option<Arc<dyn RelocationListener>>,
    dispatch: Dispatch,
) -> BatchReport {
    let mut seen = HashSet::new();
    let unique: Vec<&str> = urls
        .iter()
        .map(AsRef::as_ref)
        .filter(|u| seen.insert(*u))
        .collect();
    if unique.len() != urls.len() {
        debug!(
            requested = urls.len(),
            unique = unique.len(),
            "dropped duplicate urls from batch"
        );
    }

    let results: Vec<(&str, ItemResult)> = unique
        .par_iter()
        .map(|url| {
            if shutdown::is_requested() {
                return (*url, ItemResult::Skipped);
            }
            let mut request = RelocationRequest::new(*url, destination_dir, Arc::clone(&store))
                .with_dispatch(dispatch.clone());
            if let Some(l) = &listener {
                request = request.with_listener(Arc::clone(l));
            }
            (*url, ItemResult::Done(RelocationTask::new(request).run()))
        })
        .collect();

    let mut report = BatchReport::default();
    for (url, result) in results {
        match result {
            ItemResult::Done(RelocationOutcome::Success(_)) => report.succeeded.push(url.to_string()),
            ItemResult::Done(RelocationOutcome::Failed(_, reason)) => {
                report.failed.push((url.to_string(), reason))
            }
            ItemResult::Skipped => report.skipped.push(url.to_string()),
        }
    }
    info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        skipped = report.skipped.len(),
        dest = %destination_dir.display(),
        "Batch relocation finished"
    );
    report
}
