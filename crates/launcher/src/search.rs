use arsenal_core::events::{EventSink, LauncherEvent, SearchHit};
use arsenal_core::models::ToolRecord;
use arsenal_kernel::Debouncer;
use std::sync::Arc;
use std::time::Duration;

pub const SEARCH_DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(1000);

const SCORE_NAME_CONTAINS: i64 = 100;
const SCORE_NAME_PREFIX: i64 = 50;
const SCORE_NAME_EXACT: i64 = 100;
const SCORE_DESCRIPTION: i64 = 30;
const SCORE_CATEGORY: i64 = 20;
const SCORE_SUBCATEGORY: i64 = 15;
const SCORE_KIND_TAG: i64 = 10;

/// Case-insensitive additive scoring over one record. Zero means no match.
fn score_record(record: &ToolRecord, needle: &str) -> i64 {
    let mut score = 0;

    let name = record.name.to_lowercase();
    if name.contains(needle) {
        score += SCORE_NAME_CONTAINS;
        if name.starts_with(needle) {
            score += SCORE_NAME_PREFIX;
        }
        if name == needle {
            score += SCORE_NAME_EXACT;
        }
    }
    if record.description.to_lowercase().contains(needle) {
        score += SCORE_DESCRIPTION;
    }
    if record.category.to_lowercase().contains(needle) {
        score += SCORE_CATEGORY;
    }
    if record.subcategory.to_lowercase().contains(needle) {
        score += SCORE_SUBCATEGORY;
    }
    if record.kind.as_str().contains(needle) {
        score += SCORE_KIND_TAG;
    }
    score
}

/// Scores every record against `query` and returns matches sorted by
/// descending score; equal scores keep input order. A blank query returns
/// the full list unscored, in input order.
pub fn search_tools(records: &[ToolRecord], query: &str) -> Vec<SearchHit> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records
            .iter()
            .map(|record| SearchHit {
                record: record.clone(),
                score: 0,
            })
            .collect();
    }

    let mut hits: Vec<SearchHit> = records
        .iter()
        .filter_map(|record| {
            let score = score_record(record, &needle);
            (score > 0).then(|| SearchHit {
                record: record.clone(),
                score,
            })
        })
        .collect();
    hits.sort_by(|left, right| right.score.cmp(&left.score));
    hits
}

struct SearchJob {
    query: String,
    records: Vec<ToolRecord>,
}

/// Long-lived search thread. Queries are debounced so a burst of keystrokes
/// runs one search; results come back as `SearchFinished` keyed by the query
/// that produced them. No cancellation, callers render the latest result.
pub struct SearchWorker {
    debouncer: Debouncer<SearchJob>,
}

impl SearchWorker {
    pub fn spawn(sink: EventSink) -> Self {
        let action: Arc<dyn Fn(SearchJob) + Send + Sync> = Arc::new(move |job: SearchJob| {
            let hits = search_tools(&job.records, &job.query);
            tracing::debug!(event = "search_finished", query = job.query, hits = hits.len());
            sink(LauncherEvent::SearchFinished {
                query: job.query,
                hits,
            });
        });
        Self {
            debouncer: Debouncer::spawn("search", SEARCH_DEBOUNCE_WINDOW, action),
        }
    }

    /// Replaces any pending query and restarts the quiet window. `records`
    /// is a snapshot; the worker never reads live store state.
    pub fn request(&self, query: impl Into<String>, records: Vec<ToolRecord>) {
        self.debouncer.schedule(SearchJob {
            query: query.into(),
            records,
        });
    }

    /// Runs any pending query immediately.
    pub fn flush(&self) {
        self.debouncer.flush();
    }

    pub fn shutdown(self) {
        self.debouncer.shutdown(SHUTDOWN_TIMEOUT);
    }
}

#[cfg(test)]
#[path = "../tests/launcher/search_tests.rs"]
mod tests;
