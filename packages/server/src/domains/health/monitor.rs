//! Aggregates pipeline state into one report and judges it against
//! operator thresholds.
//!
//! Each sub-query tolerates its own failure: a broken metric logs a
//! warning and reports its zero value instead of taking the whole
//! endpoint down.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;

#[derive(Debug, Clone, Serialize, Default)]
pub struct QueueMetrics {
    pub job_type: String,
    pub pending: i64,
    pub running: i64,
    pub succeeded: i64,
    pub failed: i64,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct PipelineMetrics {
    pub queues: Vec<QueueMetrics>,
    pub dead_letter_count: i64,
    pub pending_calls: i64,
    pub live_calls: i64,
    pub processed_messages: i64,
    pub active_sources: i64,
    pub last_processed_at: Option<DateTime<Utc>>,
    /// Records created over messages processed inside the rolling
    /// window. A collapsed classifier shows up here as a conversion
    /// rate near zero.
    pub success_rate: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct HealthThresholds {
    pub max_queue_backlog: i64,
    /// Minimum acceptable success rate once enough jobs have finished.
    pub success_rate_floor: f64,
    /// How long sources may sit idle before intake counts as stalled.
    /// Also serves as the rolling window for the conversion rate.
    pub staleness: Duration,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            max_queue_backlog: 500,
            success_rate_floor: 0.05,
            staleness: Duration::hours(24),
        }
    }
}

async fn count(pool: &PgPool, label: &str, sql: &str) -> i64 {
    match sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(metric = label, error = %e, "health metric query failed");
            0
        }
    }
}

async fn count_since(pool: &PgPool, label: &str, sql: &str, cutoff: DateTime<Utc>) -> i64 {
    match sqlx::query_scalar::<_, i64>(sql)
        .bind(cutoff)
        .fetch_one(pool)
        .await
    {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(metric = label, error = %e, "health metric query failed");
            0
        }
    }
}

/// Collect the metric report. `window` bounds the conversion rate so an
/// old backlog of successes cannot mask a classifier that stopped
/// producing records this week.
pub async fn gather(pool: &PgPool, window: Duration) -> PipelineMetrics {
    let queue_rows = sqlx::query_as::<_, (String, String, i64)>(
        "SELECT job_type, status::TEXT, COUNT(*) FROM jobs GROUP BY job_type, status",
    )
    .fetch_all(pool)
    .await
    .unwrap_or_else(|e| {
        tracing::warn!(metric = "queues", error = %e, "health metric query failed");
        Vec::new()
    });

    let mut queues: Vec<QueueMetrics> = Vec::new();

    for (job_type, status, n) in queue_rows {
        let idx = match queues.iter().position(|q| q.job_type == job_type) {
            Some(idx) => idx,
            None => {
                queues.push(QueueMetrics {
                    job_type: job_type.clone(),
                    ..Default::default()
                });
                queues.len() - 1
            }
        };
        let entry = &mut queues[idx];
        match status.as_str() {
            "pending" => entry.pending = n,
            "running" => entry.running = n,
            "succeeded" => entry.succeeded = n,
            "failed" | "dead_letter" => entry.failed += n,
            _ => {}
        }
    }

    // Replayed dead letters are resolved and no longer anyone's problem.
    let dead_letter_count = count(
        pool,
        "dead_letters",
        "SELECT COUNT(*) FROM jobs WHERE status = 'dead_letter' AND resolved_at IS NULL",
    )
    .await;

    let last_processed_at = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
        "SELECT MAX(processed_at) FROM processed_messages",
    )
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| {
        tracing::warn!(metric = "last_processed_at", error = %e, "health metric query failed");
        None
    });

    let pending_calls = count(
        pool,
        "pending_calls",
        "SELECT COUNT(*) FROM casting_calls WHERE status = 'pending_review'",
    )
    .await;
    let live_calls = count(
        pool,
        "live_calls",
        "SELECT COUNT(*) FROM casting_calls WHERE status = 'live'",
    )
    .await;
    let processed_messages = count(
        pool,
        "processed_messages",
        "SELECT COUNT(*) FROM processed_messages",
    )
    .await;

    let cutoff = Utc::now() - window;
    let recent_calls = count_since(
        pool,
        "recent_calls",
        "SELECT COUNT(*) FROM casting_calls WHERE created_at > $1",
        cutoff,
    )
    .await;
    let recent_messages = count_since(
        pool,
        "recent_messages",
        "SELECT COUNT(*) FROM processed_messages WHERE processed_at > $1",
        cutoff,
    )
    .await;

    let success_rate = conversion_rate(recent_calls, recent_messages);

    PipelineMetrics {
        queues,
        dead_letter_count,
        pending_calls,
        live_calls,
        processed_messages,
        active_sources: count(
            pool,
            "active_sources",
            "SELECT COUNT(*) FROM sources WHERE is_active = true",
        )
        .await,
        last_processed_at,
        success_rate,
    }
}

/// Rate over the window's counts only; `None` until the window has seen
/// at least one message, so a quiet deployment is not judged.
fn conversion_rate(recent_calls: i64, recent_messages: i64) -> Option<f64> {
    if recent_messages > 0 {
        Some(recent_calls as f64 / recent_messages as f64)
    } else {
        None
    }
}

/// Judge the metrics. Returns whether the pipeline is healthy plus the
/// list of threshold violations.
pub fn verdict(
    metrics: &PipelineMetrics,
    thresholds: &HealthThresholds,
    now: DateTime<Utc>,
) -> (bool, Vec<String>) {
    let mut problems = Vec::new();

    for queue in &metrics.queues {
        let backlog = queue.pending + queue.running;
        if backlog > thresholds.max_queue_backlog {
            problems.push(format!(
                "queue {} backlog {} exceeds {}",
                queue.job_type, backlog, thresholds.max_queue_backlog
            ));
        }
    }

    if metrics.dead_letter_count > 0 {
        problems.push(format!(
            "{} dead-lettered job(s) awaiting replay",
            metrics.dead_letter_count
        ));
    }

    if let Some(rate) = metrics.success_rate {
        if rate < thresholds.success_rate_floor {
            problems.push(format!(
                "conversion rate {rate:.3} below floor {:.3}",
                thresholds.success_rate_floor
            ));
        }
    }

    // Staleness only means anything when there are sources to be fresh.
    if metrics.active_sources > 0 {
        match metrics.last_processed_at {
            Some(last) if now - last <= thresholds.staleness => {}
            Some(last) => problems.push(format!(
                "no intake since {last}; staleness limit is {}h",
                thresholds.staleness.num_hours()
            )),
            None => {
                if metrics.processed_messages > 0 {
                    problems.push("active sources but no recorded intake time".to_string());
                }
            }
        }
    }

    (problems.is_empty(), problems)
}
