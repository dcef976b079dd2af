use serde::Serialize;

use volley::args::OutputFormat;
use volley::domain::RunSummary;
use volley::error::AppResult;
use volley::metrics::{LatencySnapshot, TallySnapshot};

#[derive(Debug, Serialize)]
struct SummaryReport<'run> {
    #[serde(flatten)]
    run: &'run RunSummary,
    breakdown: &'run TallySnapshot,
    latency: &'run LatencySnapshot,
    success_rate_x100: u64,
    throughput_x100: u64,
}

pub(crate) fn summary_lines(
    summary: &RunSummary,
    breakdown: &TallySnapshot,
    latency: &LatencySnapshot,
) -> Vec<String> {
    let success_rate = summary.success_rate_x100();
    let throughput = summary.throughput_x100();
    let mut lines = vec![
        format!(
            "Duration: {}.{:03}s",
            summary.elapsed_ms / 1000,
            summary.elapsed_ms % 1000
        ),
        format!("Total Requests: {}", summary.total_requests()),
        format!(
            "Successful: {} ({}.{:02}%)",
            summary.total_success,
            success_rate / 100,
            success_rate % 100
        ),
        format!("Failed: {}", summary.total_failure),
        format!("  Transport Failures: {}", breakdown.transport_failure),
        format!("  Client Construction: {}", breakdown.client_construction),
        format!("  Request Build: {}", breakdown.request_build),
        format!("  Cancelled: {}", breakdown.cancelled),
        format!(
            "Retried Attempts: {} (timeouts: {})",
            breakdown.retried_attempts, breakdown.timed_out_attempts
        ),
        format!(
            "Latency (ok): p50 {}ms, p90 {}ms, p99 {}ms, max {}ms",
            latency.p50_ms, latency.p90_ms, latency.p99_ms, latency.max_ms
        ),
        format!("Throughput: {}.{:02} req/s", throughput / 100, throughput % 100),
    ];
    if summary.cancelled {
        lines.push("Run was cancelled before every request was sent.".to_owned());
    }
    for worker in &summary.per_worker {
        lines.push(format!(
            "Worker {}: Success: {}, Failures: {}",
            worker.worker_id, worker.success_count, worker.failure_count
        ));
    }
    lines
}

/// Writes the end-of-run report to stdout.
///
/// # Errors
///
/// Returns an error when the JSON report cannot be serialized.
pub(crate) fn print_summary(
    format: OutputFormat,
    summary: &RunSummary,
    breakdown: &TallySnapshot,
    latency: &LatencySnapshot,
) -> AppResult<()> {
    match format {
        OutputFormat::Text => {
            for line in summary_lines(summary, breakdown, latency) {
                println!("{}", line);
            }
        }
        OutputFormat::Json => {
            let report = SummaryReport {
                run: summary,
                breakdown,
                latency,
                success_rate_x100: summary.success_rate_x100(),
                throughput_x100: summary.throughput_x100(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use volley::domain::WorkerSummary;

    fn worker(id: usize, success: u64, failure: u64) -> WorkerSummary {
        WorkerSummary {
            worker_id: id,
            success_count: success,
            failure_count: failure,
            cancelled: false,
        }
    }

    #[test]
    fn summary_lines_report_totals_and_workers() -> Result<(), String> {
        let summary = RunSummary::from_workers(
            vec![worker(0, 9, 1), worker(1, 10, 0)],
            Duration::from_millis(2_500),
        );
        let breakdown = TallySnapshot {
            success: 19,
            transport_failure: 1,
            retried_attempts: 2,
            ..TallySnapshot::default()
        };
        let latency = LatencySnapshot {
            count: 19,
            p50_ms: 12,
            p90_ms: 40,
            p99_ms: 95,
            max_ms: 120,
        };
        let lines = summary_lines(&summary, &breakdown, &latency);
        let expected = [
            "Duration: 2.500s",
            "Total Requests: 20",
            "Successful: 19 (95.00%)",
            "Failed: 1",
            "  Transport Failures: 1",
            "Latency (ok): p50 12ms, p90 40ms, p99 95ms, max 120ms",
            "Throughput: 8.00 req/s",
            "Worker 1: Success: 10, Failures: 0",
        ];
        for line in expected {
            if !lines.iter().any(|actual| actual == line) {
                return Err(format!("Missing line '{}' in {:?}", line, lines));
            }
        }
        if lines.iter().any(|line| line.contains("cancelled before")) {
            return Err("Uncancelled run reported as cancelled".to_owned());
        }
        Ok(())
    }
}
