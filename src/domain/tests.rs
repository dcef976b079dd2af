use std::time::Duration;

use super::*;
use crate::error::ValidationError;

#[test]
fn run_config_accepts_valid_parameters() -> Result<(), String> {
    let config = RunConfig::new("https://target.example.com/path", 64, 10_000, 20)
        .map_err(|err| format!("Unexpected validation error: {}", err))?;
    if config.target().as_str() != "https://target.example.com/path" {
        return Err(format!("Unexpected target: {}", config.target()));
    }
    if config.worker_count().get() != 64 {
        return Err("Unexpected worker count".to_owned());
    }
    if config.planned_requests() != 640_000 {
        return Err(format!(
            "Unexpected planned requests: {}",
            config.planned_requests()
        ));
    }
    Ok(())
}

#[test]
fn run_config_rejects_zero_counts() -> Result<(), String> {
    let cases = [
        (0usize, 1u64, 1u64, "worker count"),
        (1, 0, 1, "requests per worker"),
        (1, 1, 0, "rate per second"),
    ];
    for (workers, requests, rate, expected_field) in cases {
        match RunConfig::new("http://localhost", workers, requests, rate) {
            Err(ValidationError::FieldTooSmall { field, min: 1 }) if field == expected_field => {}
            other => {
                return Err(format!(
                    "Expected {} to be rejected, got {:?}",
                    expected_field, other
                ));
            }
        }
    }
    Ok(())
}

#[test]
fn run_config_rejects_bad_targets() -> Result<(), String> {
    if !matches!(
        RunConfig::new("", 1, 1, 1),
        Err(ValidationError::MissingUrl)
    ) {
        return Err("Expected empty target to be rejected".to_owned());
    }
    if !matches!(
        RunConfig::new("not a url", 1, 1, 1),
        Err(ValidationError::InvalidUrl { .. })
    ) {
        return Err("Expected malformed target to be rejected".to_owned());
    }
    if !matches!(
        RunConfig::new("ftp://files.example.com", 1, 1, 1),
        Err(ValidationError::UnsupportedScheme { .. })
    ) {
        return Err("Expected ftp scheme to be rejected".to_owned());
    }
    Ok(())
}

#[test]
fn worker_summary_counts_each_outcome_once() -> Result<(), String> {
    let mut summary = WorkerSummary::new(3);
    summary.record(&Outcome::success(3, 0, 1, 200, Duration::from_millis(5)));
    summary.record(&Outcome::failure(
        3,
        1,
        3,
        ErrorKind::TransportFailure,
        Duration::from_millis(700),
    ));
    summary.record(&Outcome::success(3, 2, 2, 503, Duration::from_millis(120)));

    if summary.success_count != 2 || summary.failure_count != 1 {
        return Err(format!("Unexpected counts: {:?}", summary));
    }
    if summary.total() != 3 {
        return Err(format!("Unexpected total: {}", summary.total()));
    }
    Ok(())
}

#[test]
fn run_summary_aggregates_workers() -> Result<(), String> {
    let workers = vec![
        WorkerSummary {
            worker_id: 0,
            success_count: 8,
            failure_count: 2,
            cancelled: false,
        },
        WorkerSummary {
            worker_id: 1,
            success_count: 5,
            failure_count: 1,
            cancelled: true,
        },
    ];
    let summary = RunSummary::from_workers(workers, Duration::from_secs(2));

    if summary.total_success != 13 || summary.total_failure != 3 {
        return Err(format!("Unexpected totals: {:?}", summary));
    }
    if !summary.cancelled {
        return Err("Expected cancelled flag to propagate".to_owned());
    }
    if summary.success_rate_x100() != 8125 {
        return Err(format!(
            "Unexpected success rate: {}",
            summary.success_rate_x100()
        ));
    }
    if summary.throughput_x100() != 800 {
        return Err(format!("Unexpected throughput: {}", summary.throughput_x100()));
    }
    Ok(())
}

#[test]
fn outcome_serializes_error_kind_in_snake_case() -> Result<(), String> {
    let outcome = Outcome::failure(1, 4, 0, ErrorKind::ClientConstruction, Duration::ZERO);
    let json = serde_json::to_string(&outcome).map_err(|err| err.to_string())?;
    if !json.contains("\"error_kind\":\"client_construction\"") {
        return Err(format!("Unexpected json: {}", json));
    }
    Ok(())
}
