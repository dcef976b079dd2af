use std::sync::Arc;
use std::time::Duration;

use super::observer::{failure_message, is_quiet_failure};
use super::*;
use crate::domain::{ErrorKind, Outcome};
use crate::error::HttpError;

fn transport_error() -> HttpError {
    HttpError::Transport {
        message: "connection reset".to_owned(),
    }
}

#[test]
fn tally_counts_outcomes_by_kind() -> Result<(), String> {
    let tally = OutcomeTally::new();
    tally.on_outcome(&Outcome::success(0, 0, 1, 200, Duration::ZERO));
    tally.on_outcome(&Outcome::success(0, 1, 2, 200, Duration::ZERO));
    tally.on_outcome(&Outcome::failure(
        1,
        0,
        3,
        ErrorKind::TransportFailure,
        Duration::ZERO,
    ));
    tally.on_outcome(&Outcome::failure(
        2,
        0,
        0,
        ErrorKind::Cancelled,
        Duration::ZERO,
    ));

    let snapshot = tally.snapshot();
    if snapshot.success != 2 {
        return Err(format!("Unexpected success count: {}", snapshot.success));
    }
    if snapshot.transport_failure != 1 || snapshot.cancelled != 1 {
        return Err(format!("Unexpected failure counts: {:?}", snapshot));
    }
    if snapshot.failures() != 2 {
        return Err(format!("Unexpected failures: {}", snapshot.failures()));
    }
    Ok(())
}

#[test]
fn tally_counts_only_retried_attempts() -> Result<(), String> {
    let tally = OutcomeTally::new();
    let err = transport_error();
    tally.on_attempt_failed(0, 1, &err, Some(Duration::from_millis(100)));
    tally.on_attempt_failed(0, 2, &err, Some(Duration::from_millis(200)));
    tally.on_attempt_failed(0, 3, &err, None);

    let snapshot = tally.snapshot();
    if snapshot.retried_attempts != 2 {
        return Err(format!(
            "Unexpected retried attempts: {}",
            snapshot.retried_attempts
        ));
    }
    if snapshot.timed_out_attempts != 0 {
        return Err("Transport errors are not timeouts".to_owned());
    }
    Ok(())
}

#[test]
fn observer_set_fans_out_to_every_member() -> Result<(), String> {
    let first = Arc::new(OutcomeTally::new());
    let second = Arc::new(OutcomeTally::new());
    let set = ObserverSet::new()
        .with(first.clone())
        .with(Arc::new(NoopObserver))
        .with(second.clone());
    if set.len() != 3 {
        return Err(format!("Unexpected observer count: {}", set.len()));
    }

    set.on_outcome(&Outcome::success(4, 9, 1, 204, Duration::from_millis(3)));

    if first.snapshot().success != 1 || second.snapshot().success != 1 {
        return Err("Outcome did not reach every observer".to_owned());
    }
    Ok(())
}

#[test]
fn latency_recorder_tracks_successful_requests_only() -> Result<(), String> {
    let recorder = LatencyRecorder::new().map_err(|err| err.to_string())?;
    if recorder.snapshot() != LatencySnapshot::default() {
        return Err("Fresh recorder should be empty".to_owned());
    }
    for (index, latency) in [10u64, 20, 30, 40, 1_000].into_iter().enumerate() {
        let request_index = u64::try_from(index).map_err(|err| err.to_string())?;
        recorder.on_outcome(&Outcome::success(
            0,
            request_index,
            1,
            200,
            Duration::from_millis(latency),
        ));
    }
    recorder.on_outcome(&Outcome::failure(
        0,
        5,
        3,
        ErrorKind::TransportFailure,
        Duration::from_secs(30),
    ));

    let snapshot = recorder.snapshot();
    if snapshot.count != 5 {
        return Err(format!("Unexpected count: {}", snapshot.count));
    }
    if snapshot.p50_ms != 30 {
        return Err(format!("Unexpected p50: {}", snapshot.p50_ms));
    }
    if !(999..=1_001).contains(&snapshot.max_ms) {
        return Err(format!("Unexpected max: {}", snapshot.max_ms));
    }
    Ok(())
}

#[test]
fn failure_logs_depend_on_the_error_kind() -> Result<(), String> {
    let checks = [
        (ErrorKind::ClientConstruction, true, "Request skipped, worker has no client"),
        (ErrorKind::RequestBuild, false, "Request could not be built"),
        (ErrorKind::TransportFailure, false, "Request failed after retries"),
        (ErrorKind::Cancelled, true, "Request cancelled"),
    ];
    for (kind, quiet, message) in checks {
        if is_quiet_failure(kind) != quiet {
            return Err(format!("Unexpected log level for {}", kind.as_str()));
        }
        if failure_message(kind) != message {
            return Err(format!(
                "Unexpected message for {}: {}",
                kind.as_str(),
                failure_message(kind)
            ));
        }
    }
    Ok(())
}

fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: std::future::Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

#[test]
fn diagnostics_server_serves_live_counters() -> Result<(), String> {
    run_async_test(async {
        let tally = Arc::new(OutcomeTally::new());
        let latency = Arc::new(LatencyRecorder::new().map_err(|err| err.to_string())?);
        let server = DiagnosticsServer::bind("127.0.0.1:0", tally.clone(), latency.clone())
            .await
            .map_err(|err| err.to_string())?;
        let addr = server.local_addr().map_err(|err| err.to_string())?;
        let (shutdown_tx, _) = crate::shutdown::shutdown_channel();
        let handle = tokio::spawn(
            server.serve(crate::shutdown::CancelSignal::subscribe(&shutdown_tx)),
        );

        let outcome = Outcome::success(0, 0, 1, 200, Duration::from_millis(12));
        tally.on_outcome(&outcome);
        latency.on_outcome(&outcome);

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}{}", addr, DIAGNOSTICS_PATH))
            .send()
            .await
            .map_err(|err| err.to_string())?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(format!("Unexpected status: {}", response.status()));
        }
        let body = response.text().await.map_err(|err| err.to_string())?;
        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|err| err.to_string())?;
        let success = value.pointer("/breakdown/success").and_then(serde_json::Value::as_u64);
        let count = value.pointer("/latency/count").and_then(serde_json::Value::as_u64);
        if success != Some(1) || count != Some(1) {
            return Err(format!("Unexpected diagnostics body: {}", body));
        }

        let missing = client
            .get(format!("http://{}/nope", addr))
            .send()
            .await
            .map_err(|err| err.to_string())?;
        if missing.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(format!("Unexpected status: {}", missing.status()));
        }

        shutdown_tx.trigger();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .map_err(|_| "Diagnostics server did not stop".to_owned())?
            .map_err(|err| err.to_string())?;
        Ok(())
    })
}

#[test]
fn diagnostics_bind_failure_names_the_address() -> Result<(), String> {
    run_async_test(async {
        let tally = Arc::new(OutcomeTally::new());
        let latency = Arc::new(LatencyRecorder::new().map_err(|err| err.to_string())?);
        match DiagnosticsServer::bind("not-an-address", tally, latency).await {
            Ok(_) => Err("Expected a bind error".to_owned()),
            Err(err) if err.to_string().contains("not-an-address") => Ok(()),
            Err(err) => Err(format!("Unexpected error: {}", err)),
        }
    })
}
