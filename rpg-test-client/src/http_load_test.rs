//! HTTP API load test.
//!
//! Hammers the backend's JSON-over-HTTP endpoints with bounded
//! concurrency and reports per-endpoint latency percentiles
//! (p50/p95/p99), throughput and error rate.
//!
//! Usage:
//!   cargo run --release --bin http_load_test -- --url http://127.0.0.1:7070 --concurrency 20 --requests 200
//!
//! Requires: rpg-backend-server running on the target address.

use reqwest::Client;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

const LOAD_TEST_USER: &str = "load_test_user";
const LOAD_TEST_PASSWORD: &str = "load-test-pass-1";
const LOAD_TEST_NAME: &str = "負荷テスト";

// ============================================================================
// Endpoint definitions
// ============================================================================

struct Endpoint {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    body: Option<Value>,
}

fn all_endpoints() -> Vec<Endpoint> {
    vec![
        Endpoint {
            name: "Health",
            method: "GET",
            path: "/health",
            body: None,
        },
        // The expensive one: every login runs the full PBKDF2 verify.
        Endpoint {
            name: "Login",
            method: "POST",
            path: "/LOGIN",
            body: Some(json!({"ID": LOAD_TEST_USER, "Password": LOAD_TEST_PASSWORD})),
        },
        Endpoint {
            name: "SelectPlayer",
            method: "GET",
            path: "/SELECTPLAYER?UserId=load_test_user",
            body: None,
        },
        Endpoint {
            name: "SelectAllPlayer",
            method: "GET",
            path: "/SELECTALLPLAYER",
            body: None,
        },
        Endpoint {
            name: "SelectEvents",
            method: "GET",
            path: "/SELECTEVENTS?eventId=1",
            body: None,
        },
        Endpoint {
            name: "Update",
            method: "POST",
            path: "/UPDATE",
            body: Some(json!({"UserId": LOAD_TEST_USER, "Exp": 10, "Parameter1": 5})),
        },
    ]
}

// ============================================================================
// Per-endpoint statistics
// ============================================================================

struct EndpointStats {
    name: &'static str,
    latencies_us: parking_lot::Mutex<Vec<u64>>,
    success: AtomicU64,
    errors: AtomicU64,
}

impl EndpointStats {
    fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            latencies_us: parking_lot::Mutex::new(Vec::with_capacity(capacity)),
            success: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    fn record(&self, duration_us: u64, ok: bool) {
        self.latencies_us.lock().push(duration_us);
        if ok {
            self.success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn percentile(&self, p: f64) -> f64 {
        let mut lat = self.latencies_us.lock().clone();
        if lat.is_empty() {
            return 0.0;
        }
        lat.sort_unstable();
        let idx = ((p / 100.0) * lat.len() as f64) as usize;
        let idx = idx.min(lat.len() - 1);
        lat[idx] as f64 / 1000.0 // return ms
    }
}

// ============================================================================
// Fixture
// ============================================================================

/// Registers the throwaway account and player the endpoint bodies point
/// at. Reruns hit 409 on both inserts; that just means the fixture is
/// already there.
async fn seed_fixture(client: &Client, base_url: &str) {
    let steps = [
        (
            "/INSERTUSER",
            json!({
                "ID": LOAD_TEST_USER,
                "Password": LOAD_TEST_PASSWORD,
                "Name": LOAD_TEST_NAME,
            }),
        ),
        ("/INSERTPLAYER", json!({"UserId": LOAD_TEST_USER})),
    ];
    for (path, body) in steps {
        let sent = client
            .post(format!("{}{}", base_url, path))
            .json(&body)
            .send()
            .await;
        match sent {
            Ok(resp) if resp.status().is_success() || resp.status() == 409 => {}
            Ok(resp) => {
                eprintln!("Fixture setup failed: {} returned HTTP {}", path, resp.status());
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("Fixture setup failed: {}: {}", path, e);
                std::process::exit(1);
            }
        }
    }
    println!("Fixture account/player ready: {}", LOAD_TEST_USER);
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    let base_url = parse_str_arg(&args, "--url").unwrap_or_else(|| "http://127.0.0.1:7070".into());
    let concurrency: usize = parse_num_arg(&args, "--concurrency").unwrap_or(20);
    let requests: usize = parse_num_arg(&args, "--requests").unwrap_or(200);

    println!("=== HTTP API Load Test ===");
    println!("  Target:      {}", base_url);
    println!("  Concurrency: {}", concurrency);
    println!("  Requests:    {} per endpoint", requests);
    println!();

    // Verify server is up
    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create HTTP client");

    match client.get(format!("{}/health", base_url)).send().await {
        Ok(resp) if resp.status().is_success() => {
            println!("Server health check: OK");
        }
        Ok(resp) => {
            eprintln!("Server health check failed: HTTP {}", resp.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Cannot reach server at {}: {}", base_url, e);
            std::process::exit(1);
        }
    }

    seed_fixture(&client, &base_url).await;

    let endpoints = all_endpoints();
    let stats: Vec<Arc<EndpointStats>> = endpoints
        .iter()
        .map(|e| Arc::new(EndpointStats::new(e.name, requests)))
        .collect();
    let semaphore = Arc::new(Semaphore::new(concurrency));

    println!("Running load test...\n");
    let start = Instant::now();

    let mut handles = Vec::with_capacity(endpoints.len() * requests);
    for (endpoint, stat) in endpoints.iter().zip(&stats) {
        let url = format!("{}{}", base_url, endpoint.path);
        let body = endpoint.body.as_ref().map(|b| b.to_string());
        let method = endpoint.method;

        for _ in 0..requests {
            let client = client.clone();
            let sem = semaphore.clone();
            let stat = stat.clone();
            let url = url.clone();
            let body = body.clone();

            handles.push(tokio::spawn(async move {
                let _permit = sem.acquire().await.unwrap();

                let req_start = Instant::now();
                let result = if method == "GET" {
                    client.get(&url).send().await
                } else {
                    let mut req = client.post(&url).header("content-type", "application/json");
                    if let Some(b) = body {
                        req = req.body(b);
                    }
                    req.send().await
                };

                let ok = match &result {
                    Ok(resp) => resp.status().is_success(),
                    Err(_) => false,
                };
                stat.record(req_start.elapsed().as_micros() as u64, ok);
            }));
        }
    }

    for h in handles {
        h.await.unwrap();
    }

    let total_time = start.elapsed();

    // Print results
    println!("=== Results ===\n");

    let mut total_reqs = 0u64;
    let mut total_errors = 0u64;
    for stat in &stats {
        total_reqs += stat.success.load(Ordering::Relaxed) + stat.errors.load(Ordering::Relaxed);
        total_errors += stat.errors.load(Ordering::Relaxed);
    }
    println!(
        "Total: {} requests in {:.2}s ({:.1} rps)\n",
        total_reqs,
        total_time.as_secs_f64(),
        total_reqs as f64 / total_time.as_secs_f64()
    );

    println!(
        "{:<25} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "Endpoint", "Count", "Errors", "p50(ms)", "p95(ms)", "p99(ms)", "Err%"
    );
    println!("{}", "-".repeat(85));

    for stat in &stats {
        let success = stat.success.load(Ordering::Relaxed);
        let errors = stat.errors.load(Ordering::Relaxed);
        let count = success + errors;
        let err_pct = if count > 0 {
            errors as f64 / count as f64 * 100.0
        } else {
            0.0
        };

        println!(
            "{:<25} {:>8} {:>8} {:>8.2} {:>8.2} {:>8.2} {:>7.1}%",
            stat.name,
            count,
            errors,
            stat.percentile(50.0),
            stat.percentile(95.0),
            stat.percentile(99.0),
            err_pct,
        );
    }

    println!("{}", "-".repeat(85));
    println!("{:<25} {:>8} {:>8}", "TOTAL", total_reqs, total_errors);

    // Exit with error code if error rate > 10%
    let error_rate = total_errors as f64 / total_reqs.max(1) as f64;
    if error_rate > 0.10 {
        eprintln!(
            "\nERROR: Error rate {:.1}% exceeds 10% threshold",
            error_rate * 100.0
        );
        std::process::exit(1);
    }
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_num_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    parse_str_arg(args, flag).and_then(|v| v.parse().ok())
}
