//! # Dual-Region Failover Test
//!
//! Drives a running dual-region deployment through a failover round trip
//! and verifies the status transitions over HTTP.

use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::Parser;
use lib_region::models::RegionStatus;
use serde_json::Value;

#[derive(Parser, Debug)]
#[clap(about = "Failover round-trip test against a live dual-region deployment", version)]
struct Args {
    #[clap(long, env = "REGION1_API", default_value = "http://localhost:8000")]
    region1_api: String,

    #[clap(long, env = "REGION2_API", default_value = "http://localhost:8100")]
    region2_api: String,
}

async fn check_health(client: &reqwest::Client, api: &str, name: &str) -> Result<()> {
    let data: Value = client
        .get(format!("{api}/health"))
        .timeout(Duration::from_secs(5))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    println!("[OK] {} is healthy", name);
    println!("     Status:  {}", data["status"]);
    println!("     Version: {}", data["version"]);
    Ok(())
}

async fn trigger_failover(client: &reqwest::Client, api: &str, source: &str) -> Result<String> {
    println!("\n--- Failover from {source} ---");
    let started = Instant::now();
    let response = client
        .post(format!("{api}/api/failover/simulate"))
        .timeout(Duration::from_secs(10))
        .send()
        .await?;

    if !response.status().is_success() {
        bail!("failover failed with status {}", response.status());
    }
    let data: Value = response.json().await?;
    let e2e = started.elapsed().as_secs_f64();

    println!("[OK] Failover successful");
    println!("     Source region:        {}", data["source_region"]);
    println!("     Target region:        {}", data["target_region"]);
    println!("     API reported latency: {}s", data["failover_latency_seconds"]);
    println!("     Total E2E latency:    {e2e:.6}s");
    println!("     Message:              {}", data["message"]);

    Ok(data["target_region"]
        .as_str()
        .unwrap_or_default()
        .to_string())
}

async fn region_status(client: &reqwest::Client, api: &str) -> Result<RegionStatus> {
    let data: Value = client
        .get(format!("{api}/api/status"))
        .timeout(Duration::from_secs(5))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    data["status"]
        .as_str()
        .unwrap_or_default()
        .parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = reqwest::Client::new();

    println!("==============================================");
    println!("REGIONAL FAILOVER TEST");
    println!("==============================================");

    check_health(&client, &args.region1_api, "Region 1").await?;
    check_health(&client, &args.region2_api, "Region 2").await?;

    // Round trip: region1 -> region2, then back.
    let target = trigger_failover(&client, &args.region1_api, "region1").await?;
    if target != "region2" {
        bail!("expected target region2, got {target}");
    }

    tokio::time::sleep(Duration::from_secs(1)).await;
    let r1 = region_status(&client, &args.region1_api).await?;
    let r2 = region_status(&client, &args.region2_api).await?;
    if r1 != RegionStatus::FailedOver || r2 != RegionStatus::Active {
        bail!("unexpected statuses after failover: region1={r1} region2={r2}");
    }

    println!("\nWaiting 3 seconds before testing failover back...");
    tokio::time::sleep(Duration::from_secs(3)).await;

    let target = trigger_failover(&client, &args.region2_api, "region2").await?;
    if target != "region1" {
        bail!("expected target region1, got {target}");
    }

    // Complete the cycle: restore the final source so both regions serve.
    client
        .post(format!("{}/api/failover/restore", args.region2_api))
        .send()
        .await?
        .error_for_status()?;

    tokio::time::sleep(Duration::from_secs(1)).await;
    let r1 = region_status(&client, &args.region1_api).await?;
    let r2 = region_status(&client, &args.region2_api).await?;
    if r1 != RegionStatus::Active || r2 != RegionStatus::Active {
        bail!("round trip did not restore active/active: region1={r1} region2={r2}");
    }

    println!("\n[OK] Round trip complete, both regions active");
    Ok(())
}
