//! Test command implementation.
//!
//! Runs scrape cycles against supervisord and displays the emitted points.

use std::time::Instant;

use supervisord_exporter::builder::{PROCESS_COUNT, PROCESS_UPTIME};
use supervisord_exporter::config::Config;
use supervisord_exporter::{BuildInfo, SupervisordScraper};

/// Runs `iterations` scrape cycles, one per collection interval.
pub async fn command_test(
    iterations: usize,
    verbose: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🧪 supervisord exporter - Test Mode");
    println!("===================================");

    let mut scraper = SupervisordScraper::new(config.clone(), BuildInfo::default());
    scraper.start()?;

    for iteration in 1..=iterations {
        if iteration > 1 {
            tokio::time::sleep(config.collection_interval()).await;
        }
        println!("\n🔄 Iteration {}/{}:", iteration, iterations);

        let start = Instant::now();
        let result = scraper.scrape().await;
        println!(
            "   ⏱️  Scrape duration: {:.2}ms",
            start.elapsed().as_secs_f64() * 1000.0
        );

        let metrics = match result {
            Ok(metrics) => metrics,
            Err(e) => {
                println!("   ❌ Scrape failed: {}", e);
                continue;
            }
        };

        for metric in metrics.iter_metrics() {
            if metric.name == PROCESS_COUNT.name {
                if let Some(point) = metric.points.first() {
                    println!("   📊 Processes: {}", point.value);
                }
            } else if metric.name == PROCESS_UPTIME.name {
                println!("   📈 Uptime points: {}", metric.points.len());
                if verbose {
                    for point in &metric.points {
                        let name = point.attributes.get("name").map(String::as_str).unwrap_or("?");
                        println!("      ├─ {}: {}s", name, point.value);
                    }
                }
            }
        }
    }

    println!("\n✅ Test completed");
    Ok(())
}
