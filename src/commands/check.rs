//! Check command implementation.
//!
//! Validates configuration and the supervisord socket.

use supervisord_exporter::client::{check_socket_reachable, socket_path_from_endpoint};
use supervisord_exporter::config::{validate_effective_config, Config};
use supervisord_exporter::{BuildInfo, SupervisordScraper};

/// Validates configuration, socket reachability and optionally one scrape.
pub async fn command_check(scrape: bool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 supervisord exporter - System Check");
    println!("======================================");

    let mut all_ok = true;

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n🔌 Checking supervisord socket...");
    match socket_path_from_endpoint(config.endpoint()) {
        Ok(path) => match check_socket_reachable(&path) {
            Ok(_) => println!("   ✅ {} is reachable", path.display()),
            Err(e) => {
                println!("   ❌ {}", e);
                all_ok = false;
            }
        },
        Err(e) => {
            println!("   ❌ {}", e);
            all_ok = false;
        }
    }

    if scrape && all_ok {
        println!("\n📡 Running one scrape cycle...");
        let mut scraper = SupervisordScraper::new(config.clone(), BuildInfo::default());
        match scraper.start() {
            Ok(_) => match scraper.scrape().await {
                Ok(metrics) => println!(
                    "   ✅ Scrape succeeded: {} data points",
                    metrics.data_point_count()
                ),
                Err(e) => {
                    println!("   ❌ Scrape failed: {}", e);
                    all_ok = false;
                }
            },
            Err(e) => {
                println!("   ❌ Scraper failed to start: {}", e);
                all_ok = false;
            }
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - exporter is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review the output above");
        std::process::exit(1);
    }
}
