//! Check command implementation.
//!
//! Probes every pipeline of every domain on the current host.

use hostmetrics::{CompositeSource, Config, ProbeResult, SourceSet};

fn print_probe(results: &[ProbeResult]) -> bool {
    let mut any_ok = false;
    for result in results {
        match &result.error {
            None => {
                println!("   ✅ {}", result.pipeline);
                any_ok = true;
            }
            Some(e) => println!("   ❌ {}: {}", result.pipeline, e),
        }
    }
    any_ok
}

fn check_domain<T>(icon: &str, source: &CompositeSource<T>) -> bool {
    println!("\n{} Checking {} pipelines...", icon, source.domain());
    match source.probe() {
        Ok(results) => {
            let ok = print_probe(&results);
            if !ok {
                println!("   ❌ No pipeline produced a {} snapshot", source.domain());
            }
            ok
        }
        Err(e) => {
            println!("   ⚠️  {}", e);
            false
        }
    }
}

/// Probes all sources and validates `config`. Returns whether every check passed.
pub fn command_check(sources: &SourceSet, config: &Config) -> bool {
    println!("🔍 hostmetrics - System Check ({})", sources.platform);
    println!("=========================================");

    let mut all_ok = true;

    all_ok &= check_domain("🧮", &sources.cpu);
    all_ok &= check_domain("💾", &sources.memory);
    all_ok &= check_domain("📈", &sources.load);
    all_ok &= check_domain("⏱️ ", &sources.uptime);
    all_ok &= check_domain("🌐", &sources.network);
    all_ok &= check_domain("🗄️ ", &sources.storage);
    all_ok &= check_domain("🖥️ ", &sources.environment);

    println!("\n📁 Checking process reads...");
    if sources.process.is_supported() {
        let pid = std::process::id();
        match sources.process.read(pid) {
            Ok(snapshot) => println!(
                "   ✅ Read own process {}: RSS={}MB, threads={}",
                pid,
                snapshot.resources.rss_bytes / 1024 / 1024,
                snapshot.resources.thread_count
            ),
            Err(e) => {
                println!("   ❌ Cannot read own process {}: {}", pid, e);
                all_ok = false;
            }
        }
    } else {
        println!("   ⚠️  Process reads are not supported on {}", sources.platform);
    }

    println!("\n⚙️  Checking configuration...");
    match config.validate() {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - every domain has a working pipeline");
    } else {
        println!("   ❌ Some checks failed - please review the output above");
    }
    all_ok
}
