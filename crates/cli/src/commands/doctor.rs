//! `strata doctor`: Diagnose configuration health.

use std::path::Path;
use strata_config::AppConfig;
use strata_core::LayerId;
use strata_pipeline::IntentClassifier;

pub async fn run(explicit: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Strata Doctor — Configuration Diagnostics");
    println!("=========================================\n");

    let mut issues = 0;
    let path = super::config_path(explicit);

    if path.exists() {
        println!("  ✅ Config file found at {}", path.display());
    } else {
        println!("  ⚠️  No config file at {} — using defaults", path.display());
        println!("      Run `strata config > {}` to create one", path.display());
    }

    let config = match super::load_config(explicit) {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  Fix the configuration before running other checks.");
            return Ok(());
        }
    };

    // Providers in priority order
    let registry = strata_providers::build_from_config(&config);
    for id in &config.provider_priority {
        if registry.contains(id) {
            println!("  ✅ Provider '{id}' ready");
        } else if config.providers.contains_key(id) {
            println!("  ⚠️  Provider '{id}' has no api_key or api_url — it will be skipped");
            issues += 1;
        } else {
            println!("  ❌ Provider '{id}' is in provider_priority but not configured");
            issues += 1;
        }
    }

    // Classifier
    match IntentClassifier::from_config(&config, &registry) {
        Ok(classifier) if classifier.has_model() => {
            println!("  ✅ Classifier patterns compile; model fallback enabled")
        }
        Ok(_) => println!("  ⚠️  Classifier patterns compile; no model fallback (keyword-only)"),
        Err(e) => {
            println!("  ❌ Classifier: {e}");
            issues += 1;
        }
    }

    // Corpora
    for id in [LayerId::Industry, LayerId::Shared, LayerId::Client] {
        let layer = config.layers.get(id);
        match &layer.corpus {
            Some(corpus) if corpus.exists() => println!("  ✅ {id} corpus {}", corpus.display()),
            Some(corpus) => {
                println!("  ❌ {id} corpus missing: {}", corpus.display());
                issues += 1;
            }
            None if layer.enabled => {
                println!("  ⚠️  {id} enabled without a corpus — it will report not_registered");
                issues += 1;
            }
            None => println!("  ➖ {id} disabled"),
        }
    }

    // Tenants
    let tenants = &config.tenants.entries;
    if tenants.is_empty() {
        println!("  ⚠️  No tenants configured — `ask` uses a local scope");
    } else {
        let active = tenants.iter().filter(|t| t.active).count();
        println!(
            "  ✅ {} tenant(s), {active} active, under {}",
            tenants.len(),
            config.tenants.base_domain
        );
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
