//! `strata layers`: Effective layer settings and the priority table.

use strata_config::AppConfig;
use strata_core::{IntentCategory, LayerId};

pub fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let table = config.priority_table()?;

    println!("Layers");
    println!("======");
    for id in LayerId::ALL {
        let layer = config.layers.get(id);
        let source = match (id, &layer.corpus) {
            (LayerId::History, _) => "conversation store".to_string(),
            (_, Some(path)) => path.display().to_string(),
            (_, None) => "not registered (no corpus)".to_string(),
        };
        println!(
            "  {id}  {:<26} {:<8} timeout={}ms max_chunks={}  {source}",
            id.label(),
            if layer.enabled { "enabled" } else { "disabled" },
            layer.timeout_ms,
            layer.max_chunks,
        );
    }

    println!();
    println!("Priority");
    println!("========");
    for category in IntentCategory::ALL {
        let order: Vec<&str> = table
            .priority_for(category)
            .iter()
            .map(LayerId::as_str)
            .collect();
        println!("  {:<22} {}", category.label(), order.join(" > "));
    }

    println!();
    println!("  Context budget: {} chars", config.retrieval.context_char_budget);
    println!("  Request deadline: {}ms", config.request_deadline_ms);
    Ok(())
}
