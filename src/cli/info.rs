use anyhow::Result;
use prompt_analyzer::{Availability, AvailabilityOptions, LanguageModel};
use serde::Serialize;

use crate::cli::context::CliContext;
use crate::config::{ModelProvider, StoreKind};

#[derive(Debug, Serialize)]
struct InfoReport {
    version: &'static str,
    build_date: &'static str,
    git_commit: &'static str,
    config_path: String,
    store: StoreKind,
    store_path: String,
    cache_ttl_ms: i64,
    window_max_chars: usize,
    confidence_threshold: f64,
    heuristic_fallback: bool,
    model_provider: ModelProvider,
    model_availability: Option<Availability>,
}

pub async fn cmd_info(ctx: &CliContext) -> Result<()> {
    let config = ctx.config();
    let availability = match config.model.provider {
        ModelProvider::Scripted => None,
        ModelProvider::Openai => ctx
            .model(Vec::new())?
            .availability(&AvailabilityOptions::language(config.analyzer.language.clone()))
            .await
            .ok(),
    };

    let report = InfoReport {
        version: env!("CARGO_PKG_VERSION"),
        build_date: option_env!("BUILD_DATE").unwrap_or("unknown"),
        git_commit: option_env!("GIT_HASH").unwrap_or("unknown"),
        config_path: ctx.config_path().display().to_string(),
        store: config.cache.store,
        store_path: config.cache.store_path.display().to_string(),
        cache_ttl_ms: config.cache.ttl_ms,
        window_max_chars: config.preprocess.max_chars,
        confidence_threshold: config.analyzer.confidence_threshold,
        heuristic_fallback: config.heuristic_fallback,
        model_provider: config.model.provider,
        model_availability: availability,
    };

    ctx.output().emit(&report, |report| {
        println!("CartTotal System Information");
        println!("============================");
        println!("Version: {}", report.version);
        println!("Build Date: {}", report.build_date);
        println!("Git Commit: {}", report.git_commit);
        println!();
        println!("Configuration ({}):", report.config_path);
        println!("- Selector store: {:?} ({})", report.store, report.store_path);
        println!("- Cache TTL: {} ms", report.cache_ttl_ms);
        println!("- Window budget: {} chars", report.window_max_chars);
        println!("- Confidence threshold: {}", report.confidence_threshold);
        println!(
            "- Heuristic fallback: {}",
            if report.heuristic_fallback { "enabled" } else { "disabled" }
        );
        match report.model_availability {
            Some(status) => println!("- Model: {:?} ({status:?})", report.model_provider),
            None => println!("- Model: {:?}", report.model_provider),
        }
    })
}
