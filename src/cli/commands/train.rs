//! Train command implementation

use super::validate::print_detailed_summary;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{
    apply_overrides, load_config, train_from_config, validate_config, MartConfig, TrainArgs,
};

/// Resolve the run configuration: file (or defaults), then command-line overrides
pub fn resolve_config(args: &TrainArgs) -> Result<MartConfig, String> {
    let mut config = match &args.config {
        Some(path) => load_config(path).map_err(|e| format!("Config error: {e}"))?,
        None => MartConfig::default(),
    };
    apply_overrides(&mut config, args);
    validate_config(&config).map_err(|e| format!("Validation failed: {e}"))?;
    Ok(config)
}

pub fn run_train(args: TrainArgs, level: LogLevel) -> Result<(), String> {
    let source = args
        .config
        .as_ref()
        .map_or_else(|| "defaults".to_string(), |p| p.display().to_string());
    log(
        level,
        LogLevel::Normal,
        &format!("Blindaje: MART training from {source}"),
    );

    let config = resolve_config(&args)?;

    if args.dry_run {
        log(
            level,
            LogLevel::Normal,
            "Dry run - config validated successfully",
        );
        if level == LogLevel::Verbose {
            print_detailed_summary(&config);
        }
        return Ok(());
    }

    let summary = train_from_config(&config).map_err(|e| format!("Training error: {e}"))?;

    log(level, LogLevel::Normal, "Training complete!");
    if let Some((epoch, acc)) = summary.history.best_robust() {
        log(
            level,
            LogLevel::Normal,
            &format!("  Best robust accuracy: {:.2}% (epoch {epoch})", 100.0 * acc),
        );
    }
    log(
        level,
        LogLevel::Normal,
        &format!(
            "  Adaptor interventions: {} of {} gaps",
            summary.interventions, summary.adapt.gaps_closed
        ),
    );
    log(
        level,
        LogLevel::Verbose,
        &format!("  Elapsed: {:.1}s", summary.elapsed_secs),
    );
    Ok(())
}
