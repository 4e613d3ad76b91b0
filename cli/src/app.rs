//! CLI 应用装配层：合并配置覆盖、扫描目录、构建引擎并执行批量标注。
use std::sync::Arc;

use crate::commands::cli::RunArgs;
use tagflow_core::api as core_api;
use tagflow_plugins::dataset::{export_dataset, ingest_path};
use tagflow_plugins::factory::build_engine;

/// Exit code when the run was interrupted with Ctrl-C.
pub const EXIT_INTERRUPTED: i32 = 130;
/// Exit code when at least one task ended in error.
pub const EXIT_TASKS_FAILED: i32 = 1;

/// Fold command-line overrides into the loaded run configuration.
pub fn apply_overrides(
    mut run: core_api::RunConfig,
    args: &RunArgs,
) -> Result<core_api::RunConfig, core_api::ConfigError> {
    if let Some(n) = args.concurrency {
        if n == 0 {
            return Err(core_api::ConfigError::Invalid {
                field: "concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        run.concurrency = n;
    }
    Ok(run)
}

#[tracing::instrument(name = "cli.run_batch", skip(cfg, args), fields(dir = %args.dir.display()))]
pub async fn run_batch(cfg: core_api::AppConfig, args: RunArgs) -> Result<i32, core_api::CliError> {
    let run_cfg = apply_overrides(cfg.run, &args)?;
    let live = core_api::LiveConfig::new(run_cfg);

    let tasks = ingest_path(&args.dir, args.recursive)
        .await
        .map_err(|e| core_api::CliError::Command(format!("{e:#}")))?;
    if tasks.is_empty() {
        println!("No images found in {}", args.dir.display());
        return Ok(0);
    }

    let board = Arc::new(core_api::TaskBoard::new(tasks));
    let engine = build_engine(live, args.format.as_str(), board.clone())?;
    engine.preflight()?;

    let stats = board.stats();
    tracing::info!(
        total = stats.total,
        already_labeled = stats.completed,
        format = args.format.as_str(),
        "tasks loaded"
    );

    let run = engine.run(board.clone());
    tokio::pin!(run);
    let result = tokio::select! {
        res = &mut run => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupt received, stopping workers");
            engine.cancel_all();
            run.await
        }
    };

    let summary = match result {
        Ok(summary) => Some(summary),
        Err(core_api::ExecutorError::NothingToDo) => {
            println!("All {} images are already labeled.", stats.total);
            None
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(out) = &args.out {
        let report = export_dataset(&board.snapshot(), out)
            .await
            .map_err(|e| core_api::CliError::Command(format!("export failed: {e:#}")))?;
        println!(
            "Exported {} images ({} labeled) to {}",
            report.images,
            report.labeled,
            out.display()
        );
    }

    Ok(match summary {
        Some(s) if s.cancelled => EXIT_INTERRUPTED,
        Some(s) if s.failed > 0 => EXIT_TASKS_FAILED,
        _ => 0,
    })
}
