//! Endpoint connectivity check.
use crate::commands::cli::ModelsArgs;
use tagflow_core::api as core_api;
use tagflow_plugins::executor::http_client;
use tagflow_plugins::probe::probe_models;

/// Probe every configured endpoint (or just `--endpoint`) and print its models.
pub async fn handle_models(
    cfg: &core_api::AppConfig,
    args: ModelsArgs,
) -> Result<(), core_api::CliError> {
    let endpoints: Vec<&core_api::Endpoint> = match &args.endpoint {
        Some(id) => {
            let ep = cfg
                .run
                .endpoints
                .iter()
                .find(|e| &e.id == id)
                .ok_or_else(|| core_api::ConfigError::UnknownEndpoint(id.clone()))?;
            vec![ep]
        }
        None => cfg.run.endpoints.iter().collect(),
    };

    if endpoints.is_empty() {
        return Err(core_api::ConfigError::Invalid {
            field: "endpoints",
            reason: "none configured".to_string(),
        }
        .into());
    }

    let http = http_client()?;
    let mut failures = 0usize;
    for ep in endpoints {
        match probe_models(&http, ep).await {
            Ok(report) => {
                println!(
                    "{} [{}] {} model(s), using {}",
                    ep.label(),
                    ep.kind,
                    report.models.len(),
                    report.selected
                );
                for model in &report.models {
                    println!("  {model}");
                }
            }
            Err(e) => {
                failures += 1;
                tracing::warn!(endpoint = %ep.id, error = %e, "probe failed");
                eprintln!("{} [{}] error: {e:#}", ep.label(), ep.kind);
            }
        }
    }

    if failures > 0 {
        return Err(core_api::CliError::Command(format!(
            "{failures} endpoint(s) failed the probe"
        )));
    }
    Ok(())
}
