use clap::Parser;
use tagflow_cli::app;
use tagflow_cli::commands::{cli, init, models};
use tagflow_core::api as core_api;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            e.exit_code()
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, core_api::CliError> {
    let cli::Args { command, config } = cli::Args::parse();

    match command {
        // init must work even when the existing config does not parse.
        cli::Commands::Init(init_args) => {
            init::handle_init(init_args, config.as_deref())?;
            Ok(0)
        }
        cli::Commands::Run(run_args) => {
            let cfg = load_config(config.as_deref())?;
            app::run_batch(cfg, run_args).await
        }
        cli::Commands::Models(models_args) => {
            let cfg = load_config(config.as_deref())?;
            models::handle_models(&cfg, models_args).await?;
            Ok(0)
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<core_api::AppConfig, core_api::CliError> {
    let cfg = core_api::load(path).map_err(|e| core_api::ConfigError::Load(format!("{e:#}")))?;
    init_tracing(&cfg.logging).map_err(core_api::CliError::Command)?;
    Ok(cfg)
}

fn init_tracing(logging: &core_api::LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("tagflow"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("tagflow.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
