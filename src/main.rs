use std::{process, sync::Arc};

use clap::Parser;
use tokio::sync::watch;

use weaver::{
    config::Config,
    core::{CancelHandle, HttpMethod, IntegratorError, IntegratorResult, Request, Response},
    executor::{HttpExecutor, HttpExecutorConfig},
    logging::Logger,
    orchestration::{Integrator, IntegratorOptions},
};

/// Execute one integration and print the combined response as JSON.
#[derive(Parser, Debug)]
#[command(name = "weaver", version)]
struct Opt {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    conf: String,

    /// Identifier of the integration to execute
    integration: String,

    /// Request method (GET, POST, PUT, DELETE)
    #[arg(short, long, default_value = "GET")]
    method: HttpMethod,

    /// Request body as JSON
    #[arg(short, long)]
    body: Option<String>,

    /// Request header, as NAME=VALUE (repeatable)
    #[arg(long = "header", value_parser = parse_pair)]
    headers: Vec<(String, String)>,

    /// Query parameter, as NAME=VALUE (repeatable)
    #[arg(long = "query", value_parser = parse_pair)]
    query: Vec<(String, String)>,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))
}

impl Opt {
    fn to_request(&self) -> IntegratorResult<Request> {
        let body = match &self.body {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| IntegratorError::serialization_error("Invalid --body JSON", e))?,
            None => serde_json::Value::Null,
        };

        Ok(Request {
            method: self.method,
            headers: self.headers.iter().cloned().collect(),
            body,
            query: self.query.iter().cloned().collect(),
        })
    }
}

#[tokio::main]
async fn main() {
    let opt = Opt::parse();

    let config = match Config::load_from_yaml(&opt.conf) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    // Initialize logging
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let log_task = match &config.weaver.log {
        Some(log_cfg) => {
            let logger = Logger::new(log_cfg.clone());
            if let Err(e) = logger.init_env_logger() {
                eprintln!("{e}");
                process::exit(1);
            }
            Some(tokio::spawn(logger.run(shutdown_rx)))
        }
        None => {
            env_logger::init();
            None
        }
    };

    let result = run(&opt, &config).await;

    if let Some(task) = log_task {
        let _ = shutdown_tx.send(true);
        match task.await {
            Ok(Err(e)) => eprintln!("Log sink failed: {e}"),
            Err(e) => eprintln!("Log sink task failed: {e}"),
            Ok(Ok(())) => {}
        }
    }

    match result.and_then(|response| Ok(serde_json::to_string_pretty(&response)?)) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

async fn run(opt: &Opt, config: &Config) -> IntegratorResult<Response> {
    let request = opt.to_request()?;
    let registry = Arc::new(config.build_registry()?);
    if !registry.contains(&opt.integration) {
        eprintln!("Known integrations: {}", registry.ids().join(", "));
        return Err(IntegratorError::IntegrationNotFound(opt.integration.clone()));
    }

    let executor = HttpExecutor::new(HttpExecutorConfig::from(&config.http))?;
    let integrator = Integrator::new(registry, Arc::new(executor))
        .with_options(IntegratorOptions::from(&config.weaver));
    log::debug!("Execution options: {:?}", integrator.options());

    // Ctrl-C cancels the in-flight call
    let (handle, signal) = CancelHandle::new();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupt received, cancelling");
            handle.cancel();
        }
    });

    let result = integrator
        .execute_with_cancel(&opt.integration, &request, signal)
        .await;
    ctrl_c.abort();
    result
}
