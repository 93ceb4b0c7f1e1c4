use diamond_inspector::{
    abi::value_to_json,
    cache::{
        CacheSession,
        SledCacheRepository,
    },
    explorer::{
        ExplorerGateway,
        HttpExplorerTransport,
    },
    loupe::{
        read_method,
        ProviderLoupe,
    },
    render::{
        graph,
        ring,
        LayoutKind,
    },
    FacetOrchestrator,
    InspectorConfig,
};

use alloy_primitives::utils::format_ether;
use alloy_provider::ProviderBuilder;
use anyhow::{
    anyhow,
    Result,
};
use clap::Parser;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{
    info,
    warn,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI args
    let config = InspectorConfig::parse();
    let diamond = config.resolve_diamond().await?;
    info!(target: "diamond-inspector", ?diamond, "Inspecting diamond");

    let token = CancellationToken::new();
    tokio::spawn({
        let token = token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!(target: "diamond-inspector", "Interrupted, cancelling");
                token.cancel();
            }
        }
    });

    let cache = CacheSession::load(SledCacheRepository::open(&config.cache_path)?)
        .with_policy(config.staleness_policy());
    let transport = HttpExplorerTransport::new(
        config.explorer_url.clone(),
        config.chain_id,
        config.api_key.clone(),
        config.request_timeout(),
    )?;
    let gateway = ExplorerGateway::new(transport, config.retry_policy());
    let mut orchestrator = FacetOrchestrator::new(gateway, cache, config.orchestrator_config());

    let provider = ProviderBuilder::new().on_http(config.rpc_url.clone());
    let loupe = ProviderLoupe::new(provider, diamond);

    let inspection = orchestrator.inspect(&loupe, &token).await?;

    let balance = orchestrator
        .gateway()
        .fetch_balance(diamond, &token)
        .await
        .map(format_ether);
    let activity = orchestrator.gateway().fetch_activity(diamond, &token).await;
    let internal_activity = orchestrator
        .gateway()
        .fetch_internal_activity(diamond, &token)
        .await;

    let read = match &config.read {
        Some(method) => {
            let (facet, function) = inspection
                .report
                .resolve_method(method)
                .ok_or_else(|| anyhow!("No resolved facet ABI declares {method}"))?;
            let values = read_method(&loupe, &function, &config.args).await?;
            Some(json!({
                "facet": facet,
                "method": function.signature(),
                "output": values.iter().map(value_to_json).collect::<Vec<_>>(),
            }))
        }
        None => None,
    };

    let layout = match config.layout {
        LayoutKind::Graph => json!(graph::layout(
            &inspection.facets,
            &inspection.report,
            &mut rand::thread_rng()
        )),
        LayoutKind::Ring => json!(ring::layout(
            &inspection.facets,
            &inspection.report,
            config.ring_style()
        )),
    };

    let document = json!({
        "diamond": diamond,
        "balance": balance,
        "activity": activity,
        "internalActivity": internal_activity,
        "read": read,
        "facets": inspection.facets,
        "report": inspection.report,
        "layout": layout,
    });
    println!("{}", serde_json::to_string_pretty(&document)?);

    Ok(())
}
