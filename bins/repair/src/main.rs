//! Balance repair tool.
//!
//! Rebuilds the period balances and cached account balances of a tenant,
//! or of one of its accounts, by replaying the active journal. Prints what
//! was rewritten as JSON on stdout; logs go to stderr.

use anyhow::Context;
use clap::Parser;
use partida_db::{BalanceRepository, connect_with};
use partida_shared::AppConfig;
use partida_shared::types::{AccountId, TenantId};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "repair")]
#[command(about = "Recompute partida period balances from the journal")]
#[command(version)]
struct Cli {
    /// Tenant whose balances are rebuilt
    tenant_id: TenantId,

    /// Rebuild only this account
    account_id: Option<AccountId>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "partida=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let db = connect_with(&config.database).await?;

    info!(tenant_id = %cli.tenant_id, account_id = ?cli.account_id, "starting balance recompute");
    let balances = BalanceRepository::with_config(db, config.ledger);
    let summary = balances.recompute(cli.tenant_id, cli.account_id).await?;

    let report = json!({
        "tenant_id": cli.tenant_id,
        "account_id": cli.account_id,
        "summary": summary,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
