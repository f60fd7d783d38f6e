//! Papertrade CLI - simulated market orders against a mock price feed.
//!
//! Thin presentation glue over the engine's four operations: place-order,
//! portfolio snapshot, order history, quote. Identity is faked with the
//! `--actor` flag; a real deployment would put a session layer here.
//!
//! # Usage
//! ```sh
//! MODE=sim cargo run -- --actor 1
//! ```

use anyhow::Result;
use clap::Parser;
use papertrade::application::system::Engine;
use papertrade::config::Config;
use papertrade::domain::trading::types::OrderSide;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Simulated market-order execution engine", long_about = None)]
struct Cli {
    /// Actor id to trade as (stands in for the identity collaborator)
    #[arg(short, long, default_value_t = 1)]
    actor: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let cli = Cli::parse();

    info!("Papertrade {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: Mode={:?}, ttl={}ms, initial_cash={}",
        config.mode, config.quote_ttl_ms, config.initial_cash
    );

    let engine = Engine::build(config).await?;
    info!(actor = cli.actor, "Engine ready.");

    println!("commands: buy <code> <qty> | sell <code> <qty> | portfolio | orders | quote <code>... | instruments | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [] => {}
            ["quit"] | ["exit"] => break,
            ["portfolio"] => match engine.portfolio(cli.actor).await {
                Ok(snapshot) => println!("{}", serde_json::to_string_pretty(&snapshot)?),
                Err(e) => println!("error: {e:#}"),
            },
            ["orders"] => match engine.order_history(cli.actor).await {
                Ok(orders) if orders.is_empty() => println!("no orders yet"),
                Ok(orders) => {
                    for o in orders {
                        println!(
                            "#{} {} {} x{} @ {} ({})",
                            o.id, o.side, o.code, o.quantity, o.exec_price, o.executed_at
                        );
                    }
                }
                Err(e) => println!("error: {e:#}"),
            },
            ["quote", codes @ ..] if !codes.is_empty() => {
                let codes: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
                if codes.len() == 1 {
                    match engine.quote(&codes[0]).await {
                        Ok(q) => println!("{} = {} ({:?})", q.code, q.price, q.source),
                        Err(e) => println!("error: {e:#}"),
                    }
                } else {
                    for q in engine.quotes(&codes).await {
                        println!("{} = {} ({:?})", q.code, q.price, q.source);
                    }
                }
            }
            ["instruments"] => {
                for code in engine.catalog().codes() {
                    let name = engine.catalog().get(code).map(|i| i.name.as_str()).unwrap_or("");
                    println!("{code}  {name}");
                }
            }
            [side, code, qty] => {
                let side = match side.parse::<OrderSide>() {
                    Ok(side) => side,
                    Err(e) => {
                        println!("error: {e}");
                        continue;
                    }
                };
                let qty = match qty.parse::<u64>() {
                    Ok(qty) => qty,
                    Err(_) => {
                        println!("error: quantity must be a whole number, got '{qty}'");
                        continue;
                    }
                };
                match engine.place_order(cli.actor, code, side, qty).await {
                    Ok(order) => println!(
                        "filled #{}: {} {} x{} @ {}",
                        order.id, order.side, order.code, order.quantity, order.exec_price
                    ),
                    Err(e) => println!("rejected: {e:#}"),
                }
            }
            _ => println!("unrecognized command: {line}"),
        }
    }

    info!("Shutting down.");
    Ok(())
}
