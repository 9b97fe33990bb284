use std::{process::ExitCode, sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use indicatif::{ProgressDrawTarget, ProgressStyle};
use log::*;
use pay_session::{config::ClientConfig, session::OrderSession, MinorUnits, UserId};

mod console;
mod formatting;

use crate::{
    console::ConsoleNotifier,
    formatting::{format_balance, format_orders},
};

#[derive(Parser, Debug)]
#[command(version, about = "Drive a payment demo session from the command line")]
pub struct Arguments {
    /// The user to act as
    #[arg(short, long, env = "PAY_USER_ID")]
    user: UserId,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[clap(name = "account", about = "Create an account for the user")]
    CreateAccount,
    #[clap(name = "topup", about = "Add funds to the user's account")]
    TopUp {
        /// The amount to add, in minor units
        amount: MinorUnits,
    },
    #[clap(name = "balance", about = "Show the user's balance")]
    Balance,
    #[clap(name = "order", about = "Create an order and follow its status until it completes")]
    CreateOrder {
        /// The order amount, in minor units
        amount: MinorUnits,
        description: String,
        /// Return as soon as the order has been created
        #[arg(long)]
        no_watch: bool,
    },
    #[clap(name = "orders", about = "List the user's orders")]
    Orders,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    let config = ClientConfig::from_env_or_default();
    info!("🚀️ Using the payment service at {}", config.api_url);
    match run(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("🚀️ Command failed. {e}");
            ExitCode::FAILURE
        },
    }
}

/// Failures have already been reported to the console by the notifier.
async fn run(cli: Arguments, config: &ClientConfig) -> Result<()> {
    let notifier = Arc::new(ConsoleNotifier::new());
    let mut session = OrderSession::from_config(cli.user, config, notifier.clone()).map_err(|e| {
        eprintln!("❌️ {e}");
        e
    })?;
    match cli.command {
        Command::CreateAccount => {
            session.create_account().await?;
            println!("Balance: {}", session.balance());
        },
        Command::TopUp { amount } => {
            session.top_up(amount).await?;
            println!("Balance: {}", session.balance());
        },
        Command::Balance => {
            let result = session.refresh_balance().await?;
            println!("{}", format_balance(&result));
        },
        Command::Orders => {
            let orders = session.list_orders().await?;
            println!("{}", format_orders(&orders));
        },
        Command::CreateOrder { amount, description, no_watch } => {
            let order = session.create_order(amount, &description).await?;
            println!("Order {} is {}", order.id, order.status);
            if !no_watch {
                watch(&mut session, &notifier).await?;
            }
        },
    }
    session.shutdown().await;
    Ok(())
}

async fn watch(session: &mut OrderSession, notifier: &ConsoleNotifier) -> Result<()> {
    let order_id = session.current_order().map(|o| o.to_string()).unwrap_or_default();
    let pb = notifier.progress();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::with_template("{spinner:5} {msg} [{elapsed}]")?
            .tick_strings(&["🕛 ", "🕐 ", "🕑 ", "🕒 ", "🕓 ", "🕔 ", "🕕 ", "🕖 ", "🕗 ", "🕘 ", "🕙 ", "🕚 "]),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Waiting for order {order_id} to complete (Ctrl-C to stop watching)..."));
    let finished = tokio::select! {
        _ = session.watch_until_terminal() => true,
        _ = tokio::signal::ctrl_c() => false,
    };
    pb.finish_and_clear();
    let status = session.current_status().map(|s| s.to_string()).unwrap_or_else(|| "unknown".into());
    if !finished {
        session.close_channel();
        println!("Stopped watching order {order_id}. Last status: {status}");
        return Ok(());
    }
    if session.is_terminal() {
        println!("Order {order_id} completed with status {status}");
        Ok(())
    } else {
        let ended = format!("The status stream for order {order_id} ended while the order was {status}");
        eprintln!("{ended}");
        Err(anyhow!(ended))
    }
}
