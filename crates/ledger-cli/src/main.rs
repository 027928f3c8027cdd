use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the proof-of-work ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Queue a transaction
    Submit {
        /// Sender
        #[arg(long)]
        from: String,
        /// Recipient
        #[arg(long)]
        to: String,
        /// Amount, up to two decimal places (e.g. 50.25)
        #[arg(long)]
        amount: String,
        /// deposit, withdrawal or transfer
        #[arg(long, default_value = "transfer")]
        kind: String,
    },
    /// Mine the pending transactions into a block
    Mine,
    /// Abort the running mining job
    CancelMining,
    /// List blocks
    Chain {
        #[arg(long, default_value_t = 0)]
        from: usize,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show the latest block
    Head,
    /// Check the whole chain for tampering
    Verify,
    /// List unconfirmed transactions
    Pending,
    /// Confirmed transactions involving an account
    History { account: String },
}

#[derive(Serialize)]
struct Tx {
    sender: String,
    receiver: String,
    amount: String,
    kind: String,
}

/// Account names are free text, so they go into the path percent-encoded.
fn history_url(node: &str, account: &str) -> String {
    format!("{node}/history/{}", urlencoding::encode(account))
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let node = cli.node.trim_end_matches('/');
    let client = reqwest::Client::new();

    let request = match cli.cmd {
        Command::Submit {
            from,
            to,
            amount,
            kind,
        } => {
            let tx = Tx {
                sender: from,
                receiver: to,
                amount,
                kind,
            };
            client.post(format!("{node}/tx")).json(&tx)
        }
        Command::Mine => client.post(format!("{node}/mine")),
        Command::CancelMining => client.post(format!("{node}/mine/cancel")),
        Command::Chain { from, limit } => {
            let mut query = vec![("from", from.to_string())];
            if let Some(limit) = limit {
                query.push(("limit", limit.to_string()));
            }
            client.get(format!("{node}/chain")).query(&query)
        }
        Command::Head => client.get(format!("{node}/chain/head")),
        Command::Verify => client.get(format!("{node}/chain/valid")),
        Command::Pending => client.get(format!("{node}/pending")),
        Command::History { account } => client.get(history_url(node, &account)),
    };

    debug!(?request, "sending request");
    let res = request
        .send()
        .await
        .with_context(|| format!("contacting node at {node}"))?;
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{body}"),
    }
    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
