use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use cli::{Client, ClientConfig, ClientError, ClientHooks, post_url, ws_url};
use jsonrpc::Request;
use rand::Rng;
use serde_json::{Value, json};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("`listen` needs the websocket transport")]
    ListenNeedsSocket,
}

#[derive(Parser, Debug)]
#[command(name = "jsonrpc-cli", about = "Drive the JSON-RPC demo server from the terminal")]
struct Cli {
    #[arg(long, env = "JSONRPC_BASE_URL", default_value = "http://127.0.0.1:8197")]
    base_url: String,

    #[arg(long, value_enum, default_value_t = TransportChoice::Auto)]
    transport: TransportChoice,

    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Print connection lifecycle events to stderr.
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TransportChoice {
    /// WebSocket, falling back to HTTP POST.
    Auto,
    Ws,
    Http,
}

#[derive(Subcommand, Debug)]
enum Command {
    GetRandomNumber,
    SetRandomNumber {
        /// Defaults to a random number in [0, 255).
        value: Option<f64>,
    },
    GetText,
    SetText {
        text: String,
    },
    Ping,
    Pong,
    /// Call any method and print its result.
    Call {
        method: String,
        #[arg(long, help = "Params as JSON")]
        params: Option<String>,
    },
    /// Send any notification.
    Notify {
        method: String,
        #[arg(long, help = "Params as JSON")]
        params: Option<String>,
    },
    /// List the server's registered methods.
    Methods,
    /// Print server notifications as they arrive.
    Listen {
        #[arg(long, help = "Stop after this many seconds")]
        seconds: Option<u64>,
    },
}

/// Prints lifecycle events when `--verbose` is set and every notification
/// while listening.
struct PrintHooks {
    verbose: bool,
    print_notifications: bool,
}

impl ClientHooks for PrintHooks {
    fn on_open(&self) {
        if self.verbose {
            eprintln!("[open]");
        }
    }

    fn on_message(&self, text: &str) {
        if self.verbose {
            eprintln!("[message] {text}");
        }
    }

    fn on_notification(&self, notification: &Request) {
        if self.print_notifications {
            println!("{}", notification.to_json());
        }
    }

    fn on_close(&self) {
        if self.verbose {
            eprintln!("[close]");
        }
    }

    fn on_error(&self, error: &ClientError) {
        if self.verbose {
            eprintln!("[error] {error}");
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Client(ClientError::Rpc(error))) => {
            eprintln!("error {}: {}", error.code, error.message);
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Command::Methods = cli.command {
        return run_methods(&cli.base_url, Duration::from_secs(cli.timeout_secs)).await;
    }

    let hooks = Arc::new(PrintHooks {
        verbose: cli.verbose,
        print_notifications: matches!(cli.command, Command::Listen { .. }),
    });
    let client = Client::connect(client_config(&cli)?, hooks).await?;

    match cli.command {
        Command::GetRandomNumber => {
            let value = client.call("get-random-number", Value::Null).await?;
            println!("{value}");
        }
        Command::SetRandomNumber { value } => {
            let value = value.unwrap_or_else(|| rand::rng().random_range(0.0..255.0));
            client.notify("set-random-number", json!(value)).await?;
            println!("{value}");
        }
        Command::GetText => {
            let value = client.call("get-text", Value::Null).await?;
            println!("{}", value.as_str().unwrap_or_default());
        }
        Command::SetText { text } => {
            client.call("set-text", Value::String(text)).await?;
            println!("ok");
        }
        Command::Ping => client.notify("ping", Value::Null).await?,
        Command::Pong => client.notify("pong", Value::Null).await?,
        Command::Call { method, params } => {
            let value = client.call(&method, parse_params(params.as_deref())?).await?;
            print_json(&value)?;
        }
        Command::Notify { method, params } => {
            client.notify(&method, parse_params(params.as_deref())?).await?;
        }
        Command::Listen { seconds } => {
            if !client.is_websocket() {
                return Err(CliError::ListenNeedsSocket);
            }
            match seconds {
                Some(seconds) => {
                    let _ = tokio::time::timeout(Duration::from_secs(seconds), client.closed()).await;
                }
                None => client.closed().await,
            }
        }
        Command::Methods => {}
    }

    // Best effort; the process is exiting either way.
    let _ = client.close().await;
    Ok(())
}

fn client_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let socket_url = match cli.transport {
        TransportChoice::Auto | TransportChoice::Ws => Some(ws_url(&cli.base_url)?),
        TransportChoice::Http => None,
    };
    let post_url = match cli.transport {
        TransportChoice::Auto | TransportChoice::Http => Some(post_url(&cli.base_url)?),
        TransportChoice::Ws => None,
    };
    Ok(ClientConfig { socket_url, post_url, request_timeout: Duration::from_secs(cli.timeout_secs) })
}

async fn run_methods(base_url: &str, timeout: Duration) -> Result<(), CliError> {
    let http = reqwest::Client::builder().timeout(timeout).build()?;
    let url = format!("{}/api/methods", base_url.trim_end_matches('/'));
    let body = http
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json::<Value>()
        .await?;
    print_json(&body)
}

fn parse_params(params: Option<&str>) -> Result<Value, CliError> {
    match params {
        Some(raw) => Ok(serde_json::from_str(raw)?),
        None => Ok(Value::Null),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
