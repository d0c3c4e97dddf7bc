//! Nigori command-line client.
//!
//! # Usage
//!
//! ```bash
//! nigori register alice secret
//! nigori add alice secret greeting "hello world"
//! nigori get alice secret greeting
//!
//! # Split a secret 2-of-3 across three stores
//! nigori create-split alice secret 2 a.example 8080 b.example 8080 c.example 8080
//! nigori split-add alice secret vault "launch codes"
//! nigori split-get alice secret vault
//! ```

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use nigori_client::{
    AuthToken, ClientConfig, ClientError, Endpoint, HttpTransport, ResourceClient, Scheme,
    SplitCoordinator, TYPE_NAMED_VALUE,
};
use nigori_crypto::BlockCipher;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Nigori protocol client
#[derive(Parser, Debug)]
#[command(name = "nigori")]
#[command(about = "Store encrypted values on Nigori servers")]
#[command(version)]
struct Args {
    /// Store host
    #[arg(long, env = "NIGORI_HOST", default_value = "localhost")]
    host: String,

    /// Store port
    #[arg(long, env = "NIGORI_PORT", default_value = "8080")]
    port: u16,

    /// Connect over HTTPS
    #[arg(long, env = "NIGORI_HTTPS")]
    https: bool,

    /// Value cipher (aes256, des)
    #[arg(long, env = "NIGORI_CIPHER", default_value = "aes256")]
    cipher: BlockCipher,

    /// Request timeout in seconds
    #[arg(long, env = "NIGORI_TIMEOUT_SECS", default_value = "30")]
    timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register USER's public key with the store
    Register { user: String, password: String },
    /// Authenticate, then replay the same token to check it is refused
    Authenticate { user: String, password: String },
    /// Append VALUE under NAME
    Add {
        user: String,
        password: String,
        name: String,
        value: String,
    },
    /// Print every record stored under NAME
    Get {
        user: String,
        password: String,
        name: String,
    },
    /// Store the split topology: threshold K and HOST PORT pairs
    CreateSplit {
        user: String,
        password: String,
        k: u32,
        #[arg(required = true, num_args = 2..)]
        servers: Vec<String>,
    },
    /// Split VALUE across the topology's servers
    SplitAdd {
        user: String,
        password: String,
        name: String,
        value: String,
    },
    /// Recover a split value
    SplitGet {
        user: String,
        password: String,
        name: String,
    },
}

impl Args {
    fn client_config(&self) -> ClientConfig {
        let scheme = if self.https {
            Scheme::Https
        } else {
            Scheme::Http
        };
        ClientConfig::new(Endpoint::new(self.host.clone(), self.port))
            .with_cipher(self.cipher)
            .with_scheme(scheme)
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

fn parse_servers(pairs: &[String]) -> Result<Vec<Endpoint>, ClientError> {
    if pairs.len() % 2 != 0 {
        return Err(ClientError::Config(
            "split servers must be given as HOST PORT pairs".into(),
        ));
    }
    pairs
        .chunks_exact(2)
        .map(|pair| {
            let port = pair[1]
                .parse()
                .map_err(|_| ClientError::Config(format!("invalid port {:?}", pair[1])))?;
            Ok(Endpoint::new(pair[0].clone(), port))
        })
        .collect()
}

fn run(args: Args) -> Result<(), ClientError> {
    let config = args.client_config();
    let transport = HttpTransport::new(&config)?;
    let client = ResourceClient::new(config, transport);

    match args.command {
        Command::Register { user, password } => {
            println!("{}", client.register(&user, &password)?);
        }
        Command::Authenticate { user, password } => {
            let keys = client.derive_keys(&password);
            let token = AuthToken::build(&user, &keys, client.signer())?;
            println!("{}", client.authenticate_with(&token)?);
            match client.authenticate_with(&token) {
                Err(ClientError::Protocol { status, reason }) => {
                    println!("replayed token rejected: {status} {reason}");
                }
                Err(e) => return Err(e),
                Ok(_) => {
                    return Err(ClientError::Config(
                        "server accepted a replayed token".into(),
                    ))
                }
            }
        }
        Command::Add {
            user,
            password,
            name,
            value,
        } => {
            client.add(
                &user,
                &password,
                TYPE_NAMED_VALUE,
                name.as_bytes(),
                value.as_bytes(),
            )?;
        }
        Command::Get {
            user,
            password,
            name,
        } => {
            for record in client.list(&user, &password, TYPE_NAMED_VALUE, name.as_bytes())? {
                println!(
                    "{} at {}: {}",
                    record.version,
                    record.creation_time,
                    String::from_utf8_lossy(&record.value)
                );
            }
        }
        Command::CreateSplit {
            user,
            password,
            k,
            servers,
        } => {
            let servers = parse_servers(&servers)?;
            SplitCoordinator::new(client).init_split(&user, &password, k, servers)?;
        }
        Command::SplitAdd {
            user,
            password,
            name,
            value,
        } => {
            SplitCoordinator::new(client).split_add(
                &user,
                &password,
                name.as_bytes(),
                value.as_bytes(),
            )?;
        }
        Command::SplitGet {
            user,
            password,
            name,
        } => {
            let value = SplitCoordinator::new(client).split_get(&user, &password, name.as_bytes())?;
            println!("{}", String::from_utf8_lossy(&value));
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
