//! Slack Bud CLI - run the command-input protocol offline.
//!
//! # Usage
//!
//! ```bash
//! # Split a command line the way the bot does
//! sb-cli tokenize 'props set maxRetries "3 retries" -s content'
//!
//! # Classify a raw form body and show the parsed input
//! sb-cli classify 'text=props+list&user_name=jane'
//!
//! # Correlate a callback id
//! sb-cli callback callback_set_CmdProps_confirm_ab12
//!
//! # Produce a wire record, then read it back
//! sb-cli encode 'canary -e prod' --env prod > record.json
//! sb-cli decode record.json
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sb-cli")]
#[command(author, version, about = "Slack Bud protocol tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split command text into tokens
    Tokenize {
        /// Command text as typed after the slash command
        text: String,
    },
    /// Classify a form-encoded request body and parse it
    Classify {
        /// Raw `application/x-www-form-urlencoded` body
        body: String,

        /// Environment to parse against
        #[arg(short, long, default_value = "dev")]
        env: String,
    },
    /// Correlate a callback id back to its command
    Callback {
        /// Callback id of a prompt attachment
        callback_id: String,
    },
    /// Encode command text as a wire record
    Encode {
        /// Command text as typed after the slash command
        text: String,

        /// Environment to encode
        #[arg(short, long, default_value = "dev")]
        env: String,

        /// Invoking user name
        #[arg(short, long)]
        user: Option<String>,

        /// Response URL to carry
        #[arg(short, long)]
        response_url: Option<String>,
    },
    /// Decode a wire record and summarize it
    Decode {
        /// File holding the record, or `-` for stdin
        #[arg(default_value = "-")]
        path: PathBuf,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = run(cli).and_then(|output| {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{output}").map_err(commands::CliError::from)
    });

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<String, commands::CliError> {
    match cli.command {
        Commands::Tokenize { text } => commands::parse::tokenize(&text),
        Commands::Classify { body, env } => commands::parse::classify(&body, &env),
        Commands::Callback { callback_id } => commands::parse::callback(&callback_id),
        Commands::Encode {
            text,
            env,
            user,
            response_url,
        } => commands::wire::encode(&text, &env, user.as_deref(), response_url.as_deref()),
        Commands::Decode { path } => {
            let json = commands::read_input(&path)?;
            commands::wire::decode(&json)
        }
    }
}
