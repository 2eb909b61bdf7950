//! Streams one response and prints it fragment by fragment.
//!
//! ```bash
//! cargo run --bin localchat-stream -- "Explain how async/await works in Rust"
//! ```

use std::io::{self, Write};

use anyhow::Context;
use clap::Parser;
use futures::StreamExt;

use localchat::console::{banner, describe_error, separator};
use localchat::presets::{stream_request, Sampling, STREAM_EXAMPLE};
use localchat::{init_tracing, ChatClient, ClientConfig, DEFAULT_MODEL};

const WIDTH: usize = 70;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "localchat-stream", about = "Stream a reply from a locally hosted model")]
struct Cli {
    /// Prompt to send.
    prompt: Option<String>,

    /// Model identifier sent to the endpoint.
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature (0.0 to 2.0).
    #[arg(long)]
    temperature: Option<f32>,

    /// Maximum tokens to generate.
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let client = ChatClient::new(ClientConfig::from_env()?)?;
    let prompt = cli.prompt.as_deref().unwrap_or(STREAM_EXAMPLE);
    let request = stream_request(
        &cli.model,
        prompt,
        Sampling {
            temperature: cli.temperature,
            max_output_tokens: cli.max_tokens,
        },
    )?;

    println!("{}", banner("Streaming Response Example", WIDTH));
    println!("Prompt: {prompt}");
    println!("{}\n", separator(WIDTH));

    let mut stream = match client.stream(&request).await {
        Ok(stream) => stream,
        Err(e) => {
            println!("\nError: {}", describe_error(&e));
            return Err(e).context("failed to open stream");
        }
    };

    let mut stdout = io::stdout();
    while let Some(fragment) = stream.next().await {
        match fragment {
            Ok(fragment) => {
                write!(stdout, "{}", fragment.text)?;
                stdout.flush()?;
            }
            Err(e) => {
                println!("\nError: {}", describe_error(&e));
                return Err(e).context("stream interrupted");
            }
        }
    }
    println!("\n");

    Ok(())
}
