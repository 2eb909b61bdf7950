//! Code generation helper: runs a batch of prompts at low temperature.
//!
//! ```bash
//! cargo run --bin localchat-codegen -- --language rust "Write a function that parses a semver string"
//! ```

use clap::Parser;

use localchat::console::{banner, describe_error, separator};
use localchat::presets::{codegen_request, Sampling, CODEGEN_EXAMPLES};
use localchat::{init_tracing, ChatClient, ClientConfig, DEFAULT_MODEL};

const WIDTH: usize = 70;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "localchat-codegen", about = "Generate code with a locally hosted model")]
struct Cli {
    /// Prompts to run. Defaults to a few built-in examples.
    prompts: Vec<String>,

    /// Model identifier sent to the endpoint.
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Target programming language, used in the system prompt.
    #[arg(short, long, default_value = "python")]
    language: String,

    /// Sampling temperature (0.0 to 2.0).
    #[arg(long)]
    temperature: Option<f32>,

    /// Maximum tokens to generate per prompt.
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
    let sampling = Sampling {
        temperature: cli.temperature,
        max_output_tokens: cli.max_tokens,
    };

    let prompts: Vec<String> = if cli.prompts.is_empty() {
        CODEGEN_EXAMPLES.iter().map(|p| p.to_string()).collect()
    } else {
        cli.prompts.clone()
    };

    println!("{}", banner("Code Generation Examples", WIDTH));

    for (i, prompt) in prompts.iter().enumerate() {
        println!("\n{}. Prompt: {prompt}", i + 1);
        println!("{}", separator(WIDTH));

        let result = match codegen_request(&cli.model, &cli.language, prompt, sampling) {
            Ok(request) => client.complete(&request).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => println!("{}", response.content),
            Err(e) => println!("Error: {}", describe_error(&e)),
        }

        println!("{}", separator(WIDTH));
    }

    Ok(())
}
