//! Interactive chat loop against a local OpenAI-compatible endpoint.
//!
//! ```bash
//! export API_BASE=http://localhost:4000/v1
//! export LITELLM_MASTER_KEY=sk-1234
//! cargo run --bin localchat-chat
//! ```

use std::io;

use clap::Parser;

use localchat::console::{banner, classify, describe_error, read_line, Input};
use localchat::presets::{chat_request, Sampling};
use localchat::{init_tracing, ChatClient, ClientConfig, DEFAULT_MODEL};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "localchat-chat", about = "Chat with a locally hosted model")]
struct Cli {
    /// Model identifier sent to the endpoint.
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature (0.0 to 2.0).
    #[arg(long)]
    temperature: Option<f32>,

    /// Maximum tokens to generate per reply.
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

    println!("{}", banner("Local LLM Chat Example", 50));
    println!("Using API: {}", client.config().endpoint());
    println!("Type 'exit' to quit\n");

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut stdout = io::stdout();

    loop {
        let Some(line) = read_line(&mut reader, &mut stdout, "You: ")? else {
            println!();
            break;
        };

        let message = match classify(&line) {
            Input::Exit => {
                println!("Goodbye!");
                break;
            }
            Input::Empty => continue,
            Input::Prompt(message) => message,
        };

        let result = match chat_request(&cli.model, &message, sampling) {
            Ok(request) => client.complete(&request).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => println!("\nAssistant: {}\n", response.content),
            Err(e) => println!("\nError: {}\n", describe_error(&e)),
        }
    }

    Ok(())
}
