pub mod console;
pub mod inference;
pub mod presets;

pub use inference::{
    ChatClient, ChatError, ChatRequest, ChatResponse, ChatStream, ClientConfig, Message, Role,
    StreamFragment, StreamState,
};

/// Model used by the console programs unless `--model` is given.
pub const DEFAULT_MODEL: &str = "deepseek-coder";

/// Set to `1` or `true` to emit logs as JSON lines.
const LOG_JSON_ENV: &str = "LOCALCHAT_LOG_JSON";

/// Initialize the tracing subscriber for the console programs.
///
/// Logs go to stderr so model output on stdout stays clean. The filter comes
/// from `RUST_LOG`, falling back to `localchat=info,warn` (or
/// `localchat=debug,info` when `verbose` is set).
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose {
        "localchat=debug,info"
    } else {
        "localchat=info,warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let json = std::env::var(LOG_JSON_ENV)
        .map(|v| matches!(v.trim(), "1" | "true"))
        .unwrap_or(false);

    let builder = fmt::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false);

    // A subscriber may already be installed.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        "localchat starting"
    );
}
