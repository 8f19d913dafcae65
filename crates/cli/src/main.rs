use clap::{Parser, Subcommand};
use ochat::config::ConfigUpdate;
use ochat::host::Host;
use ochat::llm::InferenceClient;
use ochat::session::{ChatSession, MessageId};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

#[derive(Parser)]
#[command(name = "ochat")]
#[command(about = "Chat with a local inference server", long_about = None)]
struct Cli {
    /// Config file path (default: OCHAT_CONFIG_PATH or ~/.ochat/config.json)
    #[arg(long, short, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Chat interactively (the default). Commands: /models, /model NAME, /url URL, /history, /exit.
    Chat,

    /// List the backend's models and keep the selected model among them.
    Models,

    /// Show or change the configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the configuration as JSON.
    Show,

    /// Change one or more settings. The URL is trimmed and loses trailing slashes.
    Set {
        /// Backend base URL (e.g. http://localhost:11434)
        #[arg(long, value_name = "URL")]
        url: Option<String>,

        /// Model name sent with each prompt
        #[arg(long, value_name = "NAME")]
        model: Option<String>,

        /// max_tokens sent with each prompt
        #[arg(long, value_name = "N")]
        max_tokens: Option<u32>,

        /// Seconds before a pending reply is marked failed
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
}

/// Terminal host: notices go to stderr, message slots are printed as they change.
struct TerminalHost;

impl Host for TerminalHost {
    fn notify(&self, message: &str) {
        eprintln!("! {}", message);
    }

    fn render(&self, slot: MessageId, markdown: &str) {
        println!("{} {}", slot, markdown);
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("ochat {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Models) => {
            if let Err(e) = run_models(cli.config).await {
                log::error!("models failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Config { action }) => {
            if let Err(e) = run_config(cli.config, action) {
                log::error!("config failed: {}", e);
                eprintln!("error: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat) | None => {
            if let Err(e) = run_chat(cli.config).await {
                log::error!("chat failed: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn open_session(config_path: Option<PathBuf>) -> anyhow::Result<ChatSession> {
    let (store, path) = ochat::config::load_config(config_path)?;
    log::debug!("using config {}", path.display());
    let backend = InferenceClient::new().with_timeout(store.get().request_timeout());
    Ok(ChatSession::new(
        Arc::new(store),
        Arc::new(backend),
        Arc::new(TerminalHost),
    ))
}

fn print_models(session: &ChatSession) {
    let selected = session.config().get().selected_model;
    match session.config().models() {
        Some(models) if !models.is_empty() => {
            for name in models.iter() {
                let mark = if name == selected { "*" } else { " " };
                println!("{} {}", mark, name);
            }
        }
        _ => println!("no models available"),
    }
}

async fn run_models(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let session = open_session(config_path)?;
    let listing = session.refresh_models().await;
    if let Some(e) = listing.error {
        anyhow::bail!(e);
    }
    print_models(&session);
    Ok(())
}

fn run_config(config_path: Option<PathBuf>, action: ConfigAction) -> anyhow::Result<()> {
    let (store, path) = ochat::config::load_config(config_path)?;
    match action {
        ConfigAction::Show => {}
        ConfigAction::Set {
            url,
            model,
            max_tokens,
            timeout,
        } => {
            let update = ConfigUpdate {
                backend_url: url,
                selected_model: model,
                max_tokens,
                request_timeout_secs: timeout,
            };
            if update.is_empty() {
                anyhow::bail!("nothing to set; pass --url, --model, --max-tokens or --timeout");
            }
            store.set(update)?;
            log::info!("saved config to {}", path.display());
        }
    }
    println!("{}", serde_json::to_string_pretty(&store.get())?);
    Ok(())
}

enum Flow {
    Continue,
    Exit,
}

async fn run_slash_command(session: &ChatSession, command: &str) -> Flow {
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    match name.to_ascii_lowercase().as_str() {
        "exit" | "quit" => return Flow::Exit,
        "models" => {
            session.refresh_models().await;
            print_models(session);
        }
        "model" if !arg.is_empty() => {
            if let Err(e) = session.select_model(arg) {
                eprintln!("! {}", e);
            }
        }
        "url" if !arg.is_empty() => {
            if let Err(e) = session.set_backend_url(arg) {
                eprintln!("! {}", e);
            }
        }
        "history" => session.render_history(),
        _ => eprintln!("! commands: /models, /model NAME, /url URL, /history, /exit"),
    }
    Flow::Continue
}

async fn run_chat(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let session = Arc::new(open_session(config_path)?);
    if session.refresh_models().await.is_ok() {
        print_models(&session);
    }

    log::debug!("session {} ready", session.id());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    // Every submit runs in its own task; the session rejects overlapping ones as busy.
    let mut exchanges: Vec<JoinHandle<()>> = Vec::new();

    while let Some(line) = lines.next_line().await? {
        exchanges.retain(|h| !h.is_finished());
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if let Some(command) = input.strip_prefix('/') {
            match run_slash_command(&session, command).await {
                Flow::Exit => break,
                Flow::Continue => continue,
            }
        }
        let s = session.clone();
        let text = input.to_string();
        exchanges.push(tokio::spawn(async move {
            if let Err(e) = s.submit(&text).await {
                log::debug!("submit rejected: {}", e);
            }
        }));
    }

    for handle in exchanges {
        handle.await?;
    }
    Ok(())
}
