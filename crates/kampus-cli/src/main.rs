use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use kampus_chat::Composer;
use kampus_core::{CourseCatalogue, RawMessage, RequesterId};
use kampus_store::{Dataset, DomainQuery, MemoryStore};
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod display;

use cli::{Cli, Command};
use config::KampusConfig;

const SAMPLE_DATA: &str = "data/sample_campus.json";

fn main() {
    if let Err(error) = run() {
        eprintln!("kampus error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config =
        KampusConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    init_tracing(&config, cli.verbose)?;
    tracing::info!("kampus v{}", env!("CARGO_PKG_VERSION"));

    let offset = config.utc_offset()?;

    #[cfg(feature = "duckdb")]
    if let Some(db) = &cli.db {
        let store = kampus_store::DuckStore::open_persistent(db)
            .with_context(|| format!("failed to open {}", db.display()))?;
        if let Some(path) = &cli.data {
            let data = Dataset::load(path)?;
            store.import(&data).context("failed to import dataset")?;
        } else if !store.has_tables() {
            bail!("{} has no campus tables; seed it with --data", db.display());
        }
        let composer = Composer::new(store, config.chat.clone())?.with_utc_offset(offset);
        return serve(&composer, &cli);
    }

    let path = data_path(&cli, &config)?;
    let data =
        Dataset::load(&path).with_context(|| format!("failed to load {}", path.display()))?;
    let composer =
        Composer::new(MemoryStore::new(data), config.chat.clone())?.with_utc_offset(offset);
    serve(&composer, &cli)
}

fn data_path(cli: &Cli, config: &KampusConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.data.clone().or_else(|| config.data_path.clone()) {
        return Ok(path);
    }
    let sample = PathBuf::from(SAMPLE_DATA);
    if sample.exists() {
        return Ok(sample);
    }
    bail!("no dataset: pass --data or set data_path in kampus.toml")
}

fn serve<Q: DomainQuery>(composer: &Composer<Q>, cli: &Cli) -> anyhow::Result<()> {
    let requester = RequesterId(cli.user);
    match &cli.command {
        Command::Ask { text, json } => {
            let reply = composer.respond(&message(&text.join(" "), requester, cli))?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&reply)?);
            } else {
                display::print_reply(&reply);
            }
        }
        Command::Chat => chat_loop(composer, requester, cli)?,
        Command::Classify { text } => {
            println!("{}", composer.router().classify(&text.join(" ")));
        }
        Command::Extract { text } => {
            let names = composer.query().course_names(requester)?;
            let catalogue = CourseCatalogue::from_names(names);
            let entities = composer
                .extractor()
                .extract(&text.join(" "), &catalogue, composer.now());
            display::print_entities(&entities);
        }
    }
    Ok(())
}

fn chat_loop<Q: DomainQuery>(
    composer: &Composer<Q>,
    requester: RequesterId,
    cli: &Cli,
) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if matches!(text, "exit" | "quit") {
            break;
        }
        match composer.respond(&message(text, requester, cli)) {
            Ok(reply) => display::print_reply(&reply),
            // A failed lookup ends the reply, not the session.
            Err(error) => eprintln!("kampus error: {error}"),
        }
    }
    Ok(())
}

fn message(text: &str, requester: RequesterId, cli: &Cli) -> RawMessage {
    let message = RawMessage::new(text, requester);
    match &cli.name {
        Some(name) => message.with_display_name(name.clone()),
        None => message,
    }
}

fn init_tracing(config: &KampusConfig, verbose: bool) -> anyhow::Result<()> {
    let fallback = if verbose { "debug" } else { config.log_filter.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .with_context(|| format!("invalid log filter '{fallback}'"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;
    Ok(())
}
