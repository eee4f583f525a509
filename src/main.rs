use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use postcast::state::{DebugLogEntry, PublishLogEntry};
use postcast::{
    Destination, EditingStatus, FsVault, NoopReporter, OptionIntent, PublishEvent,
    PublishOptions, PublishReporter, PublishRequest, PublishStage, Publisher, ReqwestClient,
    SettingsStore, SharedReporter, Vault, read_metadata,
};

// Emoji with fallback for terminals without Unicode support
static MEGAPHONE: Emoji<'_, '_> = Emoji("📣 ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static UPLOAD: Emoji<'_, '_> = Emoji("📤 ", "[^] ");
static SEND: Emoji<'_, '_> = Emoji("📨 ", "[>] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "[?] ");
static WRITING: Emoji<'_, '_> = Emoji("📝 ", "[t] ");
static LINK: Emoji<'_, '_> = Emoji("🔗 ", "");

/// Publish markdown notes, with an optional embedded audio file
#[derive(Parser, Debug)]
#[command(name = "postcast")]
#[command(about = "Publish markdown notes as posts or podcast episodes")]
#[command(version)]
struct Args {
    /// Settings file (defaults to the user config directory)
    #[arg(long, env = "POSTCAST_SETTINGS", global = true)]
    settings: Option<PathBuf>,

    /// Root folder of the notes vault
    #[arg(long, env = "POSTCAST_VAULT", default_value = ".", global = true)]
    vault: PathBuf,

    /// Quiet mode - suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Publish a document to a destination
    Publish(PublishArgs),

    /// Show where a document was published
    Status {
        /// Path of the document
        document: PathBuf,
    },

    /// Manage destinations
    #[command(subcommand)]
    Destination(DestinationCommand),

    /// Show the publish history or the debug trace
    Log {
        /// Show the debug trace instead of the publish history
        #[arg(long)]
        debug: bool,

        /// Maximum number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Turn recording of the debug trace on or off
    Debug {
        #[arg(value_enum)]
        state: Toggle,
    },
}

#[derive(clap::Args, Debug)]
struct PublishArgs {
    /// Path of the document
    document: PathBuf,

    /// Post title (defaults to the file name)
    #[arg(short, long)]
    title: Option<String>,

    /// Destination name (defaults to the selected destination)
    #[arg(short, long)]
    destination: Option<String>,

    /// Publish publicly
    #[arg(long)]
    public: bool,

    /// Do not publish internally
    #[arg(long)]
    no_internal: bool,

    /// Publish as an excerpt
    #[arg(long, conflicts_with = "hidden")]
    excerpt: bool,

    /// Hide the post from listings
    #[arg(long)]
    hidden: bool,

    /// Comma separated tags
    #[arg(long)]
    tags: Option<String>,

    /// Post template name
    #[arg(long)]
    template: Option<String>,

    /// Editing status, used by magazine destinations
    #[arg(long)]
    status: Option<EditingStatus>,

    /// Remove silence from the uploaded audio
    #[arg(long)]
    remove_silence: bool,

    /// Keep the episode out of the podcast feed
    #[arg(long)]
    no_podcast: bool,

    /// Do not release the episode right away
    #[arg(long)]
    hold: bool,

    /// Transcribe the uploaded audio
    #[arg(long)]
    transcribe: bool,

    /// Transcription model
    #[arg(long)]
    ai_model: Option<String>,

    /// Transcription provider
    #[arg(long)]
    ai_provider: Option<String>,
}

impl PublishArgs {
    /// Changes to the stored defaults requested on the command line
    fn intents(&self) -> Vec<OptionIntent> {
        let mut intents = Vec::new();
        if self.public {
            intents.push(OptionIntent::SetPublic(true));
        }
        if self.no_internal {
            intents.push(OptionIntent::SetInternal(false));
        }
        if self.excerpt {
            intents.push(OptionIntent::SetExcerpt(true));
        }
        if self.hidden {
            intents.push(OptionIntent::SetHidden(true));
        }
        if let Some(tags) = &self.tags {
            intents.push(OptionIntent::SetTags(tags.clone()));
        }
        if let Some(template) = &self.template {
            intents.push(OptionIntent::SetTemplate(template.clone()));
        }
        if let Some(status) = self.status {
            intents.push(OptionIntent::ChooseEditingStatus(status));
        }
        if self.remove_silence {
            intents.push(OptionIntent::SetRemoveSilence(true));
        }
        if self.no_podcast {
            intents.push(OptionIntent::SetIncludeInPodcast(false));
        }
        if self.hold {
            intents.push(OptionIntent::SetPublishImmediately(false));
        }
        if self.transcribe {
            intents.push(OptionIntent::SetTranscribe(true));
        }
        intents
    }
}

#[derive(Subcommand, Debug)]
enum DestinationCommand {
    /// Add a destination
    Add {
        /// Short name, at most 7 characters without whitespace
        name: String,

        /// Base URL of the service
        url: String,

        #[arg(long, env = "POSTCAST_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Let posts choose their editing status
        #[arg(long)]
        magazine: bool,
    },

    /// Remove a destination
    Remove { name: String },

    /// Make a destination the default
    Select { name: String },

    /// List destinations
    List,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Toggle {
    On,
    Off,
}

/// Publish reporter using an indicatif spinner
struct SpinnerReporter {
    bar: ProgressBar,
}

impl SpinnerReporter {
    fn new() -> Self {
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let bar = ProgressBar::new_spinner();
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    fn print(&self, line: String) {
        self.bar.suspend(|| println!("{}", line));
    }
}

impl PublishReporter for SpinnerReporter {
    fn report(&self, event: PublishEvent) {
        match event {
            PublishEvent::StageChanged { stage } => match stage {
                PublishStage::Idle => {}
                PublishStage::ResolvingAudio => {
                    self.bar.set_message(format!("{SEARCH}Looking for audio"));
                }
                PublishStage::UploadingAudio => {
                    self.bar.set_message(format!("{UPLOAD}Uploading audio"));
                }
                PublishStage::Dispatching => {
                    self.bar.set_message(format!("{SEND}Publishing"));
                }
                PublishStage::Succeeded | PublishStage::Failed => {
                    self.bar.finish_and_clear();
                }
            },

            PublishEvent::AudioDetected {
                reference,
                byte_size,
            } => {
                self.print(format!(
                    "{HEADPHONES}Audio: {} ({})",
                    reference.cyan(),
                    format_size(byte_size).dimmed()
                ));
            }

            PublishEvent::AudioUploaded { remote_filename } => {
                self.print(format!("{UPLOAD}Uploaded as {}", remote_filename.cyan()));
            }

            PublishEvent::TranscriptionStarted { audio_filename } => {
                self.print(format!(
                    "{WRITING}Transcription started for {}",
                    audio_filename.cyan()
                ));
            }

            PublishEvent::Notice { message } => {
                self.print(format!("{WARNING}{}", message.yellow()));
            }

            // Printed by the caller
            PublishEvent::Published { .. } | PublishEvent::Failed { .. } => {}
        }
    }
}

fn format_size(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let kept: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn settings_path(args: &Args) -> Result<PathBuf> {
    if let Some(path) = &args.settings {
        return Ok(path.clone());
    }
    let config_dir = dirs::config_dir().context("Could not determine the config directory")?;
    Ok(config_dir.join("postcast").join("settings.json"))
}

/// Vault-relative path of a document given on the command line
fn document_path(vault: &FsVault, document: &Path) -> Result<String> {
    let absolute = std::fs::canonicalize(document)
        .with_context(|| format!("Document not found: {}", document.display()))?;
    vault
        .relative_path(&absolute)
        .with_context(|| {
            format!(
                "{} is not inside the vault {}",
                document.display(),
                vault.root().display()
            )
        })
}

fn open_vault(root: &Path) -> Result<FsVault> {
    let root = std::fs::canonicalize(root)
        .with_context(|| format!("Vault folder not found: {}", root.display()))?;
    Ok(FsVault::new(root))
}

async fn publish(args: &Args, publish_args: &PublishArgs, store: SettingsStore) -> Result<()> {
    let vault = open_vault(&args.vault)?;
    let source_path = document_path(&vault, &publish_args.document)?;

    let settings = store.snapshot().await;
    let destination = match &publish_args.destination {
        Some(name) => Some(
            settings
                .destination_index(name)
                .with_context(|| format!("No destination named '{}'", name))?,
        ),
        None => None,
    };

    let mut options =
        PublishOptions::from_defaults(&settings.defaults).apply_all(publish_args.intents());
    if publish_args.ai_model.is_some() {
        options.ai_model = publish_args.ai_model.clone();
    }
    if publish_args.ai_provider.is_some() {
        options.ai_provider = publish_args.ai_provider.clone();
    }

    let reporter: SharedReporter = if args.quiet {
        NoopReporter::shared()
    } else {
        Arc::new(SpinnerReporter::new())
    };

    let publisher = Publisher::new(ReqwestClient::new(), Arc::new(vault), store, reporter);
    let outcome = match publisher
        .publish(PublishRequest {
            source_path,
            title: publish_args.title.clone(),
            destination,
            options,
        })
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{FAILURE}{} {}", "Publish failed:".red().bold(), e);
            std::process::exit(1);
        }
    };

    if args.quiet {
        println!("{}", outcome.url);
    } else {
        let verb = if outcome.updated { "Updated" } else { "Published" };
        println!(
            "{SUCCESS}{} {} on {} ({})",
            verb.bold().green(),
            outcome.title.bold(),
            outcome.destination.cyan(),
            outcome.editing_status.to_string().dimmed()
        );
        println!("{LINK}{}", outcome.url.cyan().underline());
    }

    // The process would otherwise exit before the request is sent
    if let Some(transcription) = outcome.transcription
        && let Err(e) = transcription.await
    {
        warn!(error = %e, "Transcription task did not finish");
    }

    Ok(())
}

async fn status(args: &Args, document: &Path, store: &SettingsStore) -> Result<()> {
    let vault = open_vault(&args.vault)?;
    let source_path = document_path(&vault, document)?;
    let text = vault
        .read_text(&source_path)
        .await
        .with_context(|| format!("Failed to read {}", source_path))?;

    let metadata = read_metadata(&text);
    let settings = store.read().await;
    let mapping = settings.post_mappings.get(&source_path);

    println!("{}", source_path.bold());
    match (metadata.get(postcast::state::DESTINATION_KEY), mapping) {
        (None, None) => println!("  {}", "Not published yet".dimmed()),
        (destination, mapping) => {
            if let Some(destination) = destination {
                println!("  Destination: {}", destination.cyan());
            }
            if let Some(url) = metadata.get(postcast::state::URL_KEY) {
                println!("  URL:         {}", url.cyan());
            }
            if let Some(status) = metadata.get(postcast::state::EDITING_STATUS_KEY) {
                println!("  Status:      {}", status);
            }
            if let Some(mapping) = mapping {
                println!("  Remote id:   {}", mapping.remote_identifier);
                println!(
                    "  Last publish: {}",
                    mapping.last_published_at.format("%Y-%m-%d %H:%M UTC")
                );
            }
        }
    }
    Ok(())
}

async fn destination(command: &DestinationCommand, store: &SettingsStore) -> Result<()> {
    match command {
        DestinationCommand::Add {
            name,
            url,
            api_key,
            magazine,
        } => {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                bail!("Destination URL must start with http:// or https://");
            }
            let destination = Destination {
                name: name.clone(),
                base_url: url.trim_end_matches('/').to_string(),
                api_key: api_key.clone(),
                magazine_mode: *magazine,
            };
            store
                .update(|s| s.add_destination(destination))
                .await
                .context("Failed to save settings")??;
            println!("{SUCCESS}Added destination {}", name.bold());
        }

        DestinationCommand::Remove { name } => {
            store
                .update(|s| s.remove_destination(name))
                .await
                .context("Failed to save settings")??;
            println!("{SUCCESS}Removed destination {}", name.bold());
        }

        DestinationCommand::Select { name } => {
            store
                .update(|s| s.select_destination(name))
                .await
                .context("Failed to save settings")??;
            println!("{SUCCESS}Selected destination {}", name.bold());
        }

        DestinationCommand::List => {
            let settings = store.read().await;
            if settings.destinations.is_empty() {
                println!("{}", "No destinations configured".dimmed());
            }
            for (index, destination) in settings.destinations.iter().enumerate() {
                let marker = if index == settings.selected_destination {
                    "*".green().bold()
                } else {
                    " ".normal()
                };
                let mode = if destination.magazine_mode {
                    " (magazine)".dimmed()
                } else {
                    "".normal()
                };
                println!(
                    "{} {:<7} {}{}",
                    marker,
                    destination.name.bold(),
                    destination.base_url.cyan(),
                    mode
                );
            }
        }
    }
    Ok(())
}

fn print_publish_entry(entry: &PublishLogEntry) {
    let when = entry.timestamp.format("%Y-%m-%d %H:%M");
    if entry.success {
        println!(
            "{} {}{} {}",
            when.to_string().dimmed(),
            SUCCESS,
            truncate_title(&entry.title, 40),
            entry.url.cyan()
        );
    } else {
        let code = entry
            .error_code
            .map(|code| format!("[{}] ", code))
            .unwrap_or_default();
        println!(
            "{} {}{} {}{}",
            when.to_string().dimmed(),
            FAILURE,
            truncate_title(&entry.title, 40),
            code.red(),
            entry.error_message.as_deref().unwrap_or_default().red()
        );
    }
}

fn print_debug_entry(entry: &DebugLogEntry) -> Result<()> {
    let kind = serde_json::to_value(entry.kind)?;
    let mut line = format!(
        "{} {:<8}",
        entry.timestamp.format("%H:%M:%S").to_string().dimmed(),
        kind.as_str().unwrap_or_default().bold()
    );
    if let (Some(method), Some(endpoint)) = (&entry.method, &entry.endpoint) {
        line.push_str(&format!(" {} {}", method, endpoint.cyan()));
    }
    if let Some(status) = entry.status {
        line.push_str(&format!(" -> {}", status));
    }
    if let Some(message) = &entry.message {
        line.push_str(&format!(" {}", message));
    }
    println!("{}", line);

    if let Some(payload) = &entry.payload {
        println!("{}", serde_json::to_string_pretty(payload)?.dimmed());
    }
    if let Some(body) = &entry.body {
        println!("{}", body.dimmed());
    }
    Ok(())
}

async fn log(debug: bool, limit: usize, store: &SettingsStore) -> Result<()> {
    let settings = store.read().await;
    if debug {
        if !settings.debug_mode {
            println!(
                "{WARNING}{}",
                "Debug mode is off; enable it with `postcast debug on`".yellow()
            );
        }
        for entry in settings.debug_log.iter().take(limit) {
            print_debug_entry(entry)?;
        }
    } else {
        if settings.publish_log.is_empty() {
            println!("{}", "Nothing published yet".dimmed());
        }
        for entry in settings.publish_log.iter().take(limit) {
            print_publish_entry(entry);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let args = Args::parse();

    let path = settings_path(&args)?;
    let store = SettingsStore::load(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;

    match &args.command {
        Command::Publish(publish_args) => {
            if !args.quiet {
                println!(
                    "\n{}{} {}\n",
                    MEGAPHONE,
                    "postcast".bold().magenta(),
                    "- Publisher".dimmed()
                );
            }
            publish(&args, publish_args, store).await?;
        }
        Command::Status { document } => status(&args, document, &store).await?,
        Command::Destination(command) => destination(command, &store).await?,
        Command::Log { debug, limit } => log(*debug, *limit, &store).await?,
        Command::Debug { state } => {
            let enabled = matches!(state, Toggle::On);
            store
                .update(|s| s.debug_mode = enabled)
                .await
                .context("Failed to save settings")?;
            println!(
                "Debug mode {}",
                if enabled {
                    "on".green().bold()
                } else {
                    "off".yellow().bold()
                }
            );
        }
    }

    Ok(())
}
