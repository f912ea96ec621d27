// UI layer: runs one command per invocation, prompting with `dialoguer`
// and showing a spinner while the network call is in flight. The work
// itself lives in `pipeline`, `config` and `credentials`.

use crate::api::{ApiClient, FetchResult, PriceListSource};
use crate::cli::{
    AuthCommands, Cli, Commands, ConfigCommands, ContactArgs, CookieArgs, FetchArgs,
    PricelistCommands,
};
use crate::config::{resolve_path, AppConfig, DEFAULT_CONFIG_FILE};
use crate::credentials::CredentialBlob;
use crate::pipeline::{
    Confirmation, CredentialSource, Pipeline, PipelineOptions, PipelineOutcome,
};
use crate::preview::NO_DATA;
use crate::spreadsheet::indonesian_date;
use anyhow::{Context, Result};
use clap::CommandFactory;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use crossterm::style::Stylize;
use dialoguer::{Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Dispatch a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Pricelist {
            action: PricelistCommands::Fetch(args),
        }
        | Commands::Fetch(args) => fetch_pricelist(&args),
        Commands::Auth {
            action: AuthCommands::Cookie(args),
        }
        | Commands::Cookie(args) => manage_cookie(&args),
        Commands::Config {
            action: ConfigCommands::Contact(args),
        } => manage_contact(&args),
        Commands::Info { config_file } => show_info(config_file.as_deref()),
    }
}

pub fn info(msg: &str) {
    println!("{}", msg.cyan().bold());
}

pub fn success(msg: &str) {
    println!("{}", msg.green().bold());
}

pub fn warn(msg: &str) {
    println!("{}", msg.yellow().bold());
}

pub fn error(msg: &str) {
    eprintln!("{}", msg.red().bold());
}

fn config_path(config_file: Option<&Path>) -> PathBuf {
    resolve_path(config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE)))
}

/// Wraps the API client with a spinner for the duration of the request.
struct SpinnerSource<'a>(&'a ApiClient);

impl PriceListSource for SpinnerSource<'_> {
    fn fetch_price_list(&self, credential: &CredentialBlob) -> crate::Result<FetchResult> {
        // `ProgressSpinner` ticks on its own thread while the request blocks.
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("Making GET request to {}...", self.0.describe()));
        spinner.enable_steady_tick(Duration::from_millis(100));

        let result = self.0.fetch_price_list(credential);
        spinner.finish_and_clear();
        result
    }

    fn describe(&self) -> String {
        self.0.describe()
    }
}

/// Prints the preview and asks with `dialoguer::Confirm` (default yes).
pub struct TerminalConfirmation;

impl Confirmation for TerminalConfirmation {
    fn confirm(&mut self, preview: &str) -> Result<bool> {
        println!("{}", preview);
        let answer = Confirm::new()
            .with_prompt("Generate Excel file?")
            .default(true)
            .interact()?;
        Ok(answer)
    }
}

/// `pricelist fetch`: fetch, preview, confirm and write the workbook.
fn fetch_pricelist(args: &FetchArgs) -> Result<()> {
    let config_file = config_path(args.config_file.as_deref());
    let config = AppConfig::load(&config_file)?;

    let credentials = match &args.cookie {
        Some(json) => CredentialSource::Inline(CredentialBlob::parse(json).context("Invalid --cookie value")?),
        None => {
            let file = args
                .cookie_file
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.api.cookie_file));
            CredentialSource::File(resolve_path(file))
        }
    };
    let options = PipelineOptions {
        preview: args.preview_enabled(),
        preview_limit: args.preview_limit,
        output: args.output.as_ref().map(resolve_path),
    };

    let client = ApiClient::from_config(&config)?;
    let mut pipeline = Pipeline::new(&config, credentials, options);
    let outcome = pipeline.run(&SpinnerSource(&client), &mut TerminalConfirmation);

    for w in pipeline.warnings() {
        tracing::debug!(%w, "skipped");
    }

    match outcome? {
        PipelineOutcome::Written { path, rows, skipped } => {
            success(&format!("Processed {} drugs with stock ({} skipped)", rows, skipped));
            success(&format!("Excel file generated: {}", path.display()));
        }
        PipelineOutcome::Declined => warn("Operation cancelled"),
        PipelineOutcome::NoData { fetched, skipped } => {
            println!("{}", NO_DATA);
            warn(&format!(
                "No data to export: {} drugs fetched, {} skipped",
                fetched, skipped
            ));
        }
    }
    Ok(())
}

/// `auth cookie`: set, get or delete the cookie file.
fn manage_cookie(args: &CookieArgs) -> Result<()> {
    let file = resolve_path(&args.file);

    if args.delete {
        if CredentialBlob::delete(&file)? {
            success(&format!("Cookie file deleted: {}", file.display()));
        } else {
            warn(&format!("Cookie file not found: {}", file.display()));
        }
        return Ok(());
    }

    if args.get {
        if !file.exists() {
            warn(&format!("Cookie file not found: {}", file.display()));
            return Ok(());
        }
        let blob = CredentialBlob::load(&file)?;
        println!("{}", blob.to_pretty_json().cyan().bold());
        return Ok(());
    }

    if args.set {
        info(r#"Enter cookies in JSON format (e.g., {"key": "value"}):"#);
        let text: String = Input::new().with_prompt("Cookies").interact_text()?;
        let blob = CredentialBlob::parse(&text).context("Invalid JSON format")?;
        blob.save(&file)?;
        success(&format!("Cookies saved to {}", file.display()));
        return Ok(());
    }

    // No action given: show the command's help like the bare `cookie` shortcut.
    let mut cmd = Cli::command();
    if let Some(sub) = cmd.find_subcommand_mut("cookie") {
        sub.print_help()?;
    }
    Ok(())
}

/// `config contact`: update and/or show the contact block.
fn manage_contact(args: &ContactArgs) -> Result<()> {
    let config_file = config_path(args.config_file.as_deref());
    let mut config = AppConfig::load(&config_file)?;

    let updating = args.has_updates();
    if updating {
        config.update_contact(args.whatsapp.as_deref(), args.email.as_deref(), &config_file)?;
        success("Contact information updated:");
    }
    if !(args.show || updating) {
        tracing::debug!("no contact action given, showing current values");
    }

    print_table(
        "Contact Information",
        ("Type", "Value"),
        &[
            ("WhatsApp", config.contact.whatsapp.as_str()),
            ("Email", config.contact.email.as_str()),
        ],
    );
    Ok(())
}

/// `info`: where things live and what goes in the header block.
fn show_info(config_file: Option<&Path>) -> Result<()> {
    let config_file = config_path(config_file);
    let config = AppConfig::load(&config_file)?;
    let config_display = config_file.display().to_string();
    let today = indonesian_date(&chrono::Local::now());
    let endpoint = config.drugs_url();

    print_table(
        "Apotek Tools Information",
        ("Property", "Value"),
        &[
            ("API Endpoint", endpoint.as_str()),
            ("Current Date", today.as_str()),
            ("Cookie File", config.api.cookie_file.as_str()),
            ("Config File", config_display.as_str()),
            ("WhatsApp Contact", config.contact.whatsapp.as_str()),
            ("Email Contact", config.contact.email.as_str()),
        ],
    );
    Ok(())
}

fn print_table(title: &str, header: (&str, &str), rows: &[(&str, &str)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new(header.0).fg(Color::Cyan),
        Cell::new(header.1).fg(Color::Green),
    ]);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key).fg(Color::Cyan), Cell::new(value).fg(Color::Green)]);
    }

    println!("{}", title.bold());
    println!("{}", table);
}
