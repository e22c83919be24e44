//! CLI entry point for `leadsift`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use leadsift::config::{self, Config};
use leadsift::export::{export_leads, ExportFormat};
use leadsift::inbox::{self, BatchReport};
use leadsift::model::lead::{Lead, LeadPriority, LeadSource, LeadStatus};
use leadsift::model::message::RawMessage;
use leadsift::store::{LeadQuery, LeadStore, SortKey, SortOrder};

#[derive(Parser)]
#[command(
    name = "leadsift",
    version,
    about = "Turn an inbound mailbox into sales leads",
    long_about = "Fetch messages from an IMAP inbox or read MBOX/EML archives, \
                  classify each one as a lead (source, priority, tags, contact details) \
                  and keep the results in a local lead store."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Lead store file (default: <data dir>/leads.json)
    #[arg(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch recent messages from the configured IMAP inbox
    Fetch {
        /// Keep at most N of the newest messages
        #[arg(long)]
        limit: Option<usize>,
        /// Only look at messages from the last D days
        #[arg(long)]
        since_days: Option<u32>,
        /// Classify without saving to the store
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        json: bool,
    },
    /// Classify messages from an MBOX file, an .eml file or a directory of them
    Scan {
        path: PathBuf,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        json: bool,
    },
    /// Classify a single .eml file and print the result
    Classify {
        path: PathBuf,
        /// Message uid to use for the lead id (default: derived from content)
        #[arg(long)]
        uid: Option<String>,
    },
    /// List stored leads
    List {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Show one lead in full
    Show { id: String },
    /// Set the pipeline status of a lead
    Status { id: String, status: LeadStatus },
    /// Set the priority of a lead
    Priority { id: String, priority: LeadPriority },
    /// Assign a lead to someone (omit WHO to clear)
    Assign { id: String, who: Option<String> },
    /// Append a timestamped note to a lead
    Note { id: String, text: String },
    /// Delete a lead from the store
    Remove { id: String },
    /// Show lead counts by status, priority, source and tag
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Export leads to CSV or JSON
    Export {
        /// csv or json (default from config)
        #[arg(short, long)]
        format: Option<ExportFormat>,
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

#[derive(Args)]
struct FilterArgs {
    /// Match name, email, company or subject (case-insensitive)
    #[arg(short, long)]
    search: Option<String>,
    #[arg(long)]
    status: Option<LeadStatus>,
    #[arg(long)]
    priority: Option<LeadPriority>,
    #[arg(long)]
    source: Option<LeadSource>,
    /// date, name or priority
    #[arg(long, default_value = "date")]
    sort: SortKey,
    /// asc or desc
    #[arg(long, default_value = "desc")]
    order: SortOrder,
    #[arg(short, long)]
    limit: Option<usize>,
}

impl FilterArgs {
    fn to_query(&self) -> LeadQuery {
        LeadQuery {
            search: self.search.clone(),
            status: self.status,
            priority: self.priority,
            source: self.source,
            sort: self.sort,
            order: self.order,
            limit: self.limit,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    let store_path = cli
        .store
        .clone()
        .unwrap_or_else(|| config::store_path(&config));

    match cli.command {
        Commands::Fetch {
            limit,
            since_days,
            dry_run,
            json,
        } => cmd_fetch(&config, &store_path, limit, since_days, dry_run, json),
        Commands::Scan {
            path,
            dry_run,
            json,
        } => cmd_scan(&config, &store_path, &path, dry_run, json),
        Commands::Classify { path, uid } => cmd_classify(&path, uid.as_deref()),
        Commands::List { filter, json } => cmd_list(&config, &store_path, &filter, json),
        Commands::Show { id } => cmd_show(&config, &store_path, &id),
        Commands::Status { id, status } => update_lead(&store_path, &id, |store, id| {
            store.update_status(id, status).map(|_| ())
        }),
        Commands::Priority { id, priority } => update_lead(&store_path, &id, |store, id| {
            store.update_priority(id, priority).map(|_| ())
        }),
        Commands::Assign { id, who } => update_lead(&store_path, &id, |store, id| {
            store.assign(id, who.as_deref()).map(|_| ())
        }),
        Commands::Note { id, text } => update_lead(&store_path, &id, |store, id| {
            store.add_note(id, &text).map(|_| ())
        }),
        Commands::Remove { id } => update_lead(&store_path, &id, |store, id| {
            store.remove(id).map(|_| ())
        }),
        Commands::Stats { json } => cmd_stats(&store_path, json),
        Commands::Export {
            format,
            output,
            filter,
        } => cmd_export(&config, &store_path, format, &output, &filter),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_file = config::log_file_path(config);
    let log_dir = log_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "leadsift.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "leadsift", &mut std::io::stdout());
    Ok(())
}

fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

fn cmd_fetch(
    config: &Config,
    store_path: &Path,
    limit: Option<usize>,
    since_days: Option<u32>,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut mailbox = config.mailbox.clone();
    if let Some(limit) = limit {
        mailbox.limit = limit;
    }
    if let Some(days) = since_days {
        mailbox.since_days = days;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message(format!("Fetching from {}/{}", mailbox.host, mailbox.folder));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let start = Instant::now();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(inbox::imap::fetch_leads(&mailbox));
    pb.finish_and_clear();
    let report = result?;

    finish_batch(config, store_path, report, start, dry_run, json)
}

fn cmd_scan(
    config: &Config,
    store_path: &Path,
    path: &Path,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} Scanning [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let report = inbox::local::scan_path(
        path,
        Some(&|current, total| {
            pb.set_length(total);
            pb.set_position(current);
        }),
    );
    pb.finish_and_clear();

    finish_batch(config, store_path, report?, start, dry_run, json)
}

/// Print a batch and sync it into the store unless this is a dry run.
fn finish_batch(
    config: &Config,
    store_path: &Path,
    report: BatchReport,
    start: Instant,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    let sync = if dry_run {
        None
    } else {
        let mut store = LeadStore::open(store_path)?;
        let sync = store.sync(report.leads.iter().cloned());
        store.save()?;
        Some(sync)
    };

    if json {
        let out = serde_json::json!({
            "total": report.total,
            "filtered": report.filtered,
            "failed": report.failed,
            "inserted": sync.map(|s| s.inserted),
            "updated": sync.map(|s| s.updated),
            "leads": report.leads,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let leads: Vec<&Lead> = report.leads.iter().collect();
    print_lead_table(&leads, &config.general.date_format);

    println!("  {:<20} {}", "Messages", report.total);
    println!("  {:<20} {}", "Leads", report.leads.len());
    println!("  {:<20} {}", "Not leads", report.filtered);
    if report.failed > 0 {
        println!("  {:<20} {}", "Undecodable", report.failed);
    }
    match sync {
        Some(s) => {
            println!("  {:<20} {} new, {} updated", "Store", s.inserted, s.updated);
            println!("  {:<20} {}", "Store file", store_path.display());
        }
        None => println!("  {:<20} dry run, nothing saved", "Store"),
    }
    println!("  {:<20} {:.2?}", "Elapsed", start.elapsed());
    println!();
    Ok(())
}

fn cmd_classify(path: &Path, uid: Option<&str>) -> anyhow::Result<()> {
    let bytes = leadsift::parser::eml::read_eml(path)?;
    let mut message = leadsift::parser::message::parse_raw(&RawMessage::new(
        uid.unwrap_or_default(),
        bytes.clone(),
    ))?;
    if uid.is_none() {
        message.uid = inbox::local::local_uid(message.message_id.as_deref(), &bytes);
    }

    match leadsift::classify::classify(&message) {
        Some(lead) => println!("{}", serde_json::to_string_pretty(&lead)?),
        None => println!("  Not a lead (no usable sender, or an automated sender)"),
    }
    Ok(())
}

fn cmd_list(
    config: &Config,
    store_path: &Path,
    filter: &FilterArgs,
    json: bool,
) -> anyhow::Result<()> {
    let store = LeadStore::open(store_path)?;
    let leads = store.query(&filter.to_query());

    if json {
        println!("{}", serde_json::to_string_pretty(&leads)?);
    } else {
        print_lead_table(&leads, &config.general.date_format);
    }
    Ok(())
}

fn cmd_show(config: &Config, store_path: &Path, id: &str) -> anyhow::Result<()> {
    let store = LeadStore::open(store_path)?;
    let id = store.resolve_id(id);
    let Some(lead) = store.get(&id) else {
        anyhow::bail!("Lead not found: {id}");
    };
    let fmt = config.general.date_format.as_str();

    println!();
    println!("  {:<12} {}", "Id", lead.id);
    println!("  {:<12} {}", "Name", lead.name);
    println!("  {:<12} {}", "Email", lead.email);
    if let Some(company) = &lead.company {
        println!("  {:<12} {}", "Company", company);
    }
    if let Some(phone) = &lead.phone {
        println!("  {:<12} {}", "Phone", phone);
    }
    println!("  {:<12} {}", "Subject", lead.subject);
    println!("  {:<12} {}", "Source", lead.source);
    println!("  {:<12} {}", "Priority", lead.priority);
    println!("  {:<12} {}", "Status", lead.status);
    if let Some(who) = &lead.assigned_to {
        println!("  {:<12} {}", "Assigned to", who);
    }
    if !lead.tag_list().is_empty() {
        println!("  {:<12} {}", "Tags", lead.tag_list().join(", "));
    }
    println!("  {:<12} {}", "Received", lead.received_at.format(fmt));
    println!("  {:<12} {}", "Updated", lead.updated_at.format(fmt));
    println!("  {}", "-".repeat(72));
    for line in lead.message.lines() {
        println!("  {line}");
    }
    if let Some(notes) = &lead.notes {
        println!("  {}", "-".repeat(72));
        for line in notes.lines() {
            println!("  {line}");
        }
    }
    println!();
    Ok(())
}

/// Open the store, apply one change to a lead, and save.
fn update_lead(
    store_path: &Path,
    id: &str,
    change: impl FnOnce(&mut LeadStore, &str) -> leadsift::error::Result<()>,
) -> anyhow::Result<()> {
    let mut store = LeadStore::open(store_path)?;
    let id = store.resolve_id(id);
    change(&mut store, &id)?;
    store.save()?;
    println!("  Updated {id}");
    Ok(())
}

fn cmd_stats(store_path: &Path, json: bool) -> anyhow::Result<()> {
    let store = LeadStore::open(store_path)?;
    let stats = store.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    use humansize::{format_size, BINARY};
    let file_size = std::fs::metadata(store_path).map(|m| m.len()).unwrap_or(0);

    println!();
    println!("  {:<20} {}", "Store", store_path.display());
    println!("  {:<20} {}", "Store size", format_size(file_size, BINARY));
    println!("  {:<20} {}", "Leads", stats.total);
    for (title, counts) in [
        ("By status", &stats.by_status),
        ("By priority", &stats.by_priority),
        ("By source", &stats.by_source),
        ("By tag", &stats.by_tag),
    ] {
        if counts.is_empty() {
            continue;
        }
        println!();
        println!("  {title}:");
        for (key, count) in counts {
            println!("    {count:>6}  {key}");
        }
    }
    println!();
    Ok(())
}

fn cmd_export(
    config: &Config,
    store_path: &Path,
    format: Option<ExportFormat>,
    output: &Path,
    filter: &FilterArgs,
) -> anyhow::Result<()> {
    let format = match format {
        Some(f) => f,
        None => config.export.default_format.parse()?,
    };

    let store = LeadStore::open(store_path)?;
    let leads = store.query(&filter.to_query());

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    export_leads(&leads, format, output, config.export.csv_separator)?;
    println!(
        "  Exported {} lead(s) as {:?} to {}",
        leads.len(),
        format,
        output.display()
    );
    Ok(())
}

/// Print leads as a human-readable table.
fn print_lead_table(leads: &[&Lead], date_format: &str) {
    println!();
    println!("  {} lead(s)", leads.len());
    println!();

    if leads.is_empty() {
        return;
    }

    println!(
        "  {:<22} {:<17} {:<20} {:<28} {:<8} {:<10} {}",
        "Id", "Received", "Name", "Email", "Priority", "Status", "Subject"
    );
    println!("  {}", "-".repeat(130));

    for lead in leads {
        println!(
            "  {} {} {} {} {:<8} {:<10} {}",
            pad(&lead.id, 22),
            pad(&lead.received_at.format(date_format).to_string(), 17),
            pad(&lead.name, 20),
            pad(&lead.email, 28),
            lead.priority.as_str(),
            lead.status.as_str(),
            truncate_str(&lead.subject, 40),
        );
    }
    println!();
}

/// Truncate to `width` columns, then pad with spaces to exactly `width`.
fn pad(s: &str, width: usize) -> String {
    let mut out = truncate_str(s, width);
    let used = UnicodeWidthStr::width(out.as_str());
    out.extend(std::iter::repeat(' ').take(width.saturating_sub(used)));
    out
}

/// Truncate a string to fit within `max_width` columns, adding "..." if needed.
fn truncate_str(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return s.chars().take(max_width).collect();
    }
    let mut result = String::new();
    let mut current_width = 0;
    for ch in s.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if current_width + ch_width + 3 > max_width {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }
    result.push_str("...");
    result
}
