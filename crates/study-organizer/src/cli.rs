mod logging;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use study_organizer::{
    format_size, plan_moves, query, Category, CategoryFilter, Config, LibraryEntry,
    MaterialsLibrary, SortKey,
};

const TICK_MS: u64 = 80;
const BAR_WIDTH: usize = 30;
/// How long a watched file must go without events or size changes before it is copied.
const SETTLE: Duration = Duration::from_secs(2);

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template(" {spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("▏▎▍▌▋▊▉█▉▋▌▍▎")
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(":: {spinner} {msg:<16} ━{bar:30}━ {pos}/{len} | ETA {eta}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_chars("▏▎▍▌▋▊▉█▉▋▌▍▎")
        .progress_chars("━━░")
}

#[derive(Parser)]
#[command(name = "study-organizer")]
#[command(version)]
#[command(about = "Collect study materials into one library and keep it sorted")]
struct Cli {
    #[arg(short, long, global = true, env = "STUDY_LIBRARY", help = "Library path")]
    library: Option<PathBuf>,
    #[arg(long, global = true, help = "Config file [default: platform config dir]")]
    config: Option<PathBuf>,
    #[arg(short, long, global = true, help = "Debug logging")]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the library directory and remember it
    Init {
        #[arg(help = "Library path [default: ~/StudyMaterials]")]
        path: Option<PathBuf>,
    },
    /// Copy files into the library
    Add {
        #[arg(required = true, help = "Files to add")]
        files: Vec<PathBuf>,
    },
    /// Copy every file under the given folders into the library
    AddFolder {
        #[arg(required = true, help = "Folders to add")]
        dirs: Vec<PathBuf>,
    },
    /// List materials
    List {
        #[arg(short, long, default_value = "", help = "Name contains (case-insensitive)")]
        search: String,
        #[arg(
            short,
            long,
            default_value = "All",
            help = "All, PDF, Images, Documents, Videos or Others"
        )]
        category: CategoryFilter,
        #[arg(
            long,
            default_value = "DateAdded",
            help = "Name, DateAdded, Size or Type"
        )]
        sort: SortKey,
        #[arg(long, help = "Print JSON")]
        json: bool,
    },
    /// Delete a file from the library
    Remove {
        #[arg(help = "File path, absolute or relative to the library")]
        path: PathBuf,
    },
    /// Move files into per-category folders
    Organize {
        #[arg(short, long, help = "Move without asking (otherwise only show the plan)")]
        yes: bool,
    },
    /// Show counts per category
    Stats {
        #[arg(long, help = "Print JSON")]
        json: bool,
    },
    /// Report files with identical content
    Duplicates,
    /// Watch folders and add new files as they appear
    Watch {
        #[arg(required = true, help = "Folders to watch")]
        dirs: Vec<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        #[arg(help = "Shell to generate for (bash, zsh, fish, powershell)")]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config_path = cli.config.clone().or_else(Config::default_path);
    let mut config = match &config_path {
        Some(path) => Config::load_or_default(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(library) = cli.library {
        config.library_path = library;
    }

    match cli.command {
        Commands::Init { path } => cmd_init(config, path, config_path.as_deref()),
        Commands::Add { files } => cmd_add(config, &files),
        Commands::AddFolder { dirs } => cmd_add_folder(config, &dirs),
        Commands::List {
            search,
            category,
            sort,
            json,
        } => cmd_list(config, &search, category, sort, json),
        Commands::Remove { path } => cmd_remove(config, &path),
        Commands::Organize { yes } => cmd_organize(config, yes),
        Commands::Stats { json } => cmd_stats(config, json),
        Commands::Duplicates => cmd_duplicates(config),
        Commands::Watch { dirs } => cmd_watch(config, &dirs),
        Commands::Completions { shell } => {
            generate(
                shell,
                &mut Cli::command(),
                "study-organizer",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}

/// Opens the library and loads what is on disk.
fn load(config: Config) -> Result<MaterialsLibrary> {
    let path = config.library_path.clone();
    let mut library = MaterialsLibrary::open(config)
        .with_context(|| format!("opening library {}", path.display()))?;
    library.rescan()?;
    Ok(library)
}

fn cmd_init(config: Config, path: Option<PathBuf>, config_path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(path) => Config {
            library_path: path,
            ..config
        },
        None => config,
    };
    let library = MaterialsLibrary::open(config)?;

    match config_path {
        Some(config_path) => {
            library.config().save(config_path)?;
            println!("Saved config to {}", config_path.display());
        }
        None => eprintln!("No config directory on this platform; pass --library each time."),
    }

    println!("Library ready at {}", library.root().display());
    Ok(())
}

fn cmd_add(config: Config, files: &[PathBuf]) -> Result<()> {
    let mut library = load(config)?;
    let before = library.len();

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(bar_style());
    pb.enable_steady_tick(Duration::from_millis(TICK_MS));

    let mut failed = 0;
    for file in files {
        let name = file.file_name().map(|n| n.to_string_lossy().into_owned());
        pb.set_message(name.unwrap_or_else(|| "?".to_string()));

        match library.ingest_file(file) {
            Ok(entry) => pb.println(format!(
                "  [+] {} -> {}",
                entry.display_name(),
                entry.category()
            )),
            Err(e) => {
                failed += 1;
                pb.println(format!("  [!] {}", e));
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    println!(
        "Added {} new files ({} failed, {} in library).",
        library.len() - before,
        failed,
        library.len()
    );
    Ok(())
}

fn cmd_add_folder(config: Config, dirs: &[PathBuf]) -> Result<()> {
    let mut library = load(config)?;
    let before = library.len();

    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.enable_steady_tick(Duration::from_millis(TICK_MS));

    let mut failures = Vec::new();
    for dir in dirs {
        let result = library.ingest_folder_with(dir, |path| {
            pb.set_message(format!("Copying {}", path.display()));
        });
        failures.extend(result.failures);
    }

    pb.finish_and_clear();

    for failure in &failures {
        println!("  [!] {}", failure.error);
    }
    println!(
        "Added {} new files ({} failed, {} in library).",
        library.len() - before,
        failures.len(),
        library.len()
    );
    Ok(())
}

fn cmd_list(
    config: Config,
    search: &str,
    category: CategoryFilter,
    sort: SortKey,
    json: bool,
) -> Result<()> {
    let library = load(config)?;
    let results = query(&library.entries(), search, category, sort);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No materials match.");
        return Ok(());
    }

    for entry in &results {
        print_entry(entry);
    }
    println!("\n{} of {} materials", results.len(), library.len());
    Ok(())
}

fn print_entry(entry: &LibraryEntry) {
    println!(
        "  {} {:<40} {:>10}  {:<9}  Added {}",
        entry.category().icon(),
        entry.display_name(),
        entry.formatted_size(),
        entry.category(),
        entry.formatted_date()
    );
}

fn cmd_remove(config: Config, path: &Path) -> Result<()> {
    let mut library = load(config)?;
    let path = library.resolve(path);

    let removed = library.remove(&path)?;
    println!("Deleted {}", removed.path().display());
    Ok(())
}

fn cmd_organize(config: Config, yes: bool) -> Result<()> {
    let mut library = load(config)?;

    if !yes {
        let plan = plan_moves(library.root(), &library.entries());
        if plan.is_empty() {
            println!("Everything is already organized.");
            return Ok(());
        }
        println!("Would move {} files:\n", plan.len());
        for planned in &plan {
            println!(
                "  {} -> {}/",
                planned.from.display(),
                library.config().category_path(planned.category).display()
            );
        }
        println!("\nRe-run with --yes to move them.");
        return Ok(());
    }

    let report = library.organize();
    for failure in &report.failures {
        println!("  [!] {}", failure.error);
    }

    library.rescan()?;
    println!(
        "Moved {} files ({} not moved).",
        report.moved.len(),
        report.failures.len()
    );
    if report.collisions().next().is_some() {
        println!("Resolve the name collisions above by hand, then run organize again.");
    }
    Ok(())
}

fn cmd_stats(config: Config, json: bool) -> Result<()> {
    let library = load(config)?;
    let stats = library.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Library: {}", library.root().display());
    println!(
        "Total: {} files, {}",
        stats.total,
        format_size(stats.total_size)
    );
    println!("\nBy category:");
    for category in Category::ALL {
        let count = stats.count(category);
        if count > 0 {
            println!("  {} {:<10} {}", category.icon(), category, count);
        }
    }

    let filled = (stats.progress * BAR_WIDTH as f64).round() as usize;
    println!(
        "\nProgress: [{}{}] {:.0}%",
        "━".repeat(filled),
        "░".repeat(BAR_WIDTH - filled),
        stats.progress * 100.0
    );
    Ok(())
}

fn cmd_duplicates(config: Config) -> Result<()> {
    let library = load(config)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message("Hashing files");
    pb.enable_steady_tick(Duration::from_millis(TICK_MS));
    let dupes = library.duplicates();
    pb.finish_and_clear();

    if dupes.is_empty() {
        println!("No duplicates found.");
        return Ok(());
    }

    println!("Found {} duplicate groups:\n", dupes.len());

    for (i, group) in dupes.iter().enumerate() {
        println!("Group {} ({}):", i + 1, format_size(group[0].size()));
        for entry in group {
            println!("  {}", entry.path().display());
        }
        println!();
    }

    Ok(())
}

fn cmd_watch(config: Config, dirs: &[PathBuf]) -> Result<()> {
    let mut library = load(config)?;

    let (tx, rx) = mpsc::channel();
    let mut watcher = RecommendedWatcher::new(tx, notify::Config::default())?;

    for dir in dirs {
        println!("Watching: {}", dir.display());
        watcher.watch(dir, RecursiveMode::Recursive)?;
    }

    println!("\nWaiting for new files... (Ctrl+C to stop)\n");

    let mut pending = Pending::new(SETTLE);
    loop {
        match rx.recv_timeout(SETTLE / 4) {
            Ok(Ok(event))
                if matches!(
                    event.kind,
                    notify::EventKind::Create(_) | notify::EventKind::Modify(_)
                ) =>
            {
                for path in event.paths {
                    if path.is_file() && !path.starts_with(library.root()) {
                        pending.touch(path, Instant::now());
                    }
                }
            }
            Ok(Ok(_)) => {}
            Ok(Err(e)) => eprintln!("[!] Watch error: {}", e),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        for path in pending.settled(Instant::now()) {
            match library.ingest_file(&path) {
                Ok(entry) => println!("[+] {} -> {}", entry.display_name(), entry.category()),
                Err(e) => eprintln!("[!] {}", e),
            }
        }
    }

    Ok(())
}

/// Files seen by the watcher that may still be growing.
///
/// A path is released once `settle` has passed since its last event and its
/// size has not changed across that window.
struct Pending {
    settle: Duration,
    files: HashMap<PathBuf, (Instant, Option<u64>)>,
}

impl Pending {
    fn new(settle: Duration) -> Self {
        Self {
            settle,
            files: HashMap::new(),
        }
    }

    fn touch(&mut self, path: PathBuf, now: Instant) {
        let size = file_size(&path);
        self.files.insert(path, (now, size));
    }

    /// Removes and returns the paths that have been quiet for the settle window.
    fn settled(&mut self, now: Instant) -> Vec<PathBuf> {
        let mut ready = Vec::new();
        let settle = self.settle;

        self.files.retain(|path, (since, size)| {
            if now.duration_since(*since) < settle {
                return true;
            }
            match file_size(path) {
                // gone before it settled
                None => false,
                Some(current) if Some(current) == *size => {
                    ready.push(path.clone());
                    false
                }
                current => {
                    *since = now;
                    *size = current;
                    true
                }
            }
        });

        ready.sort();
        ready
    }
}

fn file_size(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().filter(|m| m.is_file()).map(|m| m.len())
}
