//! `startgrid`: headless command-line shell for the StartGrid dashboard.
//!
//! Every command loads the stored configuration, applies one change through
//! [`Dashboard`], and writes the result back if anything changed:
//!
//! ```text
//! startgrid add weather --city Hangzhou
//! startgrid add icon --title Docs --url https://docs.rs --width 2
//! startgrid move 1712345678901 5 2
//! startgrid show
//! startgrid export --date 2026-10-19
//! ```
//!
//! `startgrid shell` reads commands from stdin, one per line, and saves
//! through the debounced [`Autosave`] task instead of after every line.
//!
//! # Startup sequence
//!
//! 1. CLI arguments are parsed with `clap`.
//! 2. The TOML runtime configuration is loaded (defaults if absent).
//! 3. `tracing_subscriber` is initialised from `RUST_LOG`, falling back to
//!    the configured level.
//! 4. File stores are opened under the data directory: `primary/` for the
//!    configuration document and `blobs/` for the uploaded wallpaper.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use startgrid_app::application::autosave::Autosave;
use startgrid_app::application::dashboard::Dashboard;
use startgrid_app::infrastructure::storage::app_config::load_app_config;
use startgrid_app::infrastructure::storage::repository::{backup_file_name, ConfigRepository};
use startgrid_app::infrastructure::storage::store::{FileStore, KeyValueStore};
use startgrid_core::{
    ClockStyle, DropOutcome, GridCoord, GridDensity, ImageCategory, MoveOutcome, NewsSource,
    SearchProvider, Shortcut, Span, Theme, WidgetKind,
};

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "startgrid", version, about = "Start-page dashboard layout and settings")]
struct Cli {
    /// Runtime configuration file (TOML).  Defaults to the platform config dir.
    #[arg(long, global = true, env = "STARTGRID_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// One line of `startgrid shell` input.
#[derive(Debug, Parser)]
#[command(no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the grid and the list of tiles.
    Show,
    /// Add a tile in the first free slot.
    Add(AddArgs),
    /// Delete a tile.
    Remove { id: String },
    /// Move a tile so its top-left corner is at (x, y).
    Move { id: String, x: u32, y: u32 },
    /// Drag a tile along a path of cells and drop it on the last one.
    Drag {
        id: String,
        /// Cells as `x,y`; use `-` for a point outside the grid.
        #[arg(required = true)]
        path: Vec<String>,
    },
    /// Change the size of a shortcut.
    Resize { id: String, width: u32, height: u32 },
    /// Write a self-contained backup.
    Export {
        /// Output file.  Defaults to the dated backup name.
        #[arg(required_unless_present = "date")]
        file: Option<PathBuf>,
        /// Date (YYYY-MM-DD) for the default backup file name.
        #[arg(long)]
        date: Option<String>,
    },
    /// Replace the configuration with a backup.
    Import { file: PathBuf },
    /// Use a remote image as wallpaper.
    WallpaperUrl { url: String },
    /// Use an uploaded image as wallpaper.  The file holds a data URL.
    WallpaperUpload { file: PathBuf },
    /// Set the background blur (0-20).
    Blur {
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },
    Theme { theme: ThemeArg },
    Density { density: DensityArg },
    Clock { style: ClockArg },
    /// Show or hide the clock.
    ToggleClock,
    /// Show or hide the clock's seconds.
    ToggleSeconds,
    Search { provider: SearchArg },
    /// Restore the default configuration.
    Reset,
    /// Read commands from stdin, one per line.
    Shell,
}

#[derive(Debug, Args)]
struct AddArgs {
    kind: KindArg,
    #[arg(long, default_value = "")]
    title: String,
    #[arg(long, default_value = "")]
    url: String,
    /// Icon URL; empty uses the site favicon.
    #[arg(long, default_value = "")]
    icon: String,
    #[arg(long, default_value_t = 1)]
    width: u32,
    #[arg(long, default_value_t = 1)]
    height: u32,
    /// Weather city; empty detects it from the location.
    #[arg(long, default_value = "")]
    city: String,
    #[arg(long, value_enum, default_value_t = SourceArg::Weibo)]
    source: SourceArg,
    #[arg(long, default_value = "")]
    content: String,
    /// Countdown target date (YYYY-MM-DD).
    #[arg(long, default_value = "")]
    target_date: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Icon,
    Weather,
    News,
    History,
    Bing,
    Heisi,
    Baisi,
    Jk,
    Notes,
    Todo,
    Countdown,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    Weibo,
    Douyin,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ThemeArg {
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DensityArg {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ClockArg {
    Default,
    Electronic,
    Mechanical,
    Alarm,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SearchArg {
    Bing,
    Google,
    Baidu,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Light => Theme::Light,
        }
    }
}

impl From<DensityArg> for GridDensity {
    fn from(arg: DensityArg) -> Self {
        match arg {
            DensityArg::Small => GridDensity::Small,
            DensityArg::Medium => GridDensity::Medium,
            DensityArg::Large => GridDensity::Large,
        }
    }
}

impl From<ClockArg> for ClockStyle {
    fn from(arg: ClockArg) -> Self {
        match arg {
            ClockArg::Default => ClockStyle::Default,
            ClockArg::Electronic => ClockStyle::Electronic,
            ClockArg::Mechanical => ClockStyle::Mechanical,
            ClockArg::Alarm => ClockStyle::Alarm,
        }
    }
}

impl From<SearchArg> for SearchProvider {
    fn from(arg: SearchArg) -> Self {
        match arg {
            SearchArg::Bing => SearchProvider::Bing,
            SearchArg::Google => SearchProvider::Google,
            SearchArg::Baidu => SearchProvider::Baidu,
        }
    }
}

impl AddArgs {
    /// The widget kind to add; shortcuts are handled separately.
    fn widget_kind(&self) -> WidgetKind {
        match self.kind {
            KindArg::Icon => WidgetKind::Shortcut(self.shortcut()),
            KindArg::Weather => WidgetKind::Weather {
                city: self.city.clone(),
            },
            KindArg::News => WidgetKind::News {
                source: match self.source {
                    SourceArg::Weibo => NewsSource::Weibo,
                    SourceArg::Douyin => NewsSource::Douyin,
                },
            },
            KindArg::History => WidgetKind::History,
            KindArg::Bing => WidgetKind::ImageOfTheDay,
            KindArg::Heisi => WidgetKind::CuratedImage {
                category: ImageCategory::Heisi,
            },
            KindArg::Baisi => WidgetKind::CuratedImage {
                category: ImageCategory::Baisi,
            },
            KindArg::Jk => WidgetKind::CuratedImage {
                category: ImageCategory::Jk,
            },
            KindArg::Notes => WidgetKind::Note {
                content: self.content.clone(),
            },
            KindArg::Todo => WidgetKind::TodoList { todos: Vec::new() },
            KindArg::Countdown => WidgetKind::Countdown {
                title: self.title.clone(),
                target_date: self.target_date.clone(),
            },
        }
    }

    fn shortcut(&self) -> Shortcut {
        Shortcut {
            title: self.title.clone(),
            url: self.url.clone(),
            icon: self.icon.clone(),
            ..Shortcut::default()
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let app_config =
        load_app_config(cli.config.as_deref()).context("failed to load runtime configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&app_config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let grid = app_config.grid.spec()?;
    let data_dir = app_config.storage.resolve_data_dir()?;
    info!(data_dir = %data_dir.display(), columns = grid.columns, "opening StartGrid storage");

    let repo = Arc::new(ConfigRepository::new(
        Arc::new(FileStore::new(data_dir.join("primary"))) as Arc<dyn KeyValueStore>,
        Arc::new(FileStore::new(data_dir.join("blobs"))) as Arc<dyn KeyValueStore>,
        grid,
    ));
    let loaded = repo.load().await;
    let mut dashboard = Dashboard::new(loaded.clone(), grid);
    let visible_rows = app_config.grid.visible_rows;

    if let Command::Shell = cli.command {
        let autosave = Autosave::spawn(
            Arc::clone(&repo),
            loaded,
            app_config.storage.autosave_debounce(),
        );
        run_shell(&mut dashboard, &repo, &autosave, visible_rows).await?;
        autosave.shutdown().await;
        return Ok(());
    }

    execute(cli.command, &mut dashboard, &repo, visible_rows).await?;
    if dashboard.revision() > 0 {
        repo.save(dashboard.configuration())
            .await
            .context("failed to save configuration")?;
    }
    Ok(())
}

async fn run_shell(
    dashboard: &mut Dashboard,
    repo: &ConfigRepository,
    autosave: &Autosave,
    visible_rows: u32,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }
        if matches!(words[0], "quit" | "exit") {
            break;
        }
        let parsed = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        let before = dashboard.revision();
        if let Err(e) = execute(parsed.command, dashboard, repo, visible_rows).await {
            eprintln!("error: {e:#}");
        }
        if dashboard.revision() != before {
            autosave.notify(dashboard.configuration());
        }
    }
    Ok(())
}

async fn execute(
    command: Command,
    dashboard: &mut Dashboard,
    repo: &ConfigRepository,
    visible_rows: u32,
) -> anyhow::Result<()> {
    match command {
        Command::Show => print!("{}", render(dashboard, visible_rows)),
        Command::Add(args) => {
            let id = match args.kind {
                KindArg::Icon => dashboard
                    .add_shortcut(args.shortcut(), Span::new(args.width, args.height))?,
                _ => dashboard.add_widget(args.widget_kind())?,
            };
            println!("{id}");
        }
        Command::Remove { id } => {
            if !dashboard.remove_item(&id) {
                bail!("no tile with id {id}");
            }
        }
        Command::Move { id, x, y } => {
            report_move(dashboard.move_item(&id, GridCoord::new(x, y)))?;
        }
        Command::Drag { id, path } => {
            if !dashboard.begin_drag(&id) {
                bail!("no tile with id {id}");
            }
            let mut target = None;
            for cell in &path {
                target = parse_cell(cell)?;
                if let Some(valid) = dashboard.drag_over(target) {
                    println!("{cell}: {}", if valid { "valid" } else { "invalid" });
                }
            }
            match dashboard.end_drag(target) {
                DropOutcome::Committed { to, .. } => println!("dropped at ({}, {})", to.x, to.y),
                DropOutcome::Rejected { reason, .. } => bail!("drop rejected: {reason:?}"),
                DropOutcome::Cancelled { .. } | DropOutcome::NotDragging => {
                    println!("drag cancelled")
                }
            }
        }
        Command::Resize { id, width, height } => {
            report_move(dashboard.resize_shortcut(&id, Span::new(width, height)))?;
        }
        Command::Export { file, date } => {
            let path = match (file, date) {
                (Some(file), _) => file,
                (None, Some(date)) => PathBuf::from(backup_file_name(&date)),
                (None, None) => bail!("either a file or --date is required"),
            };
            let json = repo.export(dashboard.configuration()).await?;
            tokio::fs::write(&path, json)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("{}", path.display());
        }
        Command::Import { file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let config = repo.import(&raw)?;
            dashboard.replace_configuration(config);
        }
        Command::WallpaperUrl { url } => dashboard.set_wallpaper_url(url),
        Command::WallpaperUpload { file } => {
            let data = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let data = data.trim();
            if !data.starts_with("data:") {
                bail!("{} does not contain a data URL", file.display());
            }
            dashboard.set_wallpaper_upload(data)?;
        }
        Command::Blur { value } => println!("{}", dashboard.set_blur(value)),
        Command::Theme { theme } => dashboard.set_theme(theme.into()),
        Command::Density { density } => dashboard.set_grid_density(density.into()),
        Command::Clock { style } => dashboard.set_clock_style(style.into()),
        Command::ToggleClock => println!("{}", dashboard.toggle_clock()),
        Command::ToggleSeconds => println!("{}", dashboard.toggle_clock_seconds()),
        Command::Search { provider } => dashboard.set_search_provider(provider.into()),
        Command::Reset => dashboard.reset(),
        Command::Shell => bail!("already in a shell"),
    }
    Ok(())
}

fn report_move(outcome: MoveOutcome) -> anyhow::Result<()> {
    match outcome {
        MoveOutcome::Accepted => Ok(()),
        MoveOutcome::Rejected(reason) => bail!("rejected: {reason:?}"),
    }
}

/// Parses `x,y`, or `-` for a pointer outside the grid.
fn parse_cell(cell: &str) -> anyhow::Result<Option<GridCoord>> {
    if cell == "-" {
        return Ok(None);
    }
    let (x, y) = cell
        .split_once(',')
        .with_context(|| format!("expected x,y but got {cell:?}"))?;
    Ok(Some(GridCoord::new(
        x.trim().parse().context("invalid x")?,
        y.trim().parse().context("invalid y")?,
    )))
}

/// Draws the grid with one letter per tile, followed by the tile list.
fn render(dashboard: &Dashboard, visible_rows: u32) -> String {
    const LABELS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

    let items = dashboard.layout().items();
    let columns = dashboard.grid().columns;
    let rows = items
        .iter()
        .map(|item| item.rect().bottom() - 1)
        .max()
        .unwrap_or(0)
        .max(visible_rows);

    let label = |index: usize| LABELS[index % LABELS.len()] as char;
    let mut out = String::new();
    for y in 1..=rows {
        for x in 1..=columns {
            let cell = GridCoord::new(x, y);
            let occupant = items.iter().position(|item| {
                let r = item.rect();
                cell.x >= r.x && cell.x < r.right() && cell.y >= r.y && cell.y < r.bottom()
            });
            out.push(occupant.map_or('.', label));
        }
        out.push('\n');
    }
    for (index, item) in items.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}  {:<14} {:<9} ({}, {}) {}x{}",
            label(index),
            item.id,
            item.kind.wire_name(),
            item.x,
            item.y,
            item.w,
            item.h
        );
    }
    out
}
