use crate::logging::{self, LogTarget};
use crate::model::{AppConfig, Coordinates, MapView, Submission, TileLayer};
use crate::orchestrator::process_submission;
use crate::storage::{self, FileStorage, LocalStorage};
use crate::store::{self, MarkerStore, DEFAULT_STORAGE_KEY};
use crate::validate::CoordinatePolicy;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "map-markers",
    version,
    about = "Map of named points of interest with an optional TUI"
)]
pub struct Cli {
    /// Directory holding the persisted markers (defaults to the platform data dir)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Storage key the marker snapshot is kept under
    #[arg(long, default_value = DEFAULT_STORAGE_KEY)]
    pub storage_key: String,

    /// JSON file with the markers to use when nothing is persisted yet
    #[arg(long)]
    pub seed_file: Option<PathBuf>,

    /// Initial map center latitude
    #[arg(long, default_value_t = MapView::default().center.lat, allow_negative_numbers = true)]
    pub center_lat: f64,

    /// Initial map center longitude
    #[arg(long, default_value_t = MapView::default().center.lon, allow_negative_numbers = true)]
    pub center_lon: f64,

    /// Initial zoom level
    #[arg(long, default_value_t = MapView::default().zoom)]
    pub zoom: u8,

    /// Tile layer URL template shown as the map source
    #[arg(long, default_value_t = TileLayer::default().url_template)]
    pub tile_url: String,

    /// Accept coordinates outside ±90 latitude / ±180 longitude
    #[arg(long)]
    pub lenient_coordinates: bool,

    /// Print markers as JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print markers as text and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Append one marker and exit (no TUI)
    #[arg(
        long,
        num_args = 3,
        value_names = ["NAME", "LAT", "LON"],
        allow_negative_numbers = true
    )]
    pub add: Option<Vec<String>>,

    /// Export markers as JSON and exit (no TUI)
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Export markers as CSV and exit (no TUI)
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// TUI redraw interval
    #[arg(long, default_value = "100ms")]
    pub tick_rate: humantime::Duration,
}

impl Cli {
    /// Any print, add or export flag runs headless instead of opening the TUI.
    fn is_interactive(&self) -> bool {
        !(self.json
            || self.text
            || self.add.is_some()
            || self.export_json.is_some()
            || self.export_csv.is_some())
    }
}

/// Build an `AppConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> AppConfig {
    let tiles = TileLayer {
        url_template: args.tile_url.clone(),
        ..TileLayer::default()
    };
    AppConfig {
        data_dir: args
            .data_dir
            .clone()
            .unwrap_or_else(storage::default_data_dir),
        storage_key: args.storage_key.clone(),
        seed_file: args.seed_file.clone(),
        view: MapView {
            center: Coordinates::new(args.center_lat, args.center_lon),
            zoom: args.zoom.clamp(1, tiles.max_zoom),
        },
        tiles,
        policy: if args.lenient_coordinates {
            CoordinatePolicy::Lenient
        } else {
            CoordinatePolicy::Strict
        },
        tick_rate: Duration::from(args.tick_rate),
    }
}

/// Hydrate the store for `cfg`, honoring a seed file if one is configured.
pub fn open_store(cfg: &AppConfig) -> Result<MarkerStore<FileStorage>> {
    let defaults = match cfg.seed_file.as_deref() {
        Some(path) => store::load_seed_file(path)?,
        None => store::default_markers(),
    };
    Ok(MarkerStore::open(
        FileStorage::new(&cfg.data_dir),
        cfg.storage_key.clone(),
        defaults,
    ))
}

pub fn run(args: Cli) -> Result<()> {
    if args.json && args.text {
        return Err(anyhow::anyhow!("--json and --text are mutually exclusive"));
    }

    let cfg = build_config(&args);
    let target = if args.is_interactive() && cfg!(feature = "tui") {
        LogTarget::File(cfg.data_dir.clone())
    } else {
        LogTarget::Stderr
    };
    if let Err(e) = logging::init(target) {
        eprintln!("logging disabled: {e:#}");
    }

    let mut store = open_store(&cfg)?;

    if args.is_interactive() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(cfg, store);
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_print(&args, &cfg, &mut store);
        }
    }

    run_print(&args, &cfg, &mut store)
}

/// Non-interactive modes: optional append, then exports, then output.
fn run_print<S: LocalStorage>(
    args: &Cli,
    cfg: &AppConfig,
    store: &mut MarkerStore<S>,
) -> Result<()> {
    if let Some(add) = args.add.as_deref() {
        run_add(cfg, store, add)?;
    }

    handle_exports(args, store.collection())?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.json {
        let json = serde_json::to_string_pretty(store.collection())?;
        writeln!(out, "{json}")?;
    } else {
        for line in crate::text_summary::build_text_summary(store.collection()).lines {
            writeln!(out, "{line}")?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Validate and persist one `NAME LAT LON` triple.
fn run_add<S: LocalStorage>(
    cfg: &AppConfig,
    store: &mut MarkerStore<S>,
    add: &[String],
) -> Result<()> {
    let [name, latitude, longitude] = add else {
        return Err(anyhow::anyhow!("--add expects NAME LAT LON"));
    };
    let submission = Submission {
        name: name.clone(),
        latitude: latitude.clone(),
        longitude: longitude.clone(),
    };
    let processed = process_submission(store, cfg.policy, &submission);
    if !processed.accepted() || !processed.persisted {
        return Err(anyhow::anyhow!(processed.notice.text().to_string()));
    }
    eprintln!("{}", processed.notice.text());
    Ok(())
}

/// Handle export operations (JSON and CSV) for the print modes.
fn handle_exports(args: &Cli, markers: &crate::model::MarkerCollection) -> Result<()> {
    if let Some(p) = args.export_json.as_deref() {
        storage::export_json(p, markers).context("export JSON")?;
    }
    if let Some(p) = args.export_csv.as_deref() {
        storage::export_csv(p, markers).context("export CSV")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("map-markers").chain(argv.iter().copied()))
            .unwrap()
    }

    #[test]
    fn defaults_match_the_built_in_view() {
        let cfg = build_config(&parse(&[]));
        assert_eq!(cfg.view, MapView::default());
        assert_eq!(cfg.tiles, TileLayer::default());
        assert_eq!(cfg.storage_key, "markers");
        assert_eq!(cfg.policy, CoordinatePolicy::Strict);
        assert_eq!(cfg.tick_rate, Duration::from_millis(100));
    }

    #[test]
    fn add_takes_three_values_including_negatives() {
        let args = parse(&["--add", "South", "-33.86", "151.2"]);
        assert_eq!(
            args.add.as_deref(),
            Some(&["South".to_string(), "-33.86".to_string(), "151.2".to_string()][..])
        );
        assert!(!args.is_interactive());
    }

    #[test]
    fn lenient_flag_and_zoom_clamp() {
        let cfg = build_config(&parse(&["--lenient-coordinates", "--zoom", "99"]));
        assert_eq!(cfg.policy, CoordinatePolicy::Lenient);
        assert_eq!(cfg.view.zoom, TileLayer::default().max_zoom);
    }

    #[test]
    fn export_only_runs_headless_and_writes_files() {
        let dir = storage::scratch_dir("cli-export");
        let dir_arg = dir.to_string_lossy().to_string();
        let csv = dir.join("out.csv");
        let json = dir.join("out.json");
        let csv_arg = csv.to_string_lossy().to_string();
        let json_arg = json.to_string_lossy().to_string();

        assert!(!parse(&["--export-csv", &csv_arg]).is_interactive());
        assert!(!parse(&["--export-json", &json_arg]).is_interactive());

        let args = parse(&[
            "--data-dir",
            &dir_arg,
            "--export-csv",
            &csv_arg,
            "--export-json",
            &json_arg,
        ]);
        let cfg = build_config(&args);
        std::fs::create_dir_all(&dir).unwrap();
        let mut store = open_store(&cfg).unwrap();
        run_print(&args, &cfg, &mut store).unwrap();

        let written = std::fs::read_to_string(&csv).unwrap();
        assert!(written.starts_with("name,latitude,longitude\n"));
        assert_eq!(written.lines().count(), 6);
        let exported: Vec<crate::model::Marker> =
            serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(exported.len(), 5);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn headless_add_persists_to_data_dir() {
        let dir = storage::scratch_dir("cli-add");
        let dir_arg = dir.to_string_lossy().to_string();
        let args = parse(&["--data-dir", &dir_arg, "--add", "Test Point", "47.0", "39.0"]);
        let cfg = build_config(&args);
        let mut store = open_store(&cfg).unwrap();
        run_add(&cfg, &mut store, args.add.as_deref().unwrap()).unwrap();

        let reopened = open_store(&cfg).unwrap();
        assert_eq!(reopened.collection().len(), 6);

        let bad = ["Bad".to_string(), "abc".to_string(), "1".to_string()];
        assert!(run_add(&cfg, &mut store, &bad).is_err());
        assert_eq!(open_store(&cfg).unwrap().collection().len(), 6);
        let _ = std::fs::remove_dir_all(dir);
    }
}
