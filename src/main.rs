//! `tripmap` command line

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;

use tripmap::map::{ListEntry, MapOptions, MapState, MapView, SceneSurface, mount};
use tripmap::{AppContext, GroupKey, GroupingMode, Language, PlaceId, RouteQuery, SelectionSource, TravelMode, TripMapConfig};

#[derive(Parser)]
#[command(name = "tripmap")]
#[command(version, about = "Itinerary map and route tools for the Taiwan trip site")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true, env = "TRIPMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Display language (zh, en, ja); defaults to the remembered one
    #[arg(long, global = true)]
    lang: Option<Language>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Category,
    Day,
}

impl From<ModeArg> for GroupingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Category => GroupingMode::ByCategory,
            ModeArg::Day => GroupingMode::ByDay,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Marker,
    List,
}

#[derive(Subcommand)]
enum Command {
    /// List the map tabs of a grouping
    Groups {
        #[arg(long, value_enum, default_value = "category")]
        mode: ModeArg,
    },

    /// Show the markers of one group (e.g. `taipei`, `day:3`)
    Show {
        group: GroupKey,
        /// Print the recorded scene as JSON
        #[arg(long)]
        json: bool,
    },

    /// Select a place within a group and show its info display
    Select {
        group: GroupKey,
        place: PlaceId,
        #[arg(long, value_enum, default_value = "list")]
        via: SourceArg,
    },

    /// Calculate a route between two places by name
    Route {
        origin: String,
        destination: String,
        #[arg(long, default_value = "driving")]
        mode: TravelMode,
    },

    /// Suggest place names containing a fragment
    Suggest { fragment: String },

    /// Export scenes for the static site
    Export {
        #[arg(long, default_value = "dist")]
        out: PathBuf,
    },

    /// Serve an exported site for preview
    Serve {
        #[arg(long, default_value = "dist")]
        dir: PathBuf,
        #[arg(long, default_value = "8080")]
        port: u16,
    },

    /// Show or change the remembered display language
    Lang { language: Option<Language> },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("Command failed: {:?}", e);
            eprintln!("Error: {}", tripmap::error::describe(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = TripMapConfig::load_from_path(cli.config.clone()).context("Failed to load configuration")?;
    tripmap::logging::init(&config.logging, cli.verbose)?;

    let mut ctx = AppContext::new(config)?;
    if let Err(e) = ctx.open_store() {
        warn!("Continuing without preference store: {:#}", e);
    }
    ctx.restore_language().await;
    if let Some(lang) = cli.lang {
        ctx.set_language(lang).await?;
    }

    match cli.command {
        Command::Groups { mode } => groups(&ctx, mode.into()),
        Command::Show { group, json } => show(&ctx, group, json),
        Command::Select { group, place, via } => select(&ctx, group, place, via),
        Command::Route {
            origin,
            destination,
            mode,
        } => route(&ctx, RouteQuery::new(origin, destination, mode)).await,
        Command::Suggest { fragment } => {
            for name in ctx.catalog.suggest(ctx.language(), &fragment) {
                println!("{name}");
            }
            Ok(())
        }
        Command::Export { out } => {
            let summary = tripmap::export::export_site(&ctx, &out)?;
            println!(
                "Exported {} scenes ({} files) to {}",
                summary.scenes,
                summary.files.len(),
                out.display()
            );
            Ok(())
        }
        Command::Serve { dir, port } => tripmap::web::run(&dir, port).await,
        Command::Lang { language } => {
            if let Some(language) = language {
                ctx.set_language(language).await?;
            }
            println!("{}", ctx.language());
            Ok(())
        }
    }
}

fn groups(ctx: &AppContext, mode: GroupingMode) -> Result<()> {
    let index = ctx.group_index();
    let lang = ctx.language();
    for key in index.keys(mode) {
        let label = index.label(&key, lang, &ctx.translator).unwrap_or_default();
        let count = index.place_ids(&key).len();
        println!("{:<24} {label} ({count})", key.to_string());
    }
    Ok(())
}

fn open_view(ctx: &AppContext, group: GroupKey) -> Result<MapView<SceneSurface>> {
    let state = mount(
        |options: &MapOptions| Ok(SceneSurface::new(options)),
        ctx.map_data(),
        ctx.viewport_settings(),
        group.clone(),
        ctx.language(),
    );
    match state {
        MapState::Ready(view) => Ok(view),
        MapState::Unavailable { banner } => anyhow::bail!("{banner} ({group})"),
    }
}

fn print_view(view: &MapView<SceneSurface>) {
    let viewport = view.viewport();
    println!(
        "center {} zoom {}",
        viewport.center.format_coordinates(),
        viewport.zoom
    );
    if let Some(no_data) = view.no_data() {
        println!("{no_data}");
    }
    for entry in view.list_entries() {
        match entry {
            ListEntry::Place {
                place_id,
                name,
                selected,
                ..
            } => {
                let mark = if selected { '*' } else { ' ' };
                println!("{mark} {place_id:>3}  {name}");
            }
            ListEntry::Missing(missing) => println!("  {:>3}  {}", missing.place_id, missing.label),
        }
    }
    if let Some((_, info)) = view.surface().open_info() {
        let labels = &info.labels;
        println!();
        println!("{}", info.name);
        println!("{}: {}", labels.address, info.address);
        println!("{}: {}", labels.description, info.description);
        println!("[{}]", labels.view_details);
    }
}

fn show(ctx: &AppContext, group: GroupKey, json: bool) -> Result<()> {
    let view = open_view(ctx, group)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&view.surface().scene())?);
    } else {
        print_view(&view);
    }
    Ok(())
}

fn select(ctx: &AppContext, group: GroupKey, place: PlaceId, via: SourceArg) -> Result<()> {
    let mut view = open_view(ctx, group)?;
    match via {
        SourceArg::List => view.select_place(place, SelectionSource::List)?,
        SourceArg::Marker => {
            let handle = view
                .handle_of(place)
                .ok_or(tripmap::map::SelectionError::NotOnMap(place))?;
            view.click_marker(handle)?
        }
    };
    print_view(&view);
    Ok(())
}

async fn route(ctx: &AppContext, query: RouteQuery) -> Result<()> {
    let lang = ctx.language();
    let mut calculator = ctx.route_calculator();
    if let Err(rejection) = calculator.check(&query, lang) {
        println!("{}", rejection.message(lang, &ctx.translator));
        return Ok(());
    }

    let provider = ctx.directions()?;
    match calculator.calculate(&provider, &query, lang).await {
        Err(rejection) => println!("{}", rejection.message(lang, &ctx.translator)),
        Ok(Err(failure)) => println!("{}", failure.message(lang, &ctx.translator)),
        Ok(Ok(summary)) => {
            let display = summary.localize(lang, &ctx.translator);
            println!("{}", display.mode);
            println!("{}", display.distance);
            println!("{}", display.duration);
            println!("{}", display.straight_line);
        }
    }
    Ok(())
}
