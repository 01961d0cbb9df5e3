use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use listingviz::config::DashboardConfig;
use listingviz::dashboard::{build_page, Page, Summary, ViewOptions};
use listingviz::data::{write_csv, CategoryField, Dataset, Listing};
use listingviz::filter::{FilterOverrides, FilterSelection};
use listingviz::graph::render_chart;
use listingviz::parser::parse_filter;
use listingviz::OutputFormat;
use log::LevelFilter;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "listingviz")]
#[command(about = "Filter, aggregate and chart Airbnb listings", long_about = None)]
#[command(version)]
struct Cli {
    /// Listings CSV (defaults to the config value, then Airbnb_data.csv)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the dataset overview
    Home {
        /// Also copy the full dataset to this CSV file ("-" for stdout)
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Render the listing-count charts
    Insights(PageArgs),

    /// Render the price, availability and review charts
    Analysis(PageArgs),

    /// List the values each filter accepts
    Options {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the filtered listings as CSV
    Export {
        /// Destination file ("-" for stdout)
        #[arg(long)]
        out: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,
    },
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Keep only these countries (repeatable)
    #[arg(long = "country")]
    countries: Vec<String>,

    /// Keep only these property types (repeatable)
    #[arg(long = "property-type")]
    property_types: Vec<String>,

    /// Keep only these room types (repeatable)
    #[arg(long = "room-type")]
    room_types: Vec<String>,

    /// Lowest nightly price kept
    #[arg(long)]
    price_min: Option<f64>,

    /// Highest nightly price kept
    #[arg(long)]
    price_max: Option<f64>,

    /// Filter expression, e.g. 'country(Spain) | price(30, 80)'
    #[arg(long)]
    filter: Option<String>,
}

impl FilterArgs {
    fn flag_overrides(&self) -> FilterOverrides {
        let non_empty = |values: &Vec<String>| (!values.is_empty()).then(|| values.clone());
        FilterOverrides {
            countries: non_empty(&self.countries),
            property_types: non_empty(&self.property_types),
            room_types: non_empty(&self.room_types),
            price_min: self.price_min,
            price_max: self.price_max,
        }
    }
}

#[derive(Args, Debug)]
struct PageArgs {
    #[command(flatten)]
    filters: FilterArgs,

    /// Directory for chart files
    #[arg(long)]
    out: Option<PathBuf>,

    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Rows kept in the top-N bar charts
    #[arg(long)]
    top: Option<usize>,

    /// Print the aggregated views as JSON instead of rendering
    #[arg(long)]
    json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum FormatArg {
    Png,
    Svg,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Svg => OutputFormat::Svg,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::default(),
    };

    let data_path = cli.data.clone().unwrap_or_else(|| config.data.clone());
    let dataset = Dataset::from_path(&data_path)
        .with_context(|| format!("Failed to load listings from '{}'", data_path.display()))?;
    log::info!("Loaded {} listings from {}", dataset.len(), data_path.display());

    match cli.command {
        Command::Home { export } => run_home(&dataset, &data_path, export.as_deref()),
        Command::Insights(args) => run_page(&dataset, &config, Page::Insights, &args),
        Command::Analysis(args) => run_page(&dataset, &config, Page::Analysis, &args),
        Command::Options { json } => run_options(&dataset, json),
        Command::Export { out, filters } => run_export(&dataset, &filters, &out),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Start from "everything selected", apply the expression, then the flags
fn resolve_selection(dataset: &Dataset, filters: &FilterArgs) -> Result<FilterSelection> {
    let from_expr = match &filters.filter {
        Some(expr) => parse_filter(expr)?,
        None => FilterOverrides::default(),
    };
    let overrides = from_expr.merge(filters.flag_overrides());
    log::debug!("Filter overrides: {:?}", overrides);

    let selection = FilterSelection::all(dataset)
        .with_overrides(dataset, &overrides)
        .context("Invalid filter selection")?;
    log::debug!("Selection: {:?}", selection);
    Ok(selection)
}

fn run_home(dataset: &Dataset, source: &Path, export: Option<&Path>) -> Result<()> {
    let summary = Summary::of(dataset);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "Listings:       {}", summary.listings)?;
    writeln!(
        out,
        "Countries:      {} ({})",
        summary.countries.len(),
        summary.countries.join(", ")
    )?;
    writeln!(out, "Property types: {}", summary.property_types)?;
    writeln!(out, "Room types:     {}", summary.room_types.join(", "))?;
    writeln!(out, "Hosts:          {}", summary.hosts)?;
    if let Some(price) = summary.price {
        writeln!(out, "Price range:    {} - {}", price.min, price.max)?;
    }
    out.flush().context("Failed to flush stdout")?;
    drop(out);

    if let Some(path) = export {
        let bytes = copy_source(source, path)?;
        log::info!("Copied {} bytes of {} to {}", bytes, source.display(), path.display());
    }
    Ok(())
}

/// Hand the dataset file back unchanged, every column and byte included
fn copy_source(source: &Path, dest: &Path) -> Result<u64> {
    if dest == Path::new("-") {
        let mut file = File::open(source)
            .with_context(|| format!("Failed to open '{}'", source.display()))?;
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let bytes = io::copy(&mut file, &mut out).context("Failed to write CSV to stdout")?;
        out.flush().context("Failed to flush stdout")?;
        return Ok(bytes);
    }

    if let (Ok(a), Ok(b)) = (source.canonicalize(), dest.canonicalize()) {
        if a == b {
            anyhow::bail!("Refusing to export '{}' onto itself", source.display());
        }
    }
    std::fs::copy(source, dest).with_context(|| {
        format!("Failed to copy '{}' to '{}'", source.display(), dest.display())
    })
}

fn run_page(dataset: &Dataset, config: &DashboardConfig, page: Page, args: &PageArgs) -> Result<()> {
    let selection = resolve_selection(dataset, &args.filters)?;
    let options = ViewOptions {
        top_n: args.top.unwrap_or(config.top_n),
    };
    let views = build_page(dataset, &selection, page, &options);

    if args.json {
        let json = serde_json::to_string_pretty(&views).context("Failed to serialize views")?;
        println!("{}", json);
        return Ok(());
    }

    let mut render = config.render.clone();
    if let Some(format) = args.format {
        render.format = format.into();
    }
    if let Some(width) = args.width {
        render.width = width;
    }
    if let Some(height) = args.height {
        render.height = height;
    }

    let out_dir = args.out.clone().unwrap_or_else(|| config.output_dir.clone());
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory '{}'", out_dir.display()))?;

    for chart in &views.charts {
        let bytes = render_chart(chart, &render)
            .with_context(|| format!("Failed to render chart '{}'", chart.id))?;
        let path = out_dir.join(format!(
            "{}_{}.{}",
            page.name(),
            chart.id,
            render.format.extension()
        ));
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        log::info!("Wrote {}", path.display());
        println!("{}", path.display());
    }

    Ok(())
}

fn run_options(dataset: &Dataset, json: bool) -> Result<()> {
    let facets = [
        ("country", CategoryField::Country),
        ("property_type", CategoryField::PropertyType),
        ("room_type", CategoryField::RoomType),
    ];

    if json {
        let mut map = serde_json::Map::new();
        for (name, field) in facets {
            map.insert(name.to_string(), serde_json::json!(dataset.distinct(field)));
        }
        map.insert("price".to_string(), serde_json::json!(dataset.price_bounds()));
        let json = serde_json::to_string_pretty(&map).context("Failed to serialize options")?;
        println!("{}", json);
        return Ok(());
    }

    for (name, field) in facets {
        println!("{}:", name);
        for value in dataset.distinct(field) {
            println!("  {}", value);
        }
    }
    if let Some(price) = dataset.price_bounds() {
        println!("price: {} - {}", price.min, price.max);
    }
    Ok(())
}

fn run_export(dataset: &Dataset, filters: &FilterArgs, out: &Path) -> Result<()> {
    let selection = resolve_selection(dataset, filters)?;
    let rows = selection.apply(dataset);
    let written = write_listings(out, rows)?;
    log::info!("Exported {} of {} listings to {}", written, dataset.len(), out.display());
    Ok(())
}

fn write_listings<'a, I>(path: &Path, rows: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a Listing>,
{
    if path == Path::new("-") {
        let stdout = io::stdout();
        return write_csv(stdout.lock(), rows).context("Failed to write CSV to stdout");
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create '{}'", path.display()))?;
    write_csv(file, rows).with_context(|| format!("Failed to write '{}'", path.display()))
}
