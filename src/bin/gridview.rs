/// Gridview command line
///
/// Loads a dataset file, applies filters, sort and paging from the command
/// line (and optionally a JSON file of commands), then prints the current
/// page or an export as JSON.

use anyhow::{bail, Context, Result};
use clap::Parser;
use gridview::{ExportOptions, Grid, GridCommand, LoadOptions, PageSize, SortOrder, TableOptions};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gridview", version, about = "Filter, sort and paginate a JSON dataset")]
struct Args {
    /// Dataset file: {"cols": {...}, "rows": [...]}
    #[arg(long, env = "GRIDVIEW_DATA")]
    data: PathBuf,

    /// Table options file (pageSize, types.date.utc, ...)
    #[arg(long, env = "GRIDVIEW_OPTIONS")]
    options: Option<PathBuf>,

    /// Column filter as column=expression, repeatable
    #[arg(long = "filter", value_name = "COLUMN=EXPR")]
    filters: Vec<String>,

    /// Sort column, with an optional :desc suffix
    #[arg(long, value_name = "COLUMN[:desc]")]
    sort: Option<String>,

    /// Rows per page, or "all"
    #[arg(long)]
    page_size: Option<PageSize>,

    /// 1-based page to show
    #[arg(long)]
    page: Option<usize>,

    /// JSON file with an array of commands to apply last
    #[arg(long)]
    commands: Option<PathBuf>,

    /// Print the dataset export instead of the current page
    #[arg(long)]
    export: bool,

    /// Export only the selected rows
    #[arg(long, requires = "export")]
    selected_only: bool,

    /// Export the filtered view instead of all rows
    #[arg(long, requires = "export")]
    filtered_only: bool,
}

fn read(path: &PathBuf) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn parse_sort(arg: &str) -> (&str, SortOrder) {
    match arg.rsplit_once(':') {
        Some((column, order)) if order.eq_ignore_ascii_case("desc") => (column, SortOrder::Descending),
        Some((column, order)) if order.eq_ignore_ascii_case("asc") => (column, SortOrder::Ascending),
        _ => (arg, SortOrder::Ascending),
    }
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let args = Args::parse();

    let options = match &args.options {
        Some(path) => TableOptions::from_json(&read(path)?).context("parsing options")?,
        None => TableOptions::default(),
    };
    let mut grid = Grid::new(options);
    grid.load_json(&read(&args.data)?, LoadOptions::default())
        .context("loading dataset")?;
    log::info!("Loaded {} rows from {}", grid.original_rows().len(), args.data.display());

    for filter in &args.filters {
        let Some((column, expression)) = filter.split_once('=') else {
            bail!("filter '{}' is not COLUMN=EXPR", filter);
        };
        grid.set_filter(column, expression)?;
    }
    if let Some(sort) = &args.sort {
        let (column, order) = parse_sort(sort);
        grid.set_sort(column, order)?;
    }
    if let Some(page_size) = args.page_size {
        grid.set_page_size(page_size);
    }
    if let Some(page) = args.page {
        if !grid.set_page(page) {
            log::warn!("Page {} is out of range (1..={})", page, grid.pager().total_pages());
        }
    }
    if let Some(path) = &args.commands {
        let commands: Vec<GridCommand> =
            serde_json::from_str(&read(path)?).context("parsing commands")?;
        for command in commands {
            grid.apply(command)?;
        }
    }

    let output = if args.export {
        serde_json::to_string_pretty(&grid.export_data(ExportOptions {
            selected_only: args.selected_only,
            filtered_only: args.filtered_only,
        }))?
    } else {
        let page = grid.current_view();
        log::info!("{}", page.summary());
        serde_json::to_string_pretty(&page)?
    };
    println!("{}", output);
    Ok(())
}
