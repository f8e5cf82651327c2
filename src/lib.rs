pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod filter;
pub mod options;
pub mod parser;
pub mod render;
pub mod state;
pub mod table;

use std::{env, io::Write, path::Path, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{Cli, Commands, SourceArgs},
    config::Config,
    error::ViewError,
    fetch::Source,
    parser::RecordSet,
    render::HtmlView,
    state::{Session, StateObserver, ViewState},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("lens_compare", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Render(args) => handle_render(&args),
        Commands::Compare(args) => handle_compare(&args),
        Commands::Options(args) => handle_options(&args),
        Commands::Preview(args) => handle_preview(&args),
        Commands::Export(args) => handle_export(&args),
        Commands::InitConfig(args) => write_default_config(&args.path, args.force),
    }
}

pub fn resolve_source(args: &SourceArgs, config: &Config) -> Source {
    match &args.input {
        Some(path) => Source::Path(path.clone()),
        None => Source::Url(config.source_url.clone()),
    }
}

/// Runs one load cycle: fetch, parse, and hand the result to a new session
/// with `observers` already subscribed.
pub fn load_session(
    args: &SourceArgs,
    config: &Config,
    observers: Vec<Box<dyn StateObserver>>,
) -> Result<Session> {
    let encoding = fetch::resolve_encoding(args.input_encoding.as_deref())?;
    let source = resolve_source(args, config);
    let mut session = Session::new(config.fields.key.clone());
    for observer in observers {
        session.subscribe(observer);
    }

    let result = fetch::load(&source, encoding).map(|text| {
        let outcome = parser::parse(&text, config.policy);
        if !outcome.rejected.is_empty() {
            warn!(
                "Dropped {} malformed row(s) from {}",
                outcome.rejected.len(),
                source.describe()
            );
        }
        warn_missing_columns(&outcome.set, config);
        outcome.set
    });
    if let Some(notice) = session.finish_load(result) {
        warn!("{notice}");
    }
    Ok(session)
}

fn warn_missing_columns(set: &RecordSet, config: &Config) {
    if set.headers.is_empty() {
        return;
    }
    let fields = &config.fields;
    for name in [&fields.key, &fields.category, &fields.size]
        .into_iter()
        .chain(config.compare_rows.iter())
    {
        if !set.has_field(name) {
            warn!("Column '{name}' is not present in the export header");
        }
    }
}

fn loaded_set(session: &Session) -> Result<&RecordSet> {
    match session.state() {
        ViewState::Error { message } => Err(anyhow!("{message}")),
        state => state
            .full()
            .map(|full| &**full)
            .ok_or_else(|| anyhow!(ViewError::NotLoaded)),
    }
}

fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    let mut writer = export::open_output(path)?;
    writer
        .write_all(contents.as_bytes())
        .context("Writing output")?;
    writer.flush()?;
    if let Some(path) = path.filter(|p| !fetch::is_dash(p)) {
        info!("Wrote {}", path.display());
    }
    Ok(())
}

fn apply_cli_filters(session: &mut Session, filters: &[String]) -> Result<()> {
    if filters.is_empty() {
        return Ok(());
    }
    let criteria = filter::parse_filters(filters)?;
    if let Ok(set) = loaded_set(session) {
        for criterion in criteria.active() {
            if !set.has_field(&criterion.field) {
                warn!("Filter field '{}' is not a column of the export", criterion.field);
            }
        }
    }
    session.apply_filters(criteria)?;
    info!("{} record(s) match the filters", session.state().active().len());
    Ok(())
}

fn apply_cli_selection(session: &mut Session, keys: &[String]) -> Result<()> {
    session.compare(keys)?;
    let found = session.state().active().len();
    let requested = keys.iter().filter(|k| !k.trim().is_empty()).count();
    if found < requested {
        warn!("Only {found} of {requested} selected key(s) matched a row");
    }
    Ok(())
}

fn handle_render(args: &cli::RenderArgs) -> Result<()> {
    let config = Config::resolve(&args.source)?;
    let view = HtmlView::new(config.clone());
    let body = view.handle();
    let mut session = load_session(&args.source, &config, vec![Box::new(view)])?;
    let failed = loaded_set(&session).err();
    if failed.is_none() {
        apply_cli_filters(&mut session, &args.filters)?;
    }

    let page = render::render_page(&args.title, &body.borrow());
    write_output(args.output.as_deref(), &page)?;
    match failed {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn handle_compare(args: &cli::CompareArgs) -> Result<()> {
    let config = Config::resolve(&args.source)?;
    let view = HtmlView::new(config.clone());
    let body = view.handle();
    let mut session = load_session(&args.source, &config, vec![Box::new(view)])?;
    loaded_set(&session)?;
    apply_cli_selection(&mut session, &args.select)?;

    let page = render::render_page(&args.title, &body.borrow());
    write_output(args.output.as_deref(), &page)
}

fn handle_options(args: &cli::OptionsArgs) -> Result<()> {
    let config = Config::resolve(&args.source)?;
    let session = load_session(&args.source, &config, Vec::new())?;
    let set = loaded_set(&session)?;
    let fields = if args.fields.is_empty() {
        config.filter_fields()
    } else {
        args.fields.clone()
    };
    debug!("Deriving options for {:?}", fields);
    let options = options::derive_filter_options(
        &set.records,
        &fields,
        Some(config.fields.size.as_str()),
    );

    if args.json {
        let rendered = serde_json::to_string_pretty(&options).context("Serializing options")?;
        println!("{rendered}");
        return Ok(());
    }
    let rows = fields
        .iter()
        .flat_map(|field| {
            options
                .get(field)
                .into_iter()
                .flatten()
                .map(move |value| vec![field.clone(), value.clone()])
        })
        .collect::<Vec<_>>();
    table::print_table(&["field".to_string(), "value".to_string()], &rows);
    Ok(())
}

fn handle_preview(args: &cli::PreviewArgs) -> Result<()> {
    let config = Config::resolve(&args.source)?;
    let mut session = load_session(&args.source, &config, Vec::new())?;
    let headers = loaded_set(&session)?.unique_headers();
    apply_cli_filters(&mut session, &args.filters)?;

    let active = session.state().active();
    let shown = &active[..active.len().min(args.limit)];
    table::print_table(&headers, &table::record_rows(&headers, shown));
    info!("Displayed {} of {} row(s)", shown.len(), active.len());
    Ok(())
}

fn handle_export(args: &cli::ExportArgs) -> Result<()> {
    let config = Config::resolve(&args.source)?;
    let mut session = load_session(&args.source, &config, Vec::new())?;
    let headers = loaded_set(&session)?.unique_headers();
    if args.select.is_empty() {
        apply_cli_filters(&mut session, &args.filters)?;
    } else {
        apply_cli_selection(&mut session, &args.select)?;
    }

    let records = session.state().active();
    let writer = export::open_output(args.output.as_deref())?;
    export::write_records(writer, args.format, &headers, records)?;
    info!("Exported {} row(s)", records.len());
    Ok(())
}

/// Writes the built-in configuration as a starting point for `--config`.
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow!(
            "Refusing to overwrite existing file {path:?} (use --force)"
        ));
    }
    Config::default().save(path)?;
    info!("Default configuration written to {path:?}");
    Ok(())
}
