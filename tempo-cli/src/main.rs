mod cli;
mod config;
mod data_file;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Commands, ReportArgs};
use config::TempoConfig;
use data_file::DataFile;
use strum::IntoEnumIterator;
use tempo_core::{
    aggregate::aggregate,
    clock::{Clock, SystemClock},
    dashboard::{frames_to_archive, project_statuses, StatusWindow, OVERALL_LABEL},
    domain::{DateRange, DisplayOptions, ProjectId, ReportConfiguration},
    hierarchy::ProjectIndex,
    import::{self, ImportOptions},
    render::render_html,
    store::{FrameFilter, FrameStore},
    timespan,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Logs go to stderr so report HTML on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tempo=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = TempoConfig::load()?;
    let data_path = match cli.data {
        Some(path) => path,
        None => config.data_path()?,
    };

    match cli.command {
        Commands::Import { format, file } => {
            let mut data = DataFile::open(data_path)?;
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let existing = data.store.all_projects()?;
            let options = ImportOptions {
                utc_offset: config.offset()?,
            };
            let outcome = import::import(format, &source, &existing, &options)
                .with_context(|| format!("Failed to import {} as {}", file.display(), format))?;

            let inserted = import::apply(&outcome, &mut data.store)?;
            data.save()?;

            for project in &outcome.created_projects {
                println!("Created project {}", project.name);
            }
            for error in &outcome.errors {
                eprintln!("Skipped {}", error);
            }
            println!("Imported {} frames into {}", inserted, data.path().display());
        }
        Commands::Report(args) => {
            let data = DataFile::open(data_path)?;
            let html = report(&data, &config, args.output.is_some(), &args)?;
            match &args.output {
                Some(path) => std::fs::write(path, html)
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => print!("{}", html),
            }
        }
        Commands::Status => {
            let data = DataFile::open(data_path)?;
            print_status(&data, &config)?;
        }
        Commands::Projects => {
            let data = DataFile::open(data_path)?;
            let index = ProjectIndex::build(data.store.projects())?;
            let mut names: Vec<String> = index
                .projects()
                .map(|project| index.display_name(&project.id))
                .collect();
            names.sort();
            for name in names {
                println!("{}", name);
            }
        }
        Commands::Rate { project, rate } => {
            let mut data = DataFile::open(data_path)?;
            let index = ProjectIndex::build(data.store.projects())?;
            let id = find_project(&index, &project)?;
            let mut updated = index
                .get(&id)
                .cloned()
                .with_context(|| format!("Project {} disappeared", id))?;
            let message = match &rate {
                Some(rate) => format!("{} now bills {} per hour", index.display_name(&id), rate),
                None => format!("{} is no longer billed", index.display_name(&id)),
            };
            updated.hourly_rate = rate;
            data.store.upsert_project(updated)?;
            data.save()?;
            println!("{}", message);
        }
        Commands::Archive {
            project,
            subprojects,
        } => {
            let mut data = DataFile::open(data_path)?;
            let index = ProjectIndex::build(data.store.projects())?;
            let id = find_project(&index, &project)?;
            let ids = frames_to_archive(data.store.frames(), &id, subprojects, &index);
            let archived = data.store.archive(&ids);
            data.save()?;
            println!("Archived {} frames of {}", archived, index.display_name(&id));
        }
        Commands::ConfigPath => {
            let path = TempoConfig::config_path()?;
            if !path.exists() {
                TempoConfig::default().save()?;
                println!("Created default config at: {}", path.display());
            } else {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}

fn report(
    data: &DataFile,
    config: &TempoConfig,
    to_file: bool,
    args: &ReportArgs,
) -> Result<String> {
    let offset = config.offset()?;
    let index = ProjectIndex::build(data.store.projects())?;

    let mut report_config = ReportConfiguration::new(args.split.clone())
        .with_archived(args.archived || config.include_archived)
        .with_rounding(args.round.unwrap_or(config.rounding))
        .with_template(args.template.clone().unwrap_or_else(|| config.template.clone()))
        .with_utc_offset(offset)
        .with_now(SystemClock.now())
        .with_display(DisplayOptions {
            show_summary: args.summary,
            show_matrix_tables: args.matrix,
            show_sales: args.sales,
            show_tracked_average: args.averages,
            show_untracked_average: args.averages,
            show_empty_groups: args.show_empty,
        });

    if let Some(name) = &args.project {
        report_config = report_config.for_project(find_project(&index, name)?, args.subprojects);
    }
    if let (Some(from), Some(to)) = (args.from, args.to) {
        report_config = report_config.with_date_range(DateRange::days(from, to, offset)?);
    }
    if let Some(title) = &args.title {
        report_config = report_config.with_title(title);
    }
    if let Some(description) = &args.description {
        report_config = report_config.with_description(description);
    }

    let filter = FrameFilter::default().with_archived(report_config.include_archived);
    let frames = data.store.frames_matching(&filter)?;
    let report = aggregate(&frames, &report_config, &index)?;
    if to_file {
        println!(
            "{} frames, {} tracked",
            report.root.frame_count,
            timespan::format_hm(report.total_duration())
        );
    }
    Ok(render_html(&report, &report_config)?)
}

/// Finds a project by full name ("Acme/Website") or, failing that, by its
/// own name when that is unambiguous.
fn find_project(index: &ProjectIndex, name: &str) -> Result<ProjectId> {
    if let Some(project) = index.projects().find(|p| index.display_name(&p.id) == name) {
        return Ok(project.id.clone());
    }
    let matches: Vec<&ProjectId> = index
        .projects()
        .filter(|p| p.name == name)
        .map(|p| &p.id)
        .collect();
    match matches.as_slice() {
        [id] => Ok((*id).clone()),
        [] => bail!("No project named '{}'", name),
        _ => bail!("Project name '{}' is ambiguous, use the full name", name),
    }
}

fn print_status(data: &DataFile, config: &TempoConfig) -> Result<()> {
    let frames = data.store.frames_matching(&FrameFilter::default().with_archived(true))?;
    let status = project_statuses(
        data.store.projects(),
        &frames,
        &SystemClock,
        config.offset()?,
        config.include_archived,
    )?;

    let width = status
        .projects
        .iter()
        .map(|p| p.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(OVERALL_LABEL.len());

    print!("{:width$}", "", width = width);
    for window in StatusWindow::iter() {
        print!("  {:>11}", window.to_string());
    }
    println!();

    for project in &status.projects {
        print!("{:width$}", project.name, width = width);
        for window in StatusWindow::iter() {
            let totals = project.totals(window);
            let cell = if totals.own == totals.total {
                timespan::format_short(totals.total)
            } else {
                format!(
                    "{} ({})",
                    timespan::format_short(totals.own),
                    timespan::format_hm(totals.total)
                )
            };
            print!("  {:>11}", cell);
        }
        println!();
    }

    print!("{:width$}", OVERALL_LABEL, width = width);
    for window in StatusWindow::iter() {
        print!("  {:>11}", timespan::format_short(status.overall(window)));
    }
    println!();

    if let Some(active) = &status.active {
        println!("\nRunning frame: {}", active);
    }
    Ok(())
}
