use crate::cli::{Cli, OutputFormat};
use crate::commands::{select, CommandError, Result};
use crate::output::{persist, summary, table};
use indicatif::{ProgressBar, ProgressStyle};
use multisplunk_core::{
    normalize, AggregateReport, DispatchConfig, Dispatcher, EndpointDescriptor, FanoutConfig,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

/// Run the query everywhere. Returns `true` when any instance failed.
pub async fn run(cli: &Cli) -> Result<bool> {
    let config = FanoutConfig::load(&cli.config)?;
    info!(
        instances = config.instances.len(),
        "Loaded configuration from {}",
        cli.config.display()
    );

    let raw = read_query(cli.query.as_deref(), cli.query_file.as_deref())?;
    let query = normalize(&raw);

    let wanted = if cli.ask_clients {
        select::prompt(&config.instances)?
    } else if cli.clients.is_empty() {
        None
    } else {
        Some(cli.clients.clone())
    };
    let endpoints = choose_endpoints(&config, wanted.as_deref())?;

    let dispatch = DispatchConfig::default()
        .with_concurrency_limit(cli.parallel)
        .with_call_timeout(Duration::from_secs(cli.timeout));
    let dispatcher = Dispatcher::new(dispatch)?;

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!(
        "Querying {} instance(s), {} at a time...",
        endpoints.len(),
        dispatcher.concurrency_limit()
    ));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let report = dispatcher.run(&endpoints, &query).await;
    spinner.finish_and_clear();

    let unsaved = save_results(&report, &cli.outdir, cli.format);
    for (name, rows) in &report.successes {
        println!();
        println!("{}", table::render_preview(name, rows, cli.preview));
    }

    println!();
    println!(
        "{}",
        summary::render_summary(&report, &unsaved, &absolute_dir(&cli.outdir))
    );

    Ok(report.has_failures() || !unsaved.is_empty())
}

/// Write every successful result set to `outdir`.
///
/// A failed write is logged and returned keyed by instance name; the
/// remaining instances are still written.
pub fn save_results(
    report: &AggregateReport,
    outdir: &Path,
    format: OutputFormat,
) -> BTreeMap<String, String> {
    let mut unsaved = BTreeMap::new();
    for (name, rows) in &report.successes {
        match persist::write_rows(outdir, name, rows, format) {
            Ok(path) => {
                info!(endpoint = %name, rows = rows.len(), "[{}] Saved {}", name, path.display())
            }
            Err(e) => {
                error!(endpoint = %name, "[{}] Could not save results: {}", name, e);
                unsaved.insert(name.clone(), e.to_string());
            }
        }
    }
    unsaved
}

fn absolute_dir(dir: &Path) -> PathBuf {
    std::fs::canonicalize(dir)
        .or_else(|_| std::env::current_dir().map(|cwd| cwd.join(dir)))
        .unwrap_or_else(|_| dir.to_path_buf())
}

/// The file wins when both a file and inline text are given.
///
/// File contents are used as-is, so a blank file runs as a bare `search`.
/// An empty inline query counts as no query at all.
pub fn read_query(inline: Option<&str>, file: Option<&Path>) -> Result<String> {
    match (file, inline) {
        (Some(path), _) => std::fs::read_to_string(path).map_err(|source| CommandError::QueryFile {
            path: path.to_path_buf(),
            source,
        }),
        (None, Some(text)) if !text.is_empty() => Ok(text.to_string()),
        (None, _) => Err(CommandError::EmptyQuery),
    }
}

/// All instances when `wanted` is `None`, otherwise the named subset.
pub fn choose_endpoints(
    config: &FanoutConfig,
    wanted: Option<&[String]>,
) -> Result<Vec<EndpointDescriptor>> {
    let endpoints = match wanted {
        None => config.instances.clone(),
        Some(names) => {
            let selection = config.select(names);
            for name in &selection.unknown {
                warn!("Unknown instance '{}' ignored", name);
            }
            selection.endpoints
        }
    };
    if endpoints.is_empty() {
        return Err(CommandError::NoInstances);
    }
    Ok(endpoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONFIG: &str = "instances:\n  - {name: prod, host: a, token: t}\n  - {name: lab, host: b, token: t}\n";

    #[test]
    fn test_query_file_wins() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "index=main | stats count").unwrap();
        let raw = read_query(Some("ignored"), Some(file.path())).unwrap();
        assert_eq!(raw.trim(), "index=main | stats count");

        assert_eq!(read_query(Some("index=x"), None).unwrap(), "index=x");
    }

    #[test]
    fn test_blank_query_file_runs_as_bare_search() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "  \n").unwrap();
        let raw = read_query(None, Some(file.path())).unwrap();
        assert_eq!(normalize(&raw).as_str(), "search ");
    }

    #[test]
    fn test_missing_query_rejected() {
        assert!(matches!(read_query(Some(""), None), Err(CommandError::EmptyQuery)));
        assert!(matches!(read_query(None, None), Err(CommandError::EmptyQuery)));
        assert!(matches!(
            read_query(None, Some(Path::new("/no/such/query.spl"))),
            Err(CommandError::QueryFile { .. })
        ));
    }

    #[test]
    fn test_choose_endpoints() {
        let config = FanoutConfig::from_yaml_str(CONFIG).unwrap();
        assert_eq!(choose_endpoints(&config, None).unwrap().len(), 2);

        let names = vec!["lab".to_string(), "nope".to_string()];
        let picked = choose_endpoints(&config, Some(names.as_slice())).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "lab");

        assert!(matches!(
            choose_endpoints(&config, Some(&names[1..])),
            Err(CommandError::NoInstances)
        ));
        assert!(matches!(
            choose_endpoints(&config, Some(&names[..0])),
            Err(CommandError::NoInstances)
        ));
    }

    #[test]
    fn test_failed_write_does_not_stop_the_others() {
        let aggregator = multisplunk_core::Aggregator::new();
        let mut row = multisplunk_core::Record::new();
        row.insert("host".into(), serde_json::json!("web-01"));
        aggregator.record("blocked", multisplunk_core::ExecutionOutcome::success(vec![row.clone()]));
        aggregator.record("healthy", multisplunk_core::ExecutionOutcome::success(vec![row]));
        let report = aggregator.finalize();

        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should go makes that one write fail.
        std::fs::create_dir(dir.path().join("blocked.json")).unwrap();

        let unsaved = save_results(&report, dir.path(), OutputFormat::Json);

        assert_eq!(unsaved.len(), 1);
        assert!(unsaved.contains_key("blocked"));
        let saved = std::fs::read_to_string(dir.path().join("healthy.json")).unwrap();
        assert!(saved.contains("web-01"));
    }

    #[test]
    fn test_no_configured_instances() {
        let config = FanoutConfig::default();
        assert!(matches!(choose_endpoints(&config, None), Err(CommandError::NoInstances)));
    }
}
