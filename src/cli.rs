//! The `mdq` command line: flags, the filtering run and its output.

use crate::query::coerce::{parse_date, parse_duration};
use crate::query::{self, DateRange, Evaluator, Expr};
use crate::types::TypeCheck;
use crate::{values, vault, Note};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{ArgAction, Parser, ValueEnum};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "mdq", version, about = "Filter markdown notes by frontmatter queries")]
pub struct Cli {
    #[arg(long, env = "MDQ_VAULT", help = "Vault root directory")]
    vault: Option<PathBuf>,

    #[arg(long, help = "Read file paths from stdin")]
    stdin: bool,

    #[arg(long = "ignore", value_name = "GLOB", help = "Skip files matching GLOB (repeatable)")]
    ignore: Vec<String>,

    #[arg(long, help = "List unique values for a property")]
    values: Option<String>,

    #[arg(long, help = "Show count for each value (use with --values)")]
    count: bool,

    #[arg(
        long = "check",
        value_name = "FIELD:TYPE",
        help = "Keep notes whose FIELD has TYPE: string, number, boolean, date, array, null"
    )]
    checks: Vec<TypeCheck>,

    #[arg(long, value_name = "FIELD", help = "Date field for --from/--to/--within")]
    date_field: Option<String>,

    #[arg(long, value_name = "DATE", requires = "date_field", value_parser = parse_date)]
    from: Option<DateTime<Utc>>,

    #[arg(long, value_name = "DATE", requires = "date_field", value_parser = parse_date)]
    to: Option<DateTime<Utc>>,

    #[arg(
        long,
        value_name = "DURATION",
        requires = "date_field",
        value_parser = parse_duration,
        help = "Keep notes dated within DURATION of now, either side"
    )]
    within: Option<Duration>,

    #[arg(long, help = "Evaluate function calls used as comparison values")]
    resolve_functions: bool,

    #[arg(long, help = "Print the parsed query and exit")]
    explain: bool,

    #[arg(long, value_enum, default_value_t = Format::Paths)]
    format: Format,

    #[arg(short, long, action = ArgAction::Count, help = "More logging (-v, -vv, -vvv)")]
    pub verbose: u8,

    #[arg(help = "Query, e.g. status = \"draft\" AND priority > 3")]
    query: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
    Paths,
    Yaml,
}

#[derive(Serialize)]
struct MatchRecord<'a> {
    path: String,
    fields: &'a serde_yaml::Mapping,
}

/// Exit status for a finished run: 0 when something was printed, 1 when
/// nothing matched, 2 on any error.
pub fn exit_status(result: &Result<bool>) -> u8 {
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(_) => 2,
    }
}

/// Runs one invocation, writing results to `out`. `Ok(true)` when something
/// was printed.
pub fn run(cli: Cli, out: &mut impl Write) -> Result<bool> {
    let expr = cli
        .query
        .as_deref()
        .map(query::parse)
        .transpose()
        .context("Query error")?;

    if cli.explain {
        let Some(expr) = expr else {
            bail!("--explain needs a query");
        };
        writeln!(out, "{}", expr)?;
        return Ok(true);
    }

    let files = if cli.stdin {
        vault::read_paths_from_stdin()?
    } else {
        let Some(vault_path) = cli.vault.as_deref() else {
            bail!("No vault path specified. Use --vault or set MDQ_VAULT");
        };
        vault::collect_markdown_files(vault_path, &cli.ignore)?
    };
    let notes = load_notes(files);

    if let Some(property) = &cli.values {
        return run_values_mode(&notes, property, cli.count, out);
    }

    let range = cli.date_field.as_ref().map(|field| DateRange {
        field: field.clone(),
        from: cli.from,
        to: cli.to,
        within: cli.within,
    });
    if expr.is_none() && cli.checks.is_empty() && range.is_none() {
        bail!("No query provided");
    }

    let evaluator = Evaluator::new().resolve_functions(cli.resolve_functions);
    let matched: Vec<&Note> = notes
        .iter()
        .filter(|note| keep(note, expr.as_ref(), &evaluator, &cli.checks, range.as_ref()))
        .collect();
    tracing::info!(matched = matched.len(), scanned = notes.len(), "query finished");

    print_matches(&matched, cli.vault.as_deref(), cli.format, out)?;
    Ok(!matched.is_empty())
}

fn load_notes(files: Vec<PathBuf>) -> Vec<Note> {
    files
        .into_iter()
        .filter_map(|path| match Note::load(&path) {
            Ok(Some(note)) => Some(note),
            Ok(None) => {
                tracing::debug!(path = %path.display(), "no frontmatter");
                None
            }
            Err(err) => {
                tracing::warn!("{}", err);
                None
            }
        })
        .collect()
}

/// A note is kept when the query, every type check and the date range all
/// accept it. Absent filters accept everything.
fn keep(
    note: &Note,
    expr: Option<&Expr>,
    evaluator: &Evaluator,
    checks: &[TypeCheck],
    range: Option<&DateRange>,
) -> bool {
    expr.map_or(true, |e| evaluator.evaluate(e, note))
        && checks.iter().all(|check| check.matches(note))
        && range.map_or(true, |r| r.matches(note, evaluator.now()))
}

fn run_values_mode(
    notes: &[Note],
    property: &str,
    show_count: bool,
    out: &mut impl Write,
) -> Result<bool> {
    let counts = values::collect_values(notes, property);

    if counts.is_empty() {
        return Ok(false);
    }

    for line in values::format_values(counts, show_count) {
        writeln!(out, "{}", line)?;
    }
    Ok(true)
}

fn print_matches(
    matched: &[&Note],
    vault_path: Option<&Path>,
    format: Format,
    out: &mut impl Write,
) -> Result<()> {
    let display = |path: &Path| {
        vault_path
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path)
            .display()
            .to_string()
    };

    match format {
        Format::Paths => {
            for note in matched {
                writeln!(out, "{}", display(&note.path))?;
            }
        }
        Format::Yaml => {
            if matched.is_empty() {
                return Ok(());
            }
            let records: Vec<MatchRecord> = matched
                .iter()
                .map(|note| MatchRecord {
                    path: display(&note.path),
                    fields: &note.fields,
                })
                .collect();
            write!(out, "{}", serde_yaml::to_string(&records)?)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parse;
    use std::path::Path;

    fn note(yaml: &str) -> Note {
        Note::from_content(Path::new("n.md"), &format!("---\n{}\n---\n", yaml))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_keep_requires_every_filter() {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let fresh = note(&format!("status: draft\npriority: 4\ncreated: {}", today));
        let stale = note("status: draft\npriority: four\ncreated: 2001-01-01");

        let evaluator = Evaluator::new();
        let expr = parse(r#"status = "draft""#).unwrap();
        let checks: Vec<TypeCheck> = vec!["priority:number".parse().unwrap()];
        let range = DateRange::new("created").within(Duration::days(2));

        assert!(keep(&fresh, Some(&expr), &evaluator, &checks, Some(&range)));
        assert!(keep(&stale, Some(&expr), &evaluator, &[], None));
        assert!(!keep(&stale, Some(&expr), &evaluator, &checks, None));
        assert!(!keep(&stale, Some(&expr), &evaluator, &[], Some(&range)));
        assert!(keep(&stale, None, &evaluator, &[], None));
    }

    #[test]
    fn test_exit_status() {
        assert_eq!(exit_status(&Ok(true)), 0);
        assert_eq!(exit_status(&Ok(false)), 1);
        assert_eq!(exit_status(&Err(anyhow::anyhow!("boom"))), 2);
    }
}
