//! Branch report CLI - formula evaluation and template calculation

use anyhow::{bail, Context, Result};
use branch_report::prelude::*;
use branch_report::{normalize_key, try_evaluate_formula, CalculatedRow, FormulaValidation};
use clap::{Parser, Subcommand};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "branch-report")]
#[command(author, version, about = "Evaluate and check branch report formulas")]
struct Cli {
    /// Log formula soft failures and other diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula against variable values
    Eval {
        /// Formula text, e.g. "(A - B) / A"
        formula: String,

        /// Variable value as KEY=VALUE (repeatable)
        #[arg(short = 'D', long = "var", value_parser = parse_var)]
        vars: Vec<(String, f64)>,

        /// Fail on malformed formulas instead of printing 0
        #[arg(long)]
        strict: bool,
    },

    /// Check that a formula only references known keys
    Validate {
        /// Formula text
        formula: String,

        /// Comma-separated list of available keys
        #[arg(short, long, value_delimiter = ',')]
        keys: Vec<String>,
    },

    /// Calculate every field of a template from entered values
    Calc {
        /// Template JSON file
        template: PathBuf,

        /// JSON object mapping field keys to entered values
        values: PathBuf,

        /// Output CSV instead of a table
        #[arg(long)]
        csv: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Round values to this many decimal places
        #[arg(short, long)]
        round: Option<u32>,

        /// Include section header rows
        #[arg(long)]
        sections: bool,

        /// Feed computed formula values into the formulas that read them
        #[arg(long)]
        recompute: bool,
    },

    /// Print the seeded "Monthly Report" template as JSON
    Seed,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let text = match cli.command {
        Commands::Eval {
            formula,
            vars,
            strict,
        } => eval(&formula, &vars, strict)?,
        Commands::Validate { formula, keys } => validate(&formula, &keys)?,
        Commands::Calc {
            template,
            values,
            csv,
            output,
            round,
            sections,
            recompute,
        } => {
            let options = CalculationOptions {
                include_sections: sections,
                recompute_formula_inputs: recompute,
                round_to: round,
            };
            let text = calc(&template, &values, &options, csv)?;
            if let Some(path) = output {
                std::fs::write(&path, &text)
                    .with_context(|| format!("Failed to write '{}'", path.display()))?;
                eprintln!("Wrote '{}'", path.display());
                return Ok(());
            }
            text
        }
        Commands::Seed => serde_json::to_string_pretty(&ReportTemplate::monthly_report())
            .context("Failed to serialize template")?,
    };

    let mut stdout = io::stdout();
    writeln!(stdout, "{}", text.trim_end()).context("Failed to write to stdout")?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("BRANCH_REPORT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Parse a `KEY=VALUE` argument
fn parse_var(arg: &str) -> std::result::Result<(String, f64), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{arg}'"))?;
    let key = normalize_key(key).map_err(|e| e.to_string())?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for {key}: {e}"))?;
    Ok((key, value))
}

fn eval(formula: &str, vars: &[(String, f64)], strict: bool) -> Result<String> {
    let values: HashMap<String, f64> = vars.iter().cloned().collect();
    let value = if strict {
        try_evaluate_formula(formula, &values)
            .with_context(|| format!("Failed to evaluate '{formula}'"))?
    } else {
        evaluate_formula(formula, &values)
    };
    Ok(format_number(value))
}

fn validate(formula: &str, keys: &[String]) -> Result<String> {
    let keys: BTreeSet<String> = keys.iter().map(|k| k.trim().to_string()).collect();
    let verdict = FormulaValidation::from(validate_formula_variables(formula, &keys));
    match verdict.error {
        None => Ok("valid".to_string()),
        Some(error) => bail!(error),
    }
}

fn calc(
    template_path: &Path,
    values_path: &Path,
    options: &CalculationOptions,
    csv: bool,
) -> Result<String> {
    let template: ReportTemplate = read_json(template_path)?;
    template
        .check()
        .with_context(|| format!("Invalid template '{}'", template_path.display()))?;
    let values: BTreeMap<String, f64> = read_json(values_path)?;

    let mut entry = Entry::new("cli", "cli");
    for (key, value) in &values {
        match template.field_by_key(key) {
            Some(field) => entry.set_value(field.id.clone(), *value)?,
            None => tracing::warn!(key = %key, "value for unknown key ignored"),
        }
    }

    let calculated = entry.calculate_with_options(&template, options);
    if csv {
        rows_to_csv(&calculated.rows)
    } else {
        Ok(rows_to_table(&calculated.rows))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to open '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse '{}'", path.display()))
}

fn rows_to_csv(rows: &[CalculatedRow]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Label", "Key", "Formula", "Value"])?;
    for row in rows {
        writer.write_record([
            row.label.as_str(),
            row.key.as_deref().unwrap_or(""),
            row.formula.as_deref().unwrap_or(""),
            &row.value.map(format_number).unwrap_or_default(),
        ])?;
    }
    let bytes = writer.into_inner().context("Failed to flush CSV")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

fn rows_to_table(rows: &[CalculatedRow]) -> String {
    let width = rows.iter().map(|r| r.label.len()).max().unwrap_or(0);
    let mut out = String::new();
    for row in rows {
        match row.value {
            None => out.push_str(&format!("[{}]\n", row.label)),
            Some(value) => {
                let marker = if row.soft_failed { "  (formula error)" } else { "" };
                out.push_str(&format!(
                    "{:width$}  {:>12}{}\n",
                    row.label,
                    format_number(value),
                    marker
                ));
            }
        }
    }
    out
}

/// Format a value without a trailing `.0` for whole numbers
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
