//! GBM command implementation
//!
//! Simulates an ensemble of geometric Brownian motion price paths and writes
//! the full matrix (CSV/JSON) or a per-path summary table.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use sim_engine::{GbmParams, GbmSimulator, PriceMatrix};
use tracing::info;

use super::OutputFormat;
use crate::config::{CliConfig, GbmOverrides};
use crate::Result;

/// Arguments for `mcsim gbm`
#[derive(Args, Debug, Clone)]
pub struct GbmArgs {
    /// Initial price S₀
    #[arg(long, allow_negative_numbers = true)]
    pub spot: Option<f64>,

    /// Annualised drift μ
    #[arg(long, allow_negative_numbers = true)]
    pub drift: Option<f64>,

    /// Annualised volatility σ
    #[arg(long, allow_negative_numbers = true)]
    pub volatility: Option<f64>,

    /// Time horizon T in years
    #[arg(long, allow_negative_numbers = true)]
    pub horizon: Option<f64>,

    /// Time step dt in years
    #[arg(long, allow_negative_numbers = true)]
    pub dt: Option<f64>,

    /// Number of paths (10 to 5,000)
    #[arg(short = 'n', long)]
    pub paths: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Paths shown in table output
    #[arg(long, default_value_t = 10)]
    pub preview: usize,
}

impl GbmArgs {
    fn overrides(&self) -> GbmOverrides {
        GbmOverrides {
            spot: self.spot,
            drift: self.drift,
            volatility: self.volatility,
            horizon: self.horizon,
            dt: self.dt,
            n_paths: self.paths,
        }
    }
}

/// JSON document for a simulated ensemble
#[derive(Serialize)]
struct MatrixReport<'a> {
    params: GbmParams,
    seed: u64,
    n_paths: usize,
    n_steps: usize,
    paths: Vec<&'a [f64]>,
}

/// Run the gbm command
pub fn run(config: &CliConfig, args: &GbmArgs, out: &mut impl Write) -> Result<()> {
    let settings = config.gbm.with_overrides(&args.overrides());
    settings.validate()?;

    let simulator = GbmSimulator::new(settings.params, settings.n_paths)?;
    let mut rng = config.rng();
    let seed = rng.seed();

    info!("Starting GBM simulation...");
    info!("  Paths: {}", simulator.n_paths());
    info!("  Steps: {}", simulator.n_steps());
    info!("  Params: {:?}", settings.params);
    info!("  Seed: {}", seed);

    let matrix = simulator.simulate(&mut rng)?;
    info!("GBM simulation complete");

    match &args.output {
        Some(path) => {
            let mut file = BufWriter::new(File::create(path)?);
            write_matrix(&matrix, &settings.params, seed, args, &mut file)?;
            file.flush()?;
            info!("Paths written to {}", path.display());
        }
        None => write_matrix(&matrix, &settings.params, seed, args, out)?,
    }

    Ok(())
}

fn write_matrix(
    matrix: &PriceMatrix,
    params: &GbmParams,
    seed: u64,
    args: &GbmArgs,
    out: &mut impl Write,
) -> Result<()> {
    match args.format {
        OutputFormat::Csv => write_csv(matrix, out),
        OutputFormat::Json => {
            let report = MatrixReport {
                params: *params,
                seed,
                n_paths: matrix.n_paths(),
                n_steps: matrix.n_steps(),
                paths: matrix.paths().collect(),
            };
            serde_json::to_writer(&mut *out, &report)?;
            writeln!(out)?;
            Ok(())
        }
        OutputFormat::Table => write_table(matrix, params, seed, args.preview, out),
    }
}

/// One row per path: `path,step_0,step_1,...`
fn write_csv(matrix: &PriceMatrix, out: &mut impl Write) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let header = std::iter::once("path".to_string())
        .chain((0..matrix.n_steps()).map(|step| format!("step_{}", step)));
    writer.write_record(header)?;

    for (index, path) in matrix.paths().enumerate() {
        let record =
            std::iter::once(index.to_string()).chain(path.iter().map(|price| price.to_string()));
        writer.write_record(record)?;
    }

    writer.flush()?;
    Ok(())
}

fn write_table(
    matrix: &PriceMatrix,
    params: &GbmParams,
    seed: u64,
    preview: usize,
    out: &mut impl Write,
) -> Result<()> {
    let terminal = matrix.terminal_prices();
    let mean_terminal = terminal.iter().sum::<f64>() / terminal.len() as f64;

    writeln!(
        out,
        "Simulated {} paths x {} steps (dt = {}, seed = {})",
        matrix.n_paths(),
        matrix.n_steps(),
        params.dt,
        seed
    )?;
    writeln!(out, "Mean terminal price: {:.4}", mean_terminal)?;

    writeln!(out, "\n┌────────┬────────────┬────────────┬────────────┬────────────┐")?;
    writeln!(out, "│ Path   │ Start      │ Min        │ Max        │ Terminal   │")?;
    writeln!(out, "├────────┼────────────┼────────────┼────────────┼────────────┤")?;
    for (index, path) in matrix.paths().take(preview).enumerate() {
        let min = path.iter().copied().fold(f64::INFINITY, f64::min);
        let max = path.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        writeln!(
            out,
            "│ {:<6} │ {:>10.4} │ {:>10.4} │ {:>10.4} │ {:>10.4} │",
            index,
            path[0],
            min,
            max,
            path[path.len() - 1]
        )?;
    }
    writeln!(out, "└────────┴────────────┴────────────┴────────────┴────────────┘")?;

    let hidden = matrix.n_paths().saturating_sub(preview);
    if hidden > 0 {
        writeln!(out, "  ... {} more paths", hidden)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CliError;
    use clap::Parser;

    #[derive(Parser)]
    struct GbmCommand {
        #[command(flatten)]
        args: GbmArgs,
    }

    fn seeded_config(seed: u64) -> CliConfig {
        CliConfig {
            seed: Some(seed),
            ..Default::default()
        }
    }

    /// 12 paths of 10 steps
    fn small_args(format: OutputFormat) -> GbmArgs {
        GbmArgs {
            spot: Some(100.0),
            drift: Some(0.05),
            volatility: Some(0.2),
            horizon: Some(1.0),
            dt: Some(0.1),
            paths: Some(12),
            format,
            output: None,
            preview: 10,
        }
    }

    fn run_to_string(config: &CliConfig, args: &GbmArgs) -> String {
        let mut out = Vec::new();
        run(config, args, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_csv_output_shape() {
        let output = run_to_string(&seeded_config(42), &small_args(OutputFormat::Csv));
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 13);
        assert_eq!(
            lines[0],
            "path,step_0,step_1,step_2,step_3,step_4,step_5,step_6,step_7,step_8,step_9"
        );
        for (index, line) in lines[1..].iter().enumerate() {
            let fields: Vec<&str> = line.split(',').collect();
            assert_eq!(fields.len(), 11);
            assert_eq!(fields[0], index.to_string());
            assert_eq!(fields[1], "100");
        }
    }

    #[test]
    fn test_json_output() {
        let output = run_to_string(&seeded_config(42), &small_args(OutputFormat::Json));
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["n_paths"], 12);
        assert_eq!(value["n_steps"], 10);
        assert_eq!(value["seed"], 42);
        assert_eq!(value["params"]["dt"], 0.1);

        let paths = value["paths"].as_array().unwrap();
        assert_eq!(paths.len(), 12);
        for path in paths {
            let path = path.as_array().unwrap();
            assert_eq!(path.len(), 10);
            assert_eq!(path[0], 100.0);
        }
    }

    #[test]
    fn test_table_output() {
        let output = run_to_string(&seeded_config(42), &small_args(OutputFormat::Table));

        assert!(output.starts_with("Simulated 12 paths x 10 steps (dt = 0.1, seed = 42)"));
        assert!(output.contains("Mean terminal price: "));
        assert!(output.contains("│ 9      │   100.0000 │"));
        assert!(!output.contains("│ 10     │"));
        assert!(output.contains("... 2 more paths"));
    }

    #[test]
    fn test_table_preview_covers_all_paths() {
        let args = GbmArgs {
            preview: 50,
            ..small_args(OutputFormat::Table)
        };
        let output = run_to_string(&seeded_config(1), &args);

        assert!(output.contains("│ 11     │"));
        assert!(!output.contains("more paths"));
    }

    #[test]
    fn test_same_seed_same_output() {
        let config = seeded_config(2024);
        let args = small_args(OutputFormat::Csv);
        assert_eq!(run_to_string(&config, &args), run_to_string(&config, &args));
    }

    #[test]
    fn test_output_file() {
        let path =
            std::env::temp_dir().join(format!("mcsim-gbm-{}.csv", std::process::id()));
        let args = GbmArgs {
            output: Some(path.clone()),
            ..small_args(OutputFormat::Csv)
        };

        let mut stdout = Vec::<u8>::new();
        run(&seeded_config(42), &args, &mut stdout).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(stdout.is_empty());
        assert_eq!(
            written,
            run_to_string(&seeded_config(42), &small_args(OutputFormat::Csv))
        );
    }

    #[test]
    fn test_config_settings_used_without_flags() {
        let mut config = seeded_config(3);
        config.gbm.n_paths = 10;
        config.gbm.params.dt = 0.5;

        let args = GbmArgs {
            spot: None,
            drift: None,
            volatility: None,
            horizon: None,
            dt: None,
            paths: None,
            ..small_args(OutputFormat::Json)
        };
        let output = run_to_string(&config, &args);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["n_paths"], 10);
        assert_eq!(value["n_steps"], 2);
    }

    #[test]
    fn test_out_of_range_paths_rejected() {
        let args = GbmArgs {
            paths: Some(9),
            ..small_args(OutputFormat::Csv)
        };
        let result = run(&seeded_config(1), &args, &mut Vec::<u8>::new());
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_invalid_model_parameters_rejected() {
        let args = GbmArgs {
            dt: Some(2.0),
            ..small_args(OutputFormat::Csv)
        };
        let result = run(&seeded_config(1), &args, &mut Vec::<u8>::new());
        assert!(matches!(result, Err(CliError::Simulation(_))));

        let args = GbmArgs {
            volatility: Some(-0.1),
            ..small_args(OutputFormat::Csv)
        };
        let result = run(&seeded_config(1), &args, &mut Vec::<u8>::new());
        assert!(matches!(result, Err(CliError::Simulation(_))));
    }

    #[test]
    fn test_negative_values_reach_parameter_validation() {
        for flag in ["--spot", "--volatility", "--horizon", "--dt"] {
            let parsed = GbmCommand::try_parse_from(["gbm", flag, "-0.1", "--paths", "10"])
                .unwrap_or_else(|e| panic!("{} -0.1 rejected by the parser: {}", flag, e));

            let result = run(&seeded_config(1), &parsed.args, &mut Vec::<u8>::new());
            assert!(
                matches!(result, Err(CliError::Simulation(_))),
                "{} -0.1 gave {:?}",
                flag,
                result
            );
        }
    }

    #[test]
    fn test_parsed_defaults() {
        let parsed = GbmCommand::try_parse_from(["gbm"]).unwrap();
        assert_eq!(parsed.args.format, OutputFormat::Table);
        assert_eq!(parsed.args.preview, 10);
        assert!(parsed.args.spot.is_none());
    }
}
