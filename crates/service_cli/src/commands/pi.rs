//! Pi command implementation
//!
//! Estimates π with the partitioned rejection sampler in `sim_engine`.

use std::f64::consts::PI;
use std::io::Write;

use clap::Args;
use sim_engine::{PiEstimate, PiEstimator};
use tracing::info;

use super::OutputFormat;
use crate::config::CliConfig;
use crate::Result;

/// Arguments for `mcsim pi`
#[derive(Args, Debug, Clone, Default)]
pub struct PiArgs {
    /// Total number of samples (1,000 to 10,000,000)
    #[arg(short = 'n', long)]
    pub samples: Option<u64>,

    /// Number of parallel jobs (1 to 8)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

/// Run the pi command
pub fn run(config: &CliConfig, args: &PiArgs, out: &mut impl Write) -> Result<()> {
    let settings = config.pi.with_overrides(args.samples, args.jobs);
    settings.validate()?;

    let estimator = PiEstimator::new(settings.total_samples, settings.n_workers)?;
    let mut rng = config.rng();

    info!("Starting π estimation...");
    info!("  Samples: {}", settings.total_samples);
    info!("  Workers: {}", settings.n_workers);
    info!("  Seed: {}", rng.seed());

    let estimate = estimator.estimate(&mut rng)?;
    info!(value = estimate.value, "π estimation complete");

    write_estimate(&estimate, args.format, out)
}

fn write_estimate(estimate: &PiEstimate, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    match format {
        OutputFormat::Table => {
            writeln!(out, "Estimated π value: {:.6}", estimate.value)?;
            writeln!(out, "  Absolute error:  {:.6}", (estimate.value - PI).abs())?;
            writeln!(
                out,
                "  Samples used:    {} of {} ({} discarded)",
                estimate.samples_used,
                estimate.total_samples,
                estimate.discarded_samples()
            )?;
            writeln!(out, "  Inside circle:   {}", estimate.inside)?;
            writeln!(out, "  Workers:         {}", estimate.n_workers)?;
            writeln!(out, "  Seed:            {}", estimate.seed)?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, estimate)?;
            writeln!(out)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            writer.serialize(estimate)?;
            writer.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CliError;

    fn seeded_config(seed: u64) -> CliConfig {
        CliConfig {
            seed: Some(seed),
            ..Default::default()
        }
    }

    fn run_to_string(config: &CliConfig, args: &PiArgs) -> String {
        let mut out = Vec::new();
        run(config, args, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn small_args(format: OutputFormat) -> PiArgs {
        PiArgs {
            samples: Some(10_001),
            jobs: Some(2),
            format,
        }
    }

    #[test]
    fn test_table_output() {
        let output = run_to_string(&seeded_config(42), &small_args(OutputFormat::Table));

        assert!(output.starts_with("Estimated π value: "));
        assert!(output.contains("10000 of 10001 (1 discarded)"));
        assert!(output.contains("Workers:         2"));
        assert!(output.contains("Seed:            42"));
    }

    #[test]
    fn test_json_output() {
        let output = run_to_string(&seeded_config(7), &small_args(OutputFormat::Json));
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["total_samples"], 10_001);
        assert_eq!(value["samples_used"], 10_000);
        assert_eq!(value["n_workers"], 2);
        assert_eq!(value["seed"], 7);

        let pi = value["value"].as_f64().unwrap();
        assert!((2.5..=3.8).contains(&pi));
    }

    #[test]
    fn test_csv_output() {
        let output = run_to_string(&seeded_config(7), &small_args(OutputFormat::Csv));
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "value,inside,samples_used,total_samples,n_workers,seed"
        );
        assert!(lines[1].ends_with(",10000,10001,2,7"));
    }

    #[test]
    fn test_same_seed_same_output() {
        let config = seeded_config(99);
        let args = small_args(OutputFormat::Json);
        assert_eq!(run_to_string(&config, &args), run_to_string(&config, &args));
    }

    #[test]
    fn test_config_settings_used_without_flags() {
        let mut config = seeded_config(3);
        config.pi.total_samples = 2_000;
        config.pi.n_workers = 3;

        let output = run_to_string(&config, &PiArgs::default());
        assert!(output.contains("1998 of 2000 (2 discarded)"));
        assert!(output.contains("Workers:         3"));
    }

    #[test]
    fn test_out_of_range_jobs_rejected() {
        let args = PiArgs {
            jobs: Some(9),
            ..small_args(OutputFormat::Table)
        };
        let mut out = Vec::<u8>::new();
        let result = run(&seeded_config(1), &args, &mut out);

        assert!(matches!(result, Err(CliError::Config(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn test_out_of_range_samples_rejected() {
        let args = PiArgs {
            samples: Some(999),
            ..small_args(OutputFormat::Table)
        };
        let result = run(&seeded_config(1), &args, &mut Vec::<u8>::new());
        assert!(matches!(result, Err(CliError::Config(_))));
    }
}
