//! Run a sort-merge join over two JSON row files.
//!
//! Rows are JSON arrays of externally tagged values, e.g.
//! `[[{"Int": 1}, {"Text": "A"}]]`. The join policy is selected by op code
//! from the TOML config.

use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};
use thiserror::Error as ThisError;
use veiljoin_core::{
    codec::stream::{decode_join_records, encode_join_records, encode_rows, stream_layout},
    config::{ConfigError, JoinConfig},
    error::InternalError,
    join::policy::{JoinPolicy, OpCode},
    obs::{MetricsReport, metrics_report},
    prelude::*,
};

#[derive(Parser)]
#[command(name = "veiljoin")]
#[command(about = "Sort-merge join over JSON row files", long_about = None)]
struct Args {
    /// TOML join configuration.
    #[arg(long, env = "VEILJOIN_CONFIG")]
    config: PathBuf,
    /// Op code selecting a join policy from `[ops]`.
    #[arg(long)]
    op: u32,
    /// Primary-table rows (JSON).
    #[arg(long)]
    primary: PathBuf,
    /// Foreign-table rows (JSON).
    #[arg(long)]
    foreign: PathBuf,
    /// Number of partitions to split the sorted stream into.
    #[arg(long, default_value_t = 1)]
    partitions: usize,
    #[arg(long, value_enum, default_value_t = Mode::Oblivious)]
    mode: Mode,
    /// Include per-operation counters in the report.
    #[arg(long, default_value_t = false)]
    metrics: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
enum Mode {
    Oblivious,
    Compact,
}

impl From<Mode> for MergeMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Oblivious => Self::Oblivious,
            Mode::Compact => Self::NonOblivious,
        }
    }
}

///
/// CliError
///

#[derive(Debug, ThisError)]
enum CliError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rows in '{path}': {source}")]
    Rows {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{}", .0.display_with_class())]
    Join(#[from] InternalError),

    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),
}

///
/// JoinReport
///

#[derive(Debug, Serialize)]
struct JoinReport {
    mode: Mode,
    partitions: usize,
    records: usize,
    matches: Option<u64>,
    rows: Vec<Row>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<MetricsReport>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args) {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("veiljoin: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<String, CliError> {
    let config = JoinConfig::from_path(&args.config)?;
    let primary = read_rows(&args.primary)?;
    let foreign = read_rows(&args.foreign)?;

    let mut report = join_rows(
        &config,
        OpCode(args.op),
        &primary,
        &foreign,
        args.partitions,
        args.mode,
    )?;
    if args.metrics {
        report.metrics = Some(metrics_report());
    }

    Ok(serde_json::to_string_pretty(&report)?)
}

fn read_rows(path: &Path) -> Result<Vec<Row>, CliError> {
    let display = path.display().to_string();
    let source = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: display.clone(),
        source,
    })?;

    serde_json::from_str(&source).map_err(|source| CliError::Rows {
        path: display,
        source,
    })
}

// Preprocess, sort, and join in-process.
fn join_rows(
    config: &JoinConfig,
    op: OpCode,
    primary: &[Row],
    foreign: &[Row],
    partitions: usize,
    mode: Mode,
) -> Result<JoinReport, CliError> {
    let engine = JoinEngine::from_config(config)?;
    let registry = config.policy_registry()?;
    let policy = registry.get(op)?;

    let p = encode_rows(engine.codec(), primary)?;
    let f = encode_rows(engine.codec(), foreign)?;
    let mut tagged = vec![0u8; engine.preprocess_output_len(&p.bytes, p.count, &f.bytes, f.count)?];
    let written = engine.preprocess(&p.bytes, p.count, &f.bytes, f.count, &mut tagged)?;
    tagged.truncate(written);

    let count = p.count + f.count;
    let sorted = sort_for_merge(&engine, policy, &tagged, count)?;

    let output = PartitionedJoin::new(&engine, policy, partitions).run(&sorted, count, mode.into())?;
    let records = output.records(engine.codec())?;

    Ok(JoinReport {
        mode,
        partitions,
        records: records.len(),
        matches: output.matches,
        rows: records.into_iter().filter_map(OutputRecord::into_row).collect(),
        metrics: None,
    })
}

// Stand-in for the external sort: order by join attribute, primary first.
fn sort_for_merge<P: JoinPolicy>(
    engine: &JoinEngine,
    policy: &P,
    tagged: &[u8],
    count: u32,
) -> Result<Vec<u8>, InternalError> {
    let layout = stream_layout(tagged)?;
    let records = decode_join_records(engine.codec(), tagged, count)?;

    let mut keyed = Vec::with_capacity(records.len());
    for record in records {
        let key = match &record {
            JoinRecord::Real { side, row } => {
                Some((policy.join_attribute(*side, row)?, side.group_rank()))
            }
            JoinRecord::Dummy => None,
        };
        keyed.push((key, record));
    }
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    let records: Vec<_> = keyed.into_iter().map(|(_, record)| record).collect();

    Ok(encode_join_records(engine.codec(), &records, layout)?.bytes)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[ops.1]
primary_key = [0]
foreign_key = [0]
"#;

    fn rows(json: &str) -> Vec<Row> {
        serde_json::from_str(json).expect("valid rows")
    }

    fn scenario() -> (Vec<Row>, Vec<Row>) {
        (
            rows(r#"[[{"Int": 1}, {"Text": "A"}], [{"Int": 2}, {"Text": "B"}]]"#),
            rows(
                r#"[[{"Int": 3}, {"Text": "Z"}], [{"Int": 1}, {"Text": "X"}], [{"Int": 1}, {"Text": "Y"}]]"#,
            ),
        )
    }

    #[test]
    fn joins_rows_in_both_modes() {
        let config = JoinConfig::from_toml_str(CONFIG).unwrap();
        let (primary, foreign) = scenario();
        let expected = rows(
            r#"[[{"Int": 1}, {"Text": "A"}, {"Text": "X"}], [{"Int": 1}, {"Text": "A"}, {"Text": "Y"}]]"#,
        );

        let report =
            join_rows(&config, OpCode(1), &primary, &foreign, 2, Mode::Oblivious).unwrap();
        assert_eq!(report.records, 5);
        assert_eq!(report.matches, None);
        assert_eq!(report.rows, expected);

        let report = join_rows(&config, OpCode(1), &primary, &foreign, 3, Mode::Compact).unwrap();
        assert_eq!(report.records, 2);
        assert_eq!(report.matches, Some(2));
        assert_eq!(report.rows, expected);
    }

    #[test]
    fn unknown_op_code_is_reported() {
        let config = JoinConfig::from_toml_str(CONFIG).unwrap();
        let (primary, foreign) = scenario();

        let err = join_rows(&config, OpCode(9), &primary, &foreign, 1, Mode::Compact)
            .expect_err("op 9 is not configured");
        assert!(err.to_string().starts_with("config:unsupported:"));
    }

    #[test]
    fn report_serializes_rows_as_tagged_values() {
        let config = JoinConfig::from_toml_str(CONFIG).unwrap();
        let (primary, foreign) = scenario();
        let report = join_rows(&config, OpCode(1), &primary, &foreign, 1, Mode::Compact).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["mode"], "compact");
        assert_eq!(json["rows"][0][2]["Text"], "X");
        assert!(json.get("metrics").is_none());
    }

    #[test]
    fn args_parse_with_defaults() {
        let args = Args::try_parse_from([
            "veiljoin",
            "--config",
            "join.toml",
            "--op",
            "1",
            "--primary",
            "p.json",
            "--foreign",
            "f.json",
        ])
        .unwrap();

        assert_eq!(args.partitions, 1);
        assert_eq!(args.mode, Mode::Oblivious);
        assert!(!args.metrics);
    }
}
