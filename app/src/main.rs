use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pcd_core::pointcloud::{schema::FieldSpec, stats::StatsResult};
use pcd_decoder::{laszip::compress_records, Codec, DecodeMetrics, EncodeError, MetricsSnapshot};
use pcd_worker::{DecodeRequest, PipelineBuilder, PipelineConfig, PipelineError, Worker};

#[derive(Parser, Debug)]
#[command(
    name = "pcd-decode",
    about = "Decompress point record blocks into float columns with histogram stats",
    author = "MIERUNE Inc.",
    version = "0.0.1"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode the payload referenced by a job manifest
    Decode {
        #[arg(short, long, value_name = "FILE")]
        manifest: PathBuf,

        /// Little-endian f32 output, point-major
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Write stats JSON here instead of stdout
        #[arg(long, value_name = "FILE")]
        stats: Option<PathBuf>,

        /// Pipeline config JSON
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        #[arg(long)]
        elevation_bin_width: Option<f64>,

        #[arg(long)]
        color_bin_width: Option<f64>,
    },
    /// Compress packed little-endian records into a LAZ payload
    Compress {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// JSON array of {name, type, size}
        #[arg(short, long, value_name = "FILE")]
        schema: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
}

#[derive(Error, Debug)]
enum AppError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to start decode worker: {0}")]
    Spawn(std::io::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// A decode job as written by the producer. `payload` is relative to the manifest.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobManifest {
    schema: Vec<FieldSpec>,
    payload: PathBuf,
    points_count: usize,
    #[serde(default)]
    world_bounds_x: [f64; 2],
    /// Falls back to the request default when absent.
    #[serde(default)]
    normalize: Option<bool>,
    #[serde(default)]
    codec: Codec,
    #[serde(default)]
    point_size: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsReport<'a> {
    num_points: usize,
    field_count: usize,
    stats: &'a StatsResult,
    metrics: MetricsSnapshot,
}

fn read_file(path: &Path) -> Result<Vec<u8>, AppError> {
    fs::read(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), AppError> {
    fs::write(path, contents).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let bytes = read_file(path)?;
    serde_json::from_slice(&bytes).map_err(|source| AppError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn load_request(manifest_path: &Path) -> Result<DecodeRequest, AppError> {
    let manifest: JobManifest = read_json(manifest_path)?;
    let payload_path = match manifest_path.parent() {
        Some(dir) if manifest.payload.is_relative() => dir.join(&manifest.payload),
        _ => manifest.payload.clone(),
    };
    let buffer = read_file(&payload_path)?;
    log::info!(
        "payload: {:?} ({} bytes, {} points, codec {:?})",
        payload_path,
        buffer.len(),
        manifest.points_count,
        manifest.codec
    );

    let mut request = DecodeRequest::new(manifest.schema, buffer, manifest.points_count)
        .with_world_bounds_x(manifest.world_bounds_x)
        .with_codec(manifest.codec);
    if let Some(normalize) = manifest.normalize {
        request = request.with_normalize(normalize);
    }
    if let Some(point_size) = manifest.point_size {
        request = request.with_point_size(point_size);
    }
    Ok(request)
}

fn run_decode(
    manifest: &Path,
    output: &Path,
    stats_path: Option<&Path>,
    config: PipelineConfig,
) -> Result<(), AppError> {
    let request = load_request(manifest)?;

    let metrics = Arc::new(DecodeMetrics::new());
    let pipeline = PipelineBuilder::new()
        .config(config)
        .metrics(metrics.clone())
        .build();
    let worker = Worker::spawn(pipeline).map_err(AppError::Spawn)?;

    let start = std::time::Instant::now();
    let response = worker.decode(request)?;
    log::info!(
        "decoded {} points x {} fields in {:?}",
        response.num_points(),
        response.field_count,
        start.elapsed()
    );

    let bytes: Vec<u8> = response
        .result
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect();
    write_file(output, &bytes)?;
    log::info!("write floats: {:?}", output);

    let report = StatsReport {
        num_points: response.num_points(),
        field_count: response.field_count,
        stats: &response.stats,
        metrics: metrics.snapshot(),
    };
    let json = serde_json::to_string_pretty(&report).map_err(|source| AppError::Json {
        path: stats_path.map(Path::to_path_buf).unwrap_or_default(),
        source,
    })?;
    match stats_path {
        Some(path) => {
            write_file(path, json.as_bytes())?;
            log::info!("write stats: {:?}", path);
        }
        None => println!("{json}"),
    }

    log::info!("bytes saved by compression: {}", report.metrics.bytes_saved);
    Ok(())
}

fn run_compress(input: &Path, schema_path: &Path, output: &Path) -> Result<(), AppError> {
    let schema: Vec<FieldSpec> = read_json(schema_path)?;
    let records = read_file(input)?;
    let compressed = compress_records(&schema, &records)?;
    write_file(output, &compressed)?;
    log::info!(
        "compressed {} -> {} bytes: {:?}",
        records.len(),
        compressed.len(),
        output
    );
    Ok(())
}

fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Decode {
            manifest,
            output,
            stats,
            config,
            elevation_bin_width,
            color_bin_width,
        } => {
            let mut config: PipelineConfig = match config {
                Some(path) => read_json(&path)?,
                None => PipelineConfig::default(),
            };
            if let Some(width) = elevation_bin_width {
                config.stats.elevation_bin_width = width;
            }
            if let Some(width) = color_bin_width {
                config.stats.color_bin_width = width;
            }
            log::info!("manifest: {:?}", manifest);
            log::info!("stats config: {:?}", config.stats);
            run_decode(&manifest, &output, stats.as_deref(), config)
        }
        Command::Compress {
            input,
            schema,
            output,
        } => run_compress(&input, &schema, &output),
    }
}

fn main() {
    let args = Cli::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .init();

    let start = std::time::Instant::now();
    if let Err(e) = run(args) {
        log::error!("{e}");
        std::process::exit(1);
    }
    log::info!("Elapsed: {:?}", start.elapsed());
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA_JSON: &str = r#"[
        {"name": "X", "type": "floating", "size": 4},
        {"name": "Red", "type": "unsigned", "size": 1},
        {"name": "Green", "type": "unsigned", "size": 1},
        {"name": "Blue", "type": "unsigned", "size": 1}
    ]"#;

    fn toy_records() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1.0f32.to_le_bytes());
        bytes.extend_from_slice(&[10, 20, 30]);
        bytes.extend_from_slice(&2.0f32.to_le_bytes());
        bytes.extend_from_slice(&[40, 50, 60]);
        bytes
    }

    fn read_floats(path: &Path) -> Vec<f32> {
        fs::read(path)
            .unwrap()
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    #[test]
    fn test_compress_then_decode() {
        let dir = tempfile::tempdir().unwrap();
        let records_path = dir.path().join("records.bin");
        let schema_path = dir.path().join("schema.json");
        let payload_path = dir.path().join("payload.laz");
        fs::write(&records_path, toy_records()).unwrap();
        fs::write(&schema_path, SCHEMA_JSON).unwrap();

        run_compress(&records_path, &schema_path, &payload_path).unwrap();

        let manifest_path = dir.path().join("job.json");
        let manifest = format!(
            r#"{{"schema": {SCHEMA_JSON}, "payload": "payload.laz", "pointsCount": 2,
                "worldBoundsX": [0.0, 10.0], "normalize": false, "pointSize": 7}}"#
        );
        fs::write(&manifest_path, manifest).unwrap();

        let output_path = dir.path().join("out.bin");
        let stats_path = dir.path().join("stats.json");
        run_decode(
            &manifest_path,
            &output_path,
            Some(&stats_path),
            PipelineConfig::default(),
        )
        .unwrap();

        // x mirrored in [0, 10], Red and Green columns trade places
        assert_eq!(
            read_floats(&output_path),
            vec![9.0, 20.0, 10.0, 30.0, 8.0, 50.0, 40.0, 60.0]
        );

        let stats: serde_json::Value =
            serde_json::from_slice(&fs::read(&stats_path).unwrap()).unwrap();
        assert_eq!(stats["numPoints"], 2);
        assert_eq!(stats["fieldCount"], 4);
        assert_eq!(stats["stats"]["z"]["20"], 1);
        assert_eq!(stats["stats"]["z"]["50"], 1);
        assert_eq!(stats["stats"]["blue"]["30"], 1);
        assert_eq!(stats["stats"]["blue"]["60"], 1);
        assert_eq!(stats["metrics"]["requests_decoded"], 1);
    }

    #[test]
    fn test_schema_mismatch_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("payload.bin"), toy_records()).unwrap();
        let manifest_path = dir.path().join("job.json");
        let manifest = format!(
            r#"{{"schema": {SCHEMA_JSON}, "payload": "payload.bin", "pointsCount": 2,
                "codec": "raw", "pointSize": 8}}"#
        );
        fs::write(&manifest_path, manifest).unwrap();

        let err = run_decode(
            &manifest_path,
            &dir.path().join("out.bin"),
            None,
            PipelineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Pipeline(PipelineError::Schema(_))));
        assert!(!dir.path().join("out.bin").exists());
    }

    #[test]
    fn test_manifest_normalize_defaults_on() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("payload.bin"), toy_records()).unwrap();
        let manifest_path = dir.path().join("job.json");
        let manifest = format!(
            r#"{{"schema": {SCHEMA_JSON}, "payload": "payload.bin", "pointsCount": 2,
                "worldBoundsX": [0.0, 10.0], "codec": "raw"}}"#
        );
        fs::write(&manifest_path, manifest).unwrap();

        let request = load_request(&manifest_path).unwrap();
        assert!(request.normalize);
        assert_eq!(request.world_bounds_x, [0.0, 10.0]);
        assert_eq!(request.point_size, None);

        let output_path = dir.path().join("out.bin");
        run_decode(
            &manifest_path,
            &output_path,
            Some(&dir.path().join("stats.json")),
            PipelineConfig::default(),
        )
        .unwrap();
        assert_eq!(
            read_floats(&output_path),
            vec![-1.0, 20.0, 10.0, 30.0, -2.0, 50.0, 40.0, 60.0]
        );
    }

    #[test]
    fn test_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_request(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, AppError::Io { .. }));
    }
}
