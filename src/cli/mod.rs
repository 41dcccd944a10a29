//! Command-line presentation layer
//!
//! Loads images from disk, runs the pipeline and prints a JSON report on
//! stdout with a human summary on stderr. The reference catalog is built
//! once and shared behind an `Arc`.

pub mod report;
pub mod self_check;

pub use report::{FeatureReport, VerificationReport};
pub use self_check::{run_self_check, CheckOutcome};

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::analysis::FeatureAggregator;
use crate::config::DetectionConfig;
use crate::image_loader::{detect_format, load_image, save_gray_image};
use crate::reference::{Denomination, ReferenceCatalog};
use crate::{Result, VerificationError};

/// Banknote security feature verification
#[derive(Debug, Parser)]
#[command(name = "banknote-verify")]
#[command(about = "Score the security features of a banknote photograph", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyze a note photograph
    Check {
        /// Image file: jpg, jpeg, png, gif, webp, tif(f), bmp, tga, pnm family or qoi
        #[arg(name = "IMAGE")]
        image: PathBuf,

        /// Note denomination: 100, 200, 500 or 2000
        #[arg(short, long)]
        denomination: Denomination,

        /// Detection configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory for intermediate buffers as PNG
        #[arg(long)]
        debug: Option<PathBuf>,

        /// Single-line JSON output
        #[arg(long)]
        compact: bool,
    },

    /// Show the RBI security features guide
    Guide {
        /// Only this denomination
        #[arg(short, long)]
        denomination: Option<Denomination>,
    },

    /// Write the default detection configuration
    Config {
        #[arg(name = "OUTPUT")]
        output: PathBuf,
    },

    /// Run the built-in fixtures through the pipeline
    SelfCheck,
}

/// Execute a parsed command; `Ok(false)` means the command ran but failed
/// its own check
pub fn run(command: Commands) -> Result<bool> {
    let catalog = Arc::new(ReferenceCatalog::new());

    match command {
        Commands::Check {
            image,
            denomination,
            config,
            debug,
            compact,
        } => check(&image, denomination, config.as_deref(), debug.as_deref(), compact, &catalog),
        Commands::Guide { denomination } => {
            print!("{}", guide(&catalog, denomination));
            Ok(true)
        }
        Commands::Config { output } => {
            DetectionConfig::default().to_json_file(&output)?;
            eprintln!("Default configuration written to {}", output.display());
            Ok(true)
        }
        Commands::SelfCheck => {
            let outcomes = run_self_check(&FeatureAggregator::new())?;
            for outcome in &outcomes {
                let mark = if outcome.passed { "ok  " } else { "FAIL" };
                println!("{} {:<34} {}", mark, outcome.name, outcome.detail);
            }
            Ok(outcomes.iter().all(|o| o.passed))
        }
    }
}

fn check(
    image_path: &Path,
    denomination: Denomination,
    config_path: Option<&Path>,
    debug_dir: Option<&Path>,
    compact: bool,
    catalog: &ReferenceCatalog,
) -> Result<bool> {
    // Fail on the file name before reading anything
    detect_format(image_path)?;

    let config = match config_path {
        Some(path) => DetectionConfig::from_json_file(path)?,
        None => DetectionConfig::default(),
    };
    let aggregator = FeatureAggregator::with_config(config);

    info!(image = %image_path.display(), %denomination, "checking note");
    let image = load_image(image_path)?;

    let result = match debug_dir {
        Some(dir) => {
            let (result, buffers) = aggregator.analyze_debug(&image)?;
            std::fs::create_dir_all(dir).map_err(|e| VerificationError::ProcessingError {
                message: format!("cannot create {}: {}", dir.display(), e),
            })?;
            save_gray_image(&buffers.normalized, &dir.join("normalized.png"))?;
            save_gray_image(&buffers.thread_mask, &dir.join("thread_mask.png"))?;
            save_gray_image(&buffers.contrast_map, &dir.join("contrast_map.png"))?;
            save_gray_image(&buffers.edge_map, &dir.join("edge_map.png"))?;
            info!(dir = %dir.display(), "debug buffers written");
            result
        }
        None => {
            let processed = aggregator.normalize(&image)?;
            aggregator.analyze(&processed, &image)?
        }
    };

    let report = VerificationReport::compose(&result, denomination, catalog);
    let json = report.to_json(compact).map_err(|e| VerificationError::ProcessingError {
        message: format!("cannot serialize report: {}", e),
    })?;
    println!("{}", json);
    eprint!("{}", report.summary());

    Ok(true)
}

/// Catalog descriptions and feature lists, highest denomination first
pub fn guide(catalog: &ReferenceCatalog, only: Option<Denomination>) -> String {
    let mut out = String::from("RBI security features guide\n");

    for entry in catalog.entries() {
        if only.is_some_and(|d| d != entry.denomination) {
            continue;
        }
        out.push_str(&format!("\n{} note\n", entry.denomination));
        out.push_str(&entry.description);
        out.push('\n');
        for feature in &entry.security_features {
            out.push_str(&format!("  • {}\n", feature));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::tempdir;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check_command() {
        let cli = Cli::try_parse_from([
            "banknote-verify",
            "-v",
            "check",
            "note.jpg",
            "--denomination",
            "500",
            "--compact",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Check {
                image,
                denomination,
                compact,
                debug,
                ..
            } => {
                assert_eq!(image, PathBuf::from("note.jpg"));
                assert_eq!(denomination, Denomination::Rs500);
                assert!(compact);
                assert!(debug.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_unknown_denomination_rejected_by_parser() {
        let parsed = Cli::try_parse_from(["banknote-verify", "check", "note.jpg", "-d", "50"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_guide_filter() {
        let catalog = ReferenceCatalog::new();
        let all = guide(&catalog, None);
        assert!(all.contains("₹2000 note"));
        assert!(all.contains("₹100 note"));

        let only = guide(&catalog, Some(Denomination::Rs200));
        assert!(only.contains("Sanchi Stupa"));
        assert!(!only.contains("₹500 note"));
    }

    #[test]
    fn test_config_command_writes_loadable_file() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("detection.json");

        assert!(run(Commands::Config {
            output: output.clone()
        })
        .unwrap());
        let loaded = DetectionConfig::from_json_file(&output).unwrap();
        assert_eq!(loaded, DetectionConfig::default());
    }

    #[test]
    fn test_check_writes_debug_buffers() {
        let dir = tempdir().unwrap();
        let image_path = dir.path().join("note.png");
        let debug_dir = dir.path().join("debug");

        let mut img = image::RgbImage::new(120, 260);
        for (x, _, pixel) in img.enumerate_pixels_mut() {
            *pixel = if (52..67).contains(&x) {
                image::Rgb([0, 255, 0])
            } else {
                image::Rgb([128, 128, 128])
            };
        }
        img.save(&image_path).unwrap();

        let catalog = ReferenceCatalog::new();
        let ok = check(
            &image_path,
            Denomination::Rs500,
            None,
            Some(&debug_dir),
            true,
            &catalog,
        )
        .unwrap();

        assert!(ok);
        for name in ["normalized", "thread_mask", "contrast_map", "edge_map"] {
            assert!(debug_dir.join(format!("{}.png", name)).exists(), "{} missing", name);
        }
    }

    #[test]
    fn test_check_missing_image_fails() {
        let catalog = ReferenceCatalog::new();
        let result = check(
            Path::new("no_such_note.png"),
            Denomination::Rs100,
            None,
            None,
            false,
            &catalog,
        );
        assert!(result.unwrap_err().is_recoverable());
    }

    #[test]
    fn test_check_rejects_extension_before_config() {
        let catalog = ReferenceCatalog::new();
        let err = check(
            Path::new("note.heic"),
            Denomination::Rs100,
            Some(Path::new("no_such_config.json")),
            None,
            false,
            &catalog,
        )
        .unwrap_err();

        assert!(matches!(err, VerificationError::UnsupportedFormat { .. }));
        assert!(err.user_message().contains("png"));
    }
}
