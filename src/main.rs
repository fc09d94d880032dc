//! Command-line driver: reconcile a directory of localization responses into
//! one scene graph and export it as JSON.
//!
//! The directory layout matches what the response grabber writes: one
//! `<image>.json` per localized shot, an optional `metadata.json` with the
//! reconstruction metadata, and an optional `cloud.json` point payload.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use georecon::reconcile::{PointCloud, ReconstructionMetadata, SequenceAssembler};
use georecon::scene::{DocumentParser, SceneDocument};
use georecon::utils::config::ReconcilerConfig;
use georecon::utils::natsort::natural_sort;
use georecon::Frame;

const METADATA_FILE: &str = "metadata.json";
const CLOUD_FILE: &str = "cloud.json";

#[derive(Debug, Clone, PartialEq)]
struct Options {
    directory: PathBuf,
    target_frame: Option<Frame>,
    config_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
}

impl Options {
    fn parse(args: &[String]) -> Result<Self, String> {
        let mut directory = None;
        let mut target_frame = None;
        let mut config_path = None;
        let mut output_path = None;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--target" => {
                    let value = iter.next().ok_or("--target needs a value")?;
                    target_frame = Some(match value.as_str() {
                        "local" => Frame::Local,
                        "ecef" => Frame::Ecef,
                        "enu" => Frame::Enu,
                        other => return Err(format!("unknown target frame: {}", other)),
                    });
                }
                "--config" => {
                    let value = iter.next().ok_or("--config needs a value")?;
                    config_path = Some(PathBuf::from(value));
                }
                "--output" => {
                    let value = iter.next().ok_or("--output needs a value")?;
                    output_path = Some(PathBuf::from(value));
                }
                other if other.starts_with("--") => {
                    return Err(format!("unknown option: {}", other));
                }
                other => {
                    if directory.replace(PathBuf::from(other)).is_some() {
                        return Err("only one directory argument is accepted".to_string());
                    }
                }
            }
        }

        Ok(Self {
            directory: directory.ok_or("usage: georecon <directory> [--target frame] [--config path] [--output path]")?,
            target_frame,
            config_path,
            output_path,
        })
    }
}

/// Response files in natural order, metadata and cloud sidecars excluded
fn list_response_files(directory: &Path) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut names: Vec<String> = Vec::new();
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(".json") && name != METADATA_FILE && name != CLOUD_FILE {
            names.push(name);
        }
    }
    natural_sort(&mut names);
    Ok(names.into_iter().map(|name| directory.join(name)).collect())
}

fn run(options: &Options) -> Result<(), Box<dyn Error>> {
    let config = match &options.config_path {
        Some(path) => ReconcilerConfig::load(path)?,
        None => ReconcilerConfig::default(),
    };
    let target_frame = options.target_frame.unwrap_or(config.target_frame);

    let parser = DocumentParser::new();

    let metadata_path = options.directory.join(METADATA_FILE);
    let metadata = if metadata_path.exists() {
        parser.parse_metadata(&fs::read_to_string(&metadata_path)?)?
    } else {
        eprintln!("no {} found, using default metadata", METADATA_FILE);
        ReconstructionMetadata::default()
    };

    let cloud_path = options.directory.join(CLOUD_FILE);
    let cloud: Option<PointCloud> = if cloud_path.exists() {
        Some(serde_json::from_str(&fs::read_to_string(&cloud_path)?)?)
    } else {
        None
    };

    let mut documents: Vec<SceneDocument> = Vec::new();
    for path in list_response_files(&options.directory)? {
        let payload = fs::read_to_string(&path)?;
        match parser.parse_document(&payload) {
            Ok(document) => documents.push(document),
            Err(err) => eprintln!("skipping {}: {}", path.display(), err),
        }
    }

    let assembler = SequenceAssembler::new(target_frame)
        .halt_on_document_error(config.halt_on_document_error);
    let graph = assembler.assemble(&documents, &metadata, cloud.as_ref())?;

    eprintln!(
        "assembled {} of {} documents into {} frame: {} markers",
        graph.camera_path.len(),
        documents.len(),
        graph.frame,
        graph.object_markers.len(),
    );
    if config.report_duplicates && graph.skipped_duplicates > 0 {
        eprintln!("skipped {} duplicate object ids", graph.skipped_duplicates);
    }
    for failure in &graph.skipped_documents {
        eprintln!("document {} skipped: {}", failure.index, failure.error);
    }

    let payload = serde_json::to_string_pretty(&graph)?;
    match &options.output_path {
        Some(path) => fs::write(path, payload)?,
        None => println!("{}", payload),
    }

    Ok(())
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match Options::parse(&args) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(2);
        }
    };

    if let Err(err) = run(&options) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_directory_and_target() {
        let options = Options::parse(&args(&["responses/7", "--target", "ecef"])).unwrap();
        assert_eq!(options.directory, PathBuf::from("responses/7"));
        assert_eq!(options.target_frame, Some(Frame::Ecef));
        assert!(options.output_path.is_none());
    }

    #[test]
    fn test_parse_rejects_unknown_frame() {
        assert!(Options::parse(&args(&["dir", "--target", "utm"])).is_err());
    }

    #[test]
    fn test_parse_requires_directory() {
        assert!(Options::parse(&args(&["--target", "enu"])).is_err());
    }
}
