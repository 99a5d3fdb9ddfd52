use crate::convert::convert_png_to_jpeg;
use photobatch_core::grammar::{is_png, logical_extension};
use photobatch_core::{ProductCode, RenameTarget};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of one fan-out run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FanoutSummary {
    /// Every output that was written
    pub targets: Vec<RenameTarget>,
    pub generated: usize,
    pub png_converted: usize,
}

/// Produces one output per (source, code) pair in the output dir.
///
/// With a single code each source is moved to its output name. With several
/// codes every output is a copy and the source is removed once all of its
/// copies exist. PNG sources are converted to JPEG once, before fan-out,
/// into `scratch_dir`, which must not be the output dir.
pub struct FanoutEngine {
    output_dir: PathBuf,
    scratch_dir: PathBuf,
    jpeg_quality: u8,
}

impl FanoutEngine {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        scratch_dir: impl Into<PathBuf>,
        jpeg_quality: u8,
    ) -> Self {
        FanoutEngine {
            output_dir: output_dir.into(),
            scratch_dir: scratch_dir.into(),
            jpeg_quality,
        }
    }

    /// Run the fan-out. Per-file failures are logged and left out of the
    /// summary; they never abort the remaining files.
    pub fn process(&self, sources: &[PathBuf], codes: &[ProductCode]) -> FanoutSummary {
        let mut summary = FanoutSummary::default();
        if codes.is_empty() {
            return summary;
        }

        for source in sources {
            let Some(source_name) = source.file_name().and_then(|n| n.to_str()) else {
                tracing::warn!(path = %source.display(), "Skipping source without a file name");
                continue;
            };

            let (staged, converted) = self.stage(source, source_name, &mut summary);
            let Some(staged_name) = staged.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let extension = logical_extension(staged_name);

            let produced = if codes.len() == 1 {
                self.move_to_output(&staged, source_name, &codes[0], extension, &mut summary)
            } else {
                self.copy_to_outputs(&staged, source_name, codes, extension, &mut summary)
            };

            // The original PNG is spent once its converted copy has been fanned out.
            if produced && converted {
                remove_quietly(source);
            }
        }

        tracing::info!(
            sources = sources.len(),
            codes = codes.len(),
            generated = summary.generated,
            png_converted = summary.png_converted,
            "Fan-out complete"
        );

        summary
    }

    /// The file to fan out: a converted JPEG for PNG sources, otherwise the
    /// source itself. Conversion failures fall back to the original PNG.
    fn stage(&self, source: &Path, source_name: &str, summary: &mut FanoutSummary) -> (PathBuf, bool) {
        if !is_png(source_name) {
            return (source.to_path_buf(), false);
        }

        match convert_png_to_jpeg(source, &self.scratch_dir, self.jpeg_quality) {
            Ok(jpeg) => {
                summary.png_converted += 1;
                (jpeg, true)
            }
            Err(e) => {
                tracing::warn!(
                    file = %source_name,
                    error = %e,
                    "PNG conversion failed, using original"
                );
                (source.to_path_buf(), false)
            }
        }
    }

    fn move_to_output(
        &self,
        staged: &Path,
        source_name: &str,
        code: &ProductCode,
        extension: &str,
        summary: &mut FanoutSummary,
    ) -> bool {
        let output_name = format!("{}{}", code, extension);
        let dest = self.output_dir.join(&output_name);
        if dest != staged {
            warn_if_overwriting(&dest, source_name);
        }

        match fs::rename(staged, &dest) {
            Ok(()) => {
                summary.generated += 1;
                summary.targets.push(RenameTarget {
                    source_name: source_name.to_string(),
                    output_name,
                });
                true
            }
            Err(e) => {
                tracing::error!(
                    file = %source_name,
                    output = %output_name,
                    error = %e,
                    "Failed to rename staged file"
                );
                false
            }
        }
    }

    fn copy_to_outputs(
        &self,
        staged: &Path,
        source_name: &str,
        codes: &[ProductCode],
        extension: &str,
        summary: &mut FanoutSummary,
    ) -> bool {
        let mut all_copied = true;
        let mut staged_is_output = false;

        for code in codes {
            let output_name = format!("{}{}", code, extension);
            let dest = self.output_dir.join(&output_name);

            // Copying a file onto itself truncates it.
            let copied = if dest == staged {
                staged_is_output = true;
                Ok(0)
            } else {
                warn_if_overwriting(&dest, source_name);
                fs::copy(staged, &dest)
            };

            match copied {
                Ok(_) => {
                    summary.generated += 1;
                    summary.targets.push(RenameTarget {
                        source_name: source_name.to_string(),
                        output_name,
                    });
                }
                Err(e) => {
                    all_copied = false;
                    tracing::error!(
                        file = %source_name,
                        output = %output_name,
                        error = %e,
                        "Failed to copy staged file"
                    );
                }
            }
        }

        if all_copied && !staged_is_output {
            remove_quietly(staged);
        }
        all_copied
    }
}

fn warn_if_overwriting(dest: &Path, source_name: &str) {
    if dest.exists() {
        tracing::warn!(
            file = %source_name,
            output = %dest.display(),
            "Output name already produced by another source, overwriting"
        );
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove staged file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::DEFAULT_JPEG_QUALITY;
    use crate::staging::StagingArea;
    use image::{ImageFormat, Rgba, RgbaImage};
    use photobatch_core::UploadedFile;

    fn codes(list: &[&str]) -> Vec<ProductCode> {
        list.iter().map(|c| ProductCode::parse(c).unwrap()).collect()
    }

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        let mut buffer = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    fn staged(files: Vec<UploadedFile>) -> StagingArea {
        let area = StagingArea::new(None, "RED ES", "ART").unwrap();
        area.write_sources(&files, true).unwrap();
        area
    }

    fn engine(area: &StagingArea) -> FanoutEngine {
        FanoutEngine::new(area.output_dir(), area.converted_dir(), DEFAULT_JPEG_QUALITY)
    }

    fn file_count(area: &StagingArea) -> usize {
        area.source_names().unwrap().len() + area.output_paths().unwrap().len()
    }

    fn output_names(area: &StagingArea) -> Vec<String> {
        area.output_paths()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_many_codes_copy_and_remove_source() {
        let area = staged(vec![UploadedFile::new("photo.PT01.jpg", b"jpeg".to_vec())]);
        let engine = engine(&area);

        let summary = engine.process(&area.source_paths().unwrap(), &codes(&["B01", "B02"]));

        assert_eq!(summary.generated, 2);
        assert_eq!(summary.png_converted, 0);
        assert_eq!(output_names(&area), vec!["B01.PT01.jpg", "B02.PT01.jpg"]);
        assert!(area.source_names().unwrap().is_empty());
        assert_eq!(
            std::fs::read(area.output_dir().join("B02.PT01.jpg")).unwrap(),
            b"jpeg"
        );
    }

    #[test]
    fn test_single_code_renames_without_copy() {
        let area = staged(vec![
            UploadedFile::new("a.PT01.jpg", b"a".to_vec()),
            UploadedFile::new("b.MAIN.webp", b"b".to_vec()),
        ]);
        let before = file_count(&area);
        let engine = engine(&area);

        let summary = engine.process(&area.source_paths().unwrap(), &codes(&["B07"]));

        assert_eq!(summary.generated, 2);
        assert_eq!(file_count(&area), before);
        assert_eq!(output_names(&area), vec!["B07.MAIN.webp", "B07.PT01.jpg"]);
        assert_eq!(
            summary.targets[0],
            RenameTarget {
                source_name: "a.PT01.jpg".to_string(),
                output_name: "B07.PT01.jpg".to_string(),
            }
        );
    }

    #[test]
    fn test_png_converted_once_for_many_codes() {
        let area = staged(vec![UploadedFile::new("shot.PT02.png", png_bytes())]);
        let engine = engine(&area);

        let summary = engine.process(
            &area.source_paths().unwrap(),
            &codes(&["B01", "B02", "B03"]),
        );

        assert_eq!(summary.png_converted, 1);
        assert_eq!(summary.generated, 3);
        assert_eq!(
            output_names(&area),
            vec!["B01.PT02.jpg", "B02.PT02.jpg", "B03.PT02.jpg"]
        );
        // Intermediate JPEG and original PNG are both gone.
        assert!(!area.converted_dir().join("shot.PT02.jpg").exists());
        assert!(!area.output_dir().join("shot.PT02.jpg").exists());
        assert!(area.source_names().unwrap().is_empty());
    }

    #[test]
    fn test_png_single_code_keeps_file_count() {
        let area = staged(vec![UploadedFile::new("shot.MAIN.png", png_bytes())]);
        let before = file_count(&area);
        let engine = engine(&area);

        let summary = engine.process(&area.source_paths().unwrap(), &codes(&["B01"]));

        assert_eq!(summary.png_converted, 1);
        assert_eq!(output_names(&area), vec!["B01.MAIN.jpg"]);
        assert_eq!(file_count(&area), before);
    }

    #[test]
    fn test_undecodable_png_falls_back_to_original() {
        let area = staged(vec![UploadedFile::new("bad.PT01.png", b"nope".to_vec())]);
        let engine = engine(&area);

        let summary = engine.process(&area.source_paths().unwrap(), &codes(&["B01", "B02"]));

        assert_eq!(summary.png_converted, 0);
        assert_eq!(summary.generated, 2);
        assert_eq!(output_names(&area), vec!["B01.PT01.png", "B02.PT01.png"]);
    }

    #[test]
    fn test_missing_source_is_skipped() {
        let area = staged(vec![UploadedFile::new("a.PT01.jpg", b"a".to_vec())]);
        let engine = engine(&area);
        let mut sources = area.source_paths().unwrap();
        sources.push(area.source_dir().join("ghost.PT02.jpg"));

        let summary = engine.process(&sources, &codes(&["B01", "B02"]));

        assert_eq!(summary.generated, 2);
        assert_eq!(output_names(&area), vec!["B01.PT01.jpg", "B02.PT01.jpg"]);
    }

    #[test]
    fn test_code_named_png_keeps_every_output() {
        let area = staged(vec![UploadedFile::new("B01.PT01.png", png_bytes())]);

        let summary =
            engine(&area).process(&area.source_paths().unwrap(), &codes(&["B01", "B02"]));

        assert_eq!(summary.png_converted, 1);
        assert_eq!(summary.generated, 2);
        assert_eq!(output_names(&area), vec!["B01.PT01.jpg", "B02.PT01.jpg"]);
        for path in area.output_paths().unwrap() {
            let bytes = std::fs::read(&path).unwrap();
            assert!(!bytes.is_empty(), "{} is empty", path.display());
            image::load_from_memory(&bytes).unwrap();
        }
        assert!(area.source_names().unwrap().is_empty());
    }

    #[test]
    fn test_staged_file_already_at_output_is_not_truncated() {
        let area = staged(vec![]);
        let staged = area.output_dir().join("B01.PT01.jpg");
        std::fs::write(&staged, b"jpeg").unwrap();

        let summary = engine(&area).process(&[staged.clone()], &codes(&["B01", "B02"]));

        assert_eq!(summary.generated, 2);
        assert_eq!(std::fs::read(&staged).unwrap(), b"jpeg");
        assert_eq!(
            std::fs::read(area.output_dir().join("B02.PT01.jpg")).unwrap(),
            b"jpeg"
        );
    }

    #[test]
    fn test_failed_copy_keeps_source() {
        let area = staged(vec![UploadedFile::new("photo.PT01.jpg", b"jpeg".to_vec())]);
        // A directory squatting on an output name makes that copy fail.
        std::fs::create_dir(area.output_dir().join("B02.PT01.jpg")).unwrap();

        let summary =
            engine(&area).process(&area.source_paths().unwrap(), &codes(&["B01", "B02"]));

        assert_eq!(summary.generated, 1);
        assert_eq!(summary.targets.len(), 1);
        assert_eq!(summary.targets[0].output_name, "B01.PT01.jpg");
        assert_eq!(output_names(&area), vec!["B01.PT01.jpg"]);
        assert_eq!(area.source_names().unwrap(), vec!["photo.PT01.jpg"]);
    }
}
