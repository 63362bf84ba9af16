use crate::error::{Error, Result};
use crate::ocr::OcrEngine;
use crate::utils::AppConfig;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// OCR through the `tesseract` executable.
///
/// Runs `<command> <image> stdout -l <language> [args...]` and reads the
/// recognized text from stdout.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    command: String,
    language: String,
    args: Vec<String>,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl TesseractCli {
    pub fn new(command: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            language: language.into(),
            args: Vec::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.ocr_command.clone(), config.ocr_language.clone())
            .with_args(config.ocr_args.clone())
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    fn build_command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.arg(path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl OcrEngine for TesseractCli {
    fn extract_text(&self, path: &Path) -> Result<String> {
        let ocr_error = |message: String| Error::Ocr {
            path: path.to_path_buf(),
            message,
        };

        let output = self
            .build_command(path)
            .output()
            .map_err(|e| ocr_error(format!("failed to run '{}': {}", self.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            return Err(ocr_error(if stderr.is_empty() {
                format!("'{}' exited with {}", self.command, output.status)
            } else {
                stderr.to_string()
            }));
        }

        let text = String::from_utf8(output.stdout)
            .map_err(|e| ocr_error(format!("output is not valid UTF-8: {}", e)))?;

        debug!(path = %path.display(), chars = text.len(), "ocr complete");

        // tesseract terminates each page with a form feed
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config = AppConfig {
            ocr_command: "/opt/tesseract/bin/tesseract".to_string(),
            ocr_language: "deu+eng".to_string(),
            ocr_args: vec!["--psm".to_string(), "6".to_string()],
            ..AppConfig::default()
        };
        let engine = TesseractCli::from_config(&config);

        let cmd = engine.build_command(Path::new("/scans/page.png"));
        assert_eq!(cmd.get_program(), "/opt/tesseract/bin/tesseract");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec!["/scans/page.png", "stdout", "-l", "deu+eng", "--psm", "6"]
        );
    }

    #[test]
    fn test_missing_executable_is_ocr_error() {
        let engine = TesseractCli::new("ocidx-definitely-not-installed", "eng");
        let err = engine.extract_text(Path::new("/scans/page.png")).unwrap_err();
        match err {
            Error::Ocr { path, message } => {
                assert_eq!(path, Path::new("/scans/page.png"));
                assert!(message.contains("failed to run"));
            }
            other => panic!("expected OCR error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_ocr_error() {
        // `false` ignores its arguments and exits 1
        let engine = TesseractCli::new("false", "eng");
        let err = engine.extract_text(Path::new("/scans/page.png")).unwrap_err();
        assert!(matches!(err, Error::Ocr { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_silent_success_is_empty_text() {
        // `true` prints nothing and exits 0, like an image without text
        let engine = TesseractCli::new("true", "eng");
        let text = engine.extract_text(Path::new("/scans/page.png")).unwrap();
        assert_eq!(text, "");
    }
}
