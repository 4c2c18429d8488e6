//! Document serialization and atomic file output.

use std::{
    fmt,
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{FormatError, OutputError};

/// Encoding of a written document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    /// Guesses the format from a file extension (`.json` or `.yaml`/`.yml`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(OutputFormat::Json),
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
        }
    }

    /// Serializes `value`: YAML with 2-space indentation, or JSON pretty-printed with
    /// 2-space indentation. The output ends with a newline.
    pub fn serialize<T: Serialize>(&self, value: &T) -> Result<String, OutputError> {
        let mut text = match self {
            OutputFormat::Yaml => serde_norway::to_string(value)?,
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
        };
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text)
    }
}

impl FromStr for OutputFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            _ => Err(FormatError(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writes `contents` to `path` through a temporary file in the same directory, so
/// readers never observe a partially written file. Missing parent directories are
/// created.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), OutputError> {
    let io_error = |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(io_error)?;

    let mut file = NamedTempFile::new_in(&dir).map_err(io_error)?;
    file.write_all(contents.as_bytes()).map_err(io_error)?;
    file.as_file().sync_all().map_err(io_error)?;
    file.persist(path).map_err(|err| io_error(err.error))?;
    Ok(())
}

/// Serializes `value` in `format` and writes it atomically to `path`.
pub fn write_document<T: Serialize>(
    path: &Path,
    format: OutputFormat,
    value: &T,
) -> Result<(), OutputError> {
    let text = format.serialize(value)?;
    write_atomic(path, &text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_output_format_accepts_known_names() {
        //* Then
        assert_eq!("yaml".parse::<OutputFormat>(), Ok(OutputFormat::Yaml));
        assert_eq!("YML".parse::<OutputFormat>(), Ok(OutputFormat::Yaml));
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
    }

    #[test]
    fn parse_output_format_with_unknown_name_fails() {
        //* When
        let result = "toml".parse::<OutputFormat>();

        //* Then
        assert_eq!(result, Err(FormatError("toml".to_string())));
    }

    #[test]
    fn serialize_json_uses_two_space_indent() {
        //* Given
        let value = serde_json::json!({"a": {"b": 1}});

        //* When
        let text = OutputFormat::Json
            .serialize(&value)
            .expect("should serialize");

        //* Then
        assert_eq!(text, "{\n  \"a\": {\n    \"b\": 1\n  }\n}\n");
    }

    #[test]
    fn serialize_yaml_uses_two_space_indent() {
        //* Given
        let value = serde_json::json!({"a": {"b": 1}});

        //* When
        let text = OutputFormat::Yaml
            .serialize(&value)
            .expect("should serialize");

        //* Then
        assert_eq!(text, "a:\n  b: 1\n");
    }

    #[test]
    fn write_atomic_creates_missing_directories() {
        //* Given
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("nested/out/spec.json");

        //* When
        let result = write_atomic(&path, "{}\n");

        //* Then
        assert!(result.is_ok(), "write should succeed: {result:?}");
        let written = std::fs::read_to_string(&path).expect("file should exist");
        assert_eq!(written, "{}\n");
    }

    #[test]
    fn from_path_detects_extension() {
        //* Then
        assert_eq!(
            OutputFormat::from_path(Path::new("api.yml")),
            Some(OutputFormat::Yaml)
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("api.JSON")),
            Some(OutputFormat::Json)
        );
        assert_eq!(OutputFormat::from_path(Path::new("api.txt")), None);
    }
}
