//! `specforge generate`

use std::path::Path;

use anyhow::{Context, Result};
use specforge::{
    Emitter,
    openapi::{OpenApi, Server},
    output::write_document,
};
use tracing::{info, warn};

use crate::{
    cli::GenerateArgs,
    manifest::{ManifestSource, OperationSource},
};

const FALLBACK_TITLE: &str = "Generated API";

pub fn run(args: GenerateArgs) -> Result<()> {
    let document = build_document(&args)?;
    write_document(&args.output, args.format, &document)
        .with_context(|| format!("failed to write '{}'", args.output.display()))?;

    println!(
        "Generated OpenAPI document {} ({} operations)",
        args.output.display(),
        document.operation_count()
    );
    if args.verbose {
        println!("Title:      {}", document.info.title);
        println!("Version:    {}", document.info.version);
        println!("Paths:      {}", document.paths.len());
        println!("Operations: {}", document.operation_count());
        println!("Schemas:    {}", document.components.schemas.len());
    }
    Ok(())
}

/// Discovers the operations under the input directory and emits their document.
pub fn build_document(args: &GenerateArgs) -> Result<OpenApi> {
    let source = ManifestSource::new(&args.input);
    let discovered = source
        .discover()
        .with_context(|| format!("failed to discover operations in '{}'", args.input.display()))?;
    if discovered.operations.is_empty() {
        warn!(input = %args.input.display(), "no operations found");
    } else {
        info!(
            operations = discovered.operations.len(),
            "discovered operations"
        );
    }

    let title = args
        .title
        .clone()
        .unwrap_or_else(|| detect_title(&args.input));
    let mut emitter = Emitter::new(title, args.api_version.clone());
    if let Some(description) = &args.description {
        emitter = emitter.description(description.clone());
    }
    for url in &args.servers {
        emitter = emitter.server(Server::new(url.clone()));
    }
    for (name, scheme) in discovered.security_schemes {
        emitter = emitter.security_scheme(name, scheme);
    }
    for (name, schema) in discovered.schemas {
        emitter = emitter.schema_component(name, schema);
    }
    for tag in discovered.tags {
        emitter = emitter.tag(tag);
    }

    emitter
        .emit(&discovered.operations)
        .context("failed to emit OpenAPI document")
}

/// Title derived from the input directory name: `user-service` becomes
/// `User Service API`. Falls back to `Generated API` for `.`, `/` and other paths
/// without a usable name.
pub fn detect_title(input: &Path) -> String {
    let Some(name) = input.file_name().and_then(|name| name.to_str()) else {
        return FALLBACK_TITLE.to_string();
    };
    let words: Vec<String> = name
        .split(['-', ' '])
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect();
    if words.is_empty() {
        return FALLBACK_TITLE.to_string();
    }
    format!("{} API", words.join(" "))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use specforge::OutputFormat;

    use super::*;

    fn args(input: PathBuf) -> GenerateArgs {
        GenerateArgs {
            input,
            output: PathBuf::from("openapi.yaml"),
            format: OutputFormat::Yaml,
            title: None,
            api_version: "1.0.0".to_string(),
            description: None,
            servers: Vec::new(),
            verbose: false,
        }
    }

    #[test]
    fn detect_title_title_cases_directory_name() {
        //* Then
        assert_eq!(detect_title(Path::new("user-service")), "User Service API");
        assert_eq!(
            detect_title(Path::new("/srv/billing engine/")),
            "Billing Engine API"
        );
    }

    #[test]
    fn detect_title_for_current_or_root_dir_falls_back() {
        //* Then
        assert_eq!(detect_title(Path::new(".")), "Generated API");
        assert_eq!(detect_title(Path::new("/")), "Generated API");
    }

    #[test]
    fn build_document_emits_manifest_operations() {
        //* Given
        let dir = tempfile::tempdir().expect("should create temp dir");
        let input = dir.path().join("user-service");
        std::fs::create_dir_all(&input).expect("mkdir");
        std::fs::write(
            input.join("users.routes.yaml"),
            "operations:\n  - method: get\n    path: /users\n    response: { type: array, items: { type: string } }\n",
        )
        .expect("write manifest");

        //* When
        let document = build_document(&args(input)).expect("document should build");

        //* Then
        assert_eq!(document.info.title, "User Service API");
        assert_eq!(document.operation_count(), 1);
        assert!(document.paths.contains_key("/users"));
    }

    #[test]
    fn build_document_with_invalid_manifest_fails() {
        //* Given
        let dir = tempfile::tempdir().expect("should create temp dir");
        std::fs::write(
            dir.path().join("bad.routes.yaml"),
            "operations:\n  - method: get\n    path: users\n",
        )
        .expect("write manifest");

        //* When
        let result = build_document(&args(dir.path().to_path_buf()));

        //* Then
        assert!(result.is_err());
    }
}
