//! `specforge combine`

use anyhow::{Context, Result, bail};
use specforge::OutputFormat;
use specforge_combine::{Combiner, CombinerConfig, ServicesConfig};

use crate::cli::CombineArgs;

pub fn run(args: CombineArgs) -> Result<()> {
    let services = match &args.config {
        Some(path) => Some(
            ServicesConfig::from_file(path)
                .with_context(|| format!("failed to load services config '{}'", path.display()))?,
        ),
        None => None,
    };
    let config = resolve_config(&args, services.as_ref())?;
    let verbose = config.verbose;
    let output = config.output_file.clone();

    let mut combiner = Combiner::new(config)?;
    combiner.load_specs(&args.inputs)?;
    if let Some(services) = &services {
        combiner.load_services(services)?;
    }
    if combiner.sources().is_empty() {
        bail!("no input documents (pass spec files or a services config with --config)");
    }

    combiner.run()?;

    let stats = combiner.stats();
    println!(
        "Combined {} services into {}",
        stats.services,
        output.display()
    );
    if verbose {
        println!("{stats}");
    }
    Ok(())
}

/// Defaults, overridden by the services config, overridden by explicit flags.
pub fn resolve_config(
    args: &CombineArgs,
    services: Option<&ServicesConfig>,
) -> Result<CombinerConfig> {
    let mut config = CombinerConfig::default();
    if let Some(services) = services {
        config.apply_services_config(services);
    }

    if let Some(output) = &args.output {
        config.output_file = output.clone();
    }
    config.format = args
        .format
        .or_else(|| OutputFormat::from_path(&config.output_file))
        .unwrap_or_default();
    if let Some(title) = &args.title {
        config.title = title.clone();
    }
    if let Some(version) = &args.api_version {
        config.version = version.clone();
    }
    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
    }
    for prefix in &args.prefixes {
        config.parse_prefix(prefix)?;
    }
    if !args.include_tags.is_empty() {
        config.include_tags = args.include_tags.clone();
    }
    if !args.exclude_tags.is_empty() {
        config.exclude_tags = args.exclude_tags.clone();
    }
    if let Some(merge_schemas) = args.merge_schemas {
        config.merge_schemas = merge_schemas;
    }
    if let Some(validate) = args.validate {
        config.validate_output = validate;
    }
    config.verbose = args.verbose;
    Ok(config)
}
