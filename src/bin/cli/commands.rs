//! Command implementations for the CLI tool.

use std::path::Path;

use jarshade::transform::{
    ApacheLicenseResourceTransformer, ApacheNoticeResourceTransformer,
    ComponentsXmlResourceTransformer, DontIncludeResourceTransformer, ManifestResourceTransformer,
    ServicesResourceTransformer,
};
use jarshade::{
    Compression, Error, JarReader, Result, ShadeConfig, ShadeOptions, ShadeRequest, Shader,
    SimpleRelocator,
};

use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::create_formatter;
use crate::progress::ArchiveProgress;
use crate::{OutputFormat, ShadeArgs};

/// Shade command implementation
pub fn shade(args: &ShadeArgs, format: OutputFormat, quiet: bool) -> ExitCode {
    let formatter = create_formatter(format);

    let (request, options) = match build_request(args) {
        Ok(built) => built,
        Err(e) => {
            eprintln!("Error: {}", e);
            return error_to_exit_code(&e);
        }
    };

    let progress = ArchiveProgress::new(request.inputs.len() as u64, quiet);
    let mut shader = Shader::new(options).listener(progress.clone());

    match shader.shade(request) {
        Ok(result) => {
            progress.finish();
            print!("{}", formatter.format_shade_result(&result));
            if result.duplicates.is_empty() {
                ExitCode::Success
            } else {
                ExitCode::Warning
            }
        }
        Err(e) => {
            progress.abandon();
            eprintln!("Error: {}", e);
            error_to_exit_code(&e)
        }
    }
}

/// List command implementation
pub fn list(archive_path: &Path, format: OutputFormat) -> ExitCode {
    let formatter = create_formatter(format);

    let entries = JarReader::open_path(archive_path).and_then(|mut reader| reader.entries());
    match entries {
        Ok(entries) => {
            print!("{}", formatter.format_list(&entries));
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            error_to_exit_code(&e)
        }
    }
}

/// Builds the run from a worklist and/or flags.
///
/// Rules given as flags are appended after those of the worklist.
pub(crate) fn build_request(args: &ShadeArgs) -> Result<(ShadeRequest, ShadeOptions)> {
    let (mut request, mut options) = match &args.config {
        Some(path) => ShadeConfig::from_path(path)?.into_request()?,
        None => {
            let output = args.output.clone().ok_or_else(|| {
                Error::InvalidConfiguration("--output is required without --config".into())
            })?;
            let request = ShadeRequest::new(output).inputs(args.inputs.iter().cloned());
            (request, ShadeOptions::new())
        }
    };

    for spec in &args.relocate {
        request.relocators.push(Box::new(parse_relocation(spec, &args.relocate_exclude)?));
    }

    if !args.exclude_resource.is_empty() {
        request.transformers.push(Box::new(DontIncludeResourceTransformer::new(
            &args.exclude_resource,
        )?));
    }
    if args.apache_license {
        request
            .transformers
            .push(Box::new(ApacheLicenseResourceTransformer::new()));
    }
    if args.apache_notice {
        request
            .transformers
            .push(Box::new(ApacheNoticeResourceTransformer::new()));
    }
    if args.services {
        request
            .transformers
            .push(Box::new(ServicesResourceTransformer::new()));
    }
    if args.components_xml {
        request
            .transformers
            .push(Box::new(ComponentsXmlResourceTransformer::new()));
    }
    if let Some(main_class) = &args.main_class {
        request.transformers.push(Box::new(
            ManifestResourceTransformer::new().main_class(main_class.clone()),
        ));
    }

    if args.store {
        options.write = options.write.compression(Compression::Stored);
    }
    if let Some(level) = args.level {
        options.write = options.write.level(level)?;
    }
    if args.no_string_relocation {
        options.relocate_string_literals = false;
    }
    if args.relocate_resources {
        options.relocate_resource_paths = true;
    }
    options.exclude_inputs.extend(args.exclude_input.iter().cloned());
    options.validate()?;

    Ok((request, options))
}

/// Parses `FROM` or `FROM=TO`.
fn parse_relocation(spec: &str, excludes: &[String]) -> Result<SimpleRelocator> {
    let relocator = match spec.split_once('=') {
        Some((from, to)) => SimpleRelocator::new(from)?.shaded_pattern(to)?,
        None => SimpleRelocator::new(spec)?,
    };
    relocator.excludes(excludes)
}
