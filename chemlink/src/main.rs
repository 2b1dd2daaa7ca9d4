use std::fs;

use chemlink::{
  cli::{Cli, Commands},
  pages,
  scan,
};
use chemlink_config::Config;
use color_eyre::eyre::{Context, Result, bail};
use log::{LevelFilter, info, warn};

fn main() -> Result<()> {
  color_eyre::install()?;

  let cli = Cli::parse_args();

  // Initialize logging first so we can log during command handling
  env_logger::Builder::new()
    .filter_level(if cli.verbose {
      LevelFilter::Debug
    } else {
      LevelFilter::Info
    })
    .write_style(env_logger::WriteStyle::Always)
    .init();

  if let Some(Commands::Init {
    output,
    format,
    force,
  }) = &cli.command
  {
    if output.exists() && !force {
      bail!(
        "Configuration file already exists: {}. Use --force to overwrite.",
        output.display()
      );
    }

    if let Some(parent) = output.parent()
      && !parent.as_os_str().is_empty()
      && !parent.exists()
    {
      fs::create_dir_all(parent).wrap_err_with(|| {
        format!("Failed to create directory: {}", parent.display())
      })?;
      info!("Created directory: {}", parent.display());
    }

    Config::generate_default_config(format, output).wrap_err_with(|| {
      format!(
        "Failed to generate configuration file: {}",
        output.display()
      )
    })?;

    info!("Configuration file created successfully. Edit it to fit your site.");
    return Ok(());
  }

  let mut config = Config::load(&cli.config_files, &cli.config_overrides)?;
  if let Some(command) = &cli.command {
    command.merge_into(&mut config);
  }

  if let Some(Commands::Scan { file }) = &cli.command {
    let entries = scan::scan_file(&config, file)?;
    for entry in &entries {
      info!(
        "{} [{}] size={} controls={} language={}{}",
        entry.url,
        entry.extension,
        entry.options.size,
        entry.options.control_set,
        entry.options.language,
        if entry.options.init_script.is_empty() {
          String::new()
        } else {
          format!(" script='{}'", entry.options.init_script)
        }
      );
      if let Some(ref stored) = entry.stored {
        info!(
          "  stored file: context {} {}/{} item {} {}{}",
          stored.context_id,
          stored.component,
          stored.area,
          stored.item_id,
          stored.file_path,
          stored.filename
        );
      }
    }
    info!("Found {} link(s) in {}", entries.len(), file.display());
    return Ok(());
  }

  config.validate()?;

  info!("Filtering pages...");
  let report = pages::filter_site(&config)?;
  if report.pages == 0 {
    warn!("No HTML pages found");
  }
  info!(
    "Embedded {} viewer(s) in {} of {} page(s), copied {} other file(s) to {}",
    report.links,
    report.rewritten,
    report.pages,
    report.copied,
    config.output_dir.display()
  );

  Ok(())
}
