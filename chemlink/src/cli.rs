use std::path::PathBuf;

use chemlink_config::Config;
use clap::{Parser, Subcommand};

/// Command line interface for chemlink
#[derive(Parser, Debug)]
#[command(
  author,
  version,
  about = "Turns links to chemistry structure files into JSmol viewers"
)]
pub struct Cli {
  /// Subcommand to execute (see [`Commands`])
  #[command(subcommand)]
  pub command: Option<Commands>,

  /// Enable verbose debug logging
  #[arg(short, long)]
  pub verbose: bool,

  /// Path to configuration file(s) (TOML or JSON, can be specified multiple
  /// times) Multiple files are merged in order, with later files overriding
  /// earlier ones
  #[arg(short = 'c', long = "config-file", action = clap::ArgAction::Append)]
  pub config_files: Vec<PathBuf>,

  /// Override configuration values (KEY=VALUE format, can be used multiple
  /// times)
  #[arg(long = "config", action = clap::ArgAction::Append)]
  pub config_overrides: Vec<String>,
}

/// All supported subcommands for the chemlink CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Initialize a new chemlink configuration file
  Init {
    /// Path to create the configuration file at
    #[arg(short, long, default_value = "chemlink.toml")]
    output: PathBuf,

    /// Format of the configuration file.
    #[arg(short = 'F', long, default_value = "toml", value_parser = ["toml", "json"])]
    format: String,

    /// Force overwrite if file already exists
    #[arg(short, long)]
    force: bool,
  },

  /// Rewrite structure-file links in a directory of HTML pages.
  Filter {
    /// Directory containing the rendered HTML pages.
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Output directory for filtered pages.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Host (or root URL) whose absolute links are rewritten.
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Platform locale used to pick the viewer language.
    #[arg(short, long)]
    locale: Option<String>,

    /// Number of threads to use for parallel processing.
    #[arg(short = 'p', long = "jobs")]
    jobs: Option<usize>,
  },

  /// List the structure-file links in a page without rewriting anything.
  Scan {
    /// HTML file to scan.
    file: PathBuf,
  },
}

impl Commands {
  /// Apply command line flags on top of `config`.
  pub fn merge_into(&self, config: &mut Config) {
    if let Self::Filter {
      input_dir,
      output_dir,
      host,
      locale,
      jobs,
    } = self
    {
      if let Some(dir) = input_dir {
        config.input_dir = Some(dir.clone());
      }
      if let Some(dir) = output_dir {
        config.output_dir.clone_from(dir);
      }
      if let Some(host) = host {
        config.wwwroot = if host.contains("://") {
          host.clone()
        } else {
          format!("http://{host}")
        };
      }
      if let Some(locale) = locale {
        config.locale.clone_from(locale);
      }
      if jobs.is_some() {
        config.jobs = *jobs;
      }
    }
  }
}

impl Cli {
  /// Parse command line arguments into a [`Cli`] struct.
  #[must_use]
  pub fn parse_args() -> Self {
    Self::parse()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_filter_flags_override_config() {
    let cli = Cli::parse_from([
      "chemlink",
      "--config",
      "locale=fr",
      "filter",
      "--input-dir",
      "site",
      "--host",
      "school.example",
      "-p",
      "2",
    ]);
    assert_eq!(cli.config_overrides, ["locale=fr"]);

    let mut config = Config::default();
    if let Some(command) = &cli.command {
      command.merge_into(&mut config);
    }

    assert_eq!(config.input_dir, Some(PathBuf::from("site")));
    assert_eq!(config.wwwroot, "http://school.example");
    assert_eq!(config.host(), "school.example");
    assert_eq!(config.jobs, Some(2));
    assert_eq!(config.output_dir, PathBuf::from("build"));
  }

  #[test]
  fn test_host_flag_accepts_url() {
    let cli =
      Cli::parse_from(["chemlink", "filter", "--host", "https://a.example/m"]);
    let mut config = Config::default();
    if let Some(command) = &cli.command {
      command.merge_into(&mut config);
    }
    assert_eq!(config.wwwroot, "https://a.example/m");
  }

  #[test]
  fn test_init_defaults() {
    let cli = Cli::parse_from(["chemlink", "-v", "init"]);
    assert!(cli.verbose);
    assert!(matches!(
      cli.command,
      Some(Commands::Init { ref output, ref format, force: false })
        if output == &PathBuf::from("chemlink.toml") && format == "toml"
    ));
  }
}
