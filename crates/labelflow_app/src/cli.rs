use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Upload ZIP archives of images to a LabelFlow service and fetch the labelled results.
#[derive(Parser, Debug)]
#[command(name = "labelflow", version)]
pub struct Cli {
    /// Config file (RON). Defaults to ./labelflow.ron when present.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Base url of the processing service.
    #[arg(long)]
    pub base_url: Option<String>,
    /// Where downloaded results are saved.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,
    /// Give up polling after this many seconds (0 = never).
    #[arg(long)]
    pub max_poll_secs: Option<u64>,
    /// Give up after this many failed polls in a row (0 = never).
    #[arg(long)]
    pub max_poll_failures: Option<u32>,
    /// Log destination: file, terminal, both or off.
    #[arg(long)]
    pub log: Option<String>,
    #[arg(long)]
    pub no_color: bool,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Upload one archive, wait for processing and download the result.
    Run {
        file: PathBuf,
        #[arg(long, default_value = "")]
        prompt: String,
    },
    /// Flip the stored light/dark preference.
    Theme,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_subcommand_parses() {
        let cli = Cli::parse_from(["labelflow", "run", "photos.zip", "--prompt", "find dogs"]);
        assert_eq!(
            cli.command,
            Some(Command::Run {
                file: PathBuf::from("photos.zip"),
                prompt: "find dogs".to_string(),
            })
        );
    }

    #[test]
    fn interactive_is_the_default() {
        let cli = Cli::parse_from(["labelflow", "--log", "both"]);
        assert_eq!(cli.command, None);
        assert_eq!(cli.log.as_deref(), Some("both"));
    }
}
