//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use workstate_core::{CodeTool, DEFAULT_COMPRESSION_LEVEL};
use workstate_remote::DEFAULT_SHARE_HOURS;

/// Workstate - save, share and restore project snapshots
#[derive(Parser, Debug)]
#[command(name = "workstate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to the credentials file (default: ~/.workstate/config.json)
    #[arg(short, long, global = true, env = "WORKSTATE_CONFIG")]
    pub config: Option<Utf8PathBuf>,

    /// Project directory
    #[arg(short = 'C', long = "dir", global = true, default_value = ".")]
    pub dir: Utf8PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a .workstateignore from a template
    Init(InitArgs),

    /// Set the storage credentials
    Configure(ConfigureArgs),

    /// Show the configured credentials
    Config,

    /// Show which files a snapshot would contain
    Status(StatusArgs),

    /// Upload a snapshot of the project
    Save(SaveArgs),

    /// List saved snapshots
    List(ListArgs),

    /// Restore a snapshot into the project
    Download(DownloadArgs),

    /// Delete a saved snapshot
    Delete(DeleteArgs),

    /// Create a temporary download link for a snapshot
    Share(ShareArgs),

    /// Download (and extract) a snapshot from a shared link
    DownloadUrl(DownloadUrlArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Development tool to take the template from (prompted if omitted)
    #[arg(short, long, value_enum)]
    pub tool: Option<Tool>,

    /// Overwrite an existing .workstateignore
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Tool {
    Node,
    React,
    Angular,
    Java,
    C,
    #[value(name = "c++", alias = "cpp")]
    Cpp,
    #[value(name = "c#", alias = "csharp")]
    CSharp,
    Php,
    Python,
    Default,
}

impl Tool {
    /// Convert CLI tool enum to the library tool type.
    pub fn to_lib_tool(self) -> CodeTool {
        match self {
            Tool::Node => CodeTool::Node,
            Tool::React => CodeTool::React,
            Tool::Angular => CodeTool::Angular,
            Tool::Java => CodeTool::Java,
            Tool::C => CodeTool::C,
            Tool::Cpp => CodeTool::Cpp,
            Tool::CSharp => CodeTool::CSharp,
            Tool::Php => CodeTool::Php,
            Tool::Python => CodeTool::Python,
            Tool::Default => CodeTool::Default,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct ConfigureArgs {
    /// Access key ID
    #[arg(long)]
    pub access_key_id: Option<String>,

    /// Secret access key
    #[arg(long)]
    pub secret_access_key: Option<String>,

    /// Region, e.g. us-east-1
    #[arg(long)]
    pub region: Option<String>,

    /// Bucket that holds the snapshots
    #[arg(long)]
    pub bucket: Option<String>,

    /// Endpoint of an S3-compatible service
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Never prompt; missing values keep their stored value
    #[arg(long)]
    pub no_input: bool,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only print the summary
    #[arg(short, long)]
    pub summary: bool,
}

#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Snapshot name; stored as <label>.zip
    pub label: String,

    /// Append -YYYYMMDD-HHMMSS to the label
    #[arg(long)]
    pub timestamp: bool,

    /// Compression level (1-9)
    #[arg(long, default_value_t = DEFAULT_COMPRESSION_LEVEL, value_parser = clap::value_parser!(u32).range(1..=9))]
    pub compression: u32,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show snapshots matching a glob, e.g. "client-*"
    #[arg(short, long)]
    pub filter: Option<String>,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Snapshot to restore (prompted if omitted)
    pub key: Option<String>,

    /// Save the archive to downloads/ without extracting it
    #[arg(long)]
    pub only_download: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Snapshot to delete (prompted if omitted)
    pub key: Option<String>,

    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct ShareArgs {
    /// Snapshot to share (prompted if omitted)
    pub key: Option<String>,

    /// Link lifetime in hours
    #[arg(long, default_value_t = DEFAULT_SHARE_HOURS)]
    pub hours: u64,
}

#[derive(Args, Debug)]
pub struct DownloadUrlArgs {
    /// Shared link produced by `workstate share`
    pub url: String,

    /// Keep the downloaded archive without extracting it
    #[arg(long)]
    pub no_extract: bool,

    /// Keep the archive after extracting it
    #[arg(long)]
    pub keep: bool,

    /// Where to save the archive (default: file name from the link, in the project directory)
    #[arg(short, long)]
    pub output: Option<Utf8PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["workstate", "-vv", "-C", "/tmp/p", "status"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.dir, Utf8PathBuf::from("/tmp/p"));
        assert!(matches!(cli.command, Commands::Status(StatusArgs { summary: false })));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["workstate", "-q", "-v", "list"]).is_err());
    }

    #[test]
    fn test_save_args() {
        let cli =
            Cli::try_parse_from(["workstate", "save", "my app", "--timestamp"]).unwrap();
        match cli.command {
            Commands::Save(args) => {
                assert_eq!(args.label, "my app");
                assert!(args.timestamp);
                assert_eq!(args.compression, DEFAULT_COMPRESSION_LEVEL);
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Cli::try_parse_from(["workstate", "save"]).is_err());
        assert!(Cli::try_parse_from(["workstate", "save", "x", "--compression", "0"]).is_err());
    }

    #[test]
    fn test_init_tool_names() {
        for (raw, expected) in [
            ("node", CodeTool::Node),
            ("c++", CodeTool::Cpp),
            ("cpp", CodeTool::Cpp),
            ("c#", CodeTool::CSharp),
            ("python", CodeTool::Python),
        ] {
            let cli = Cli::try_parse_from(["workstate", "init", "--tool", raw]).unwrap();
            match cli.command {
                Commands::Init(args) => assert_eq!(args.tool.map(Tool::to_lib_tool), Some(expected)),
                other => panic!("unexpected command {:?}", other),
            }
        }

        assert!(Cli::try_parse_from(["workstate", "init", "--tool", "cobol"]).is_err());
    }

    #[test]
    fn test_every_tool_maps_to_a_template() {
        for tool in Tool::value_variants() {
            let name = tool.to_possible_value().unwrap().get_name().to_string();
            assert_eq!(tool.to_lib_tool().as_str(), name);
        }
    }

    #[test]
    fn test_share_default_hours() {
        let cli = Cli::try_parse_from(["workstate", "share", "a.zip"]).unwrap();
        match cli.command {
            Commands::Share(args) => {
                assert_eq!(args.key.as_deref(), Some("a.zip"));
                assert_eq!(args.hours, 24);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_download_url_flags() {
        let cli = Cli::try_parse_from([
            "workstate",
            "download-url",
            "https://example.com/a.zip",
            "--no-extract",
        ])
        .unwrap();
        match cli.command {
            Commands::DownloadUrl(args) => {
                assert!(args.no_extract);
                assert!(!args.keep);
                assert!(args.output.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_delete_without_key_is_interactive() {
        let cli = Cli::try_parse_from(["workstate", "delete", "--yes"]).unwrap();
        match cli.command {
            Commands::Delete(args) => {
                assert!(args.key.is_none());
                assert!(args.yes);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
