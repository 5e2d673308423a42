use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::auth::DEFAULT_PORT;
use crate::config::{
    Mode, Options, DEFAULT_APP_FILE, DEFAULT_FORMATTER, DEFAULT_USER_OPTS_FILE,
};
use crate::paths::{DEFAULT_OUTPUT_DIR, DEFAULT_SRC_DIR};

#[derive(Parser)]
#[command(name = "release-notes")]
#[command(about = "Build HTML release notes from the issues of a Jira sprint", version)]
#[command(after_help = "EXAMPLES:
    release-notes get -j proj.json          Fetch the sprint's issues into a working file
    release-notes make -j proj.json -f working-PROJ-sprint-7-1700000000000.json
    release-notes show src/PROJ/working/working-PROJ-sprint-7-1700000000000.json
    release-notes init                      Write user.json and app.json")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the options and credential files (default: ./opts)
    #[arg(long, global = true, env = "RELEASE_NOTES_OPTS_DIR")]
    pub opts_dir: Option<PathBuf>,

    /// JIRA options file inside the options directory
    #[arg(long, short = 'j', global = true)]
    pub jira_opts_file: Option<String>,

    /// User credentials file inside the options directory
    #[arg(long, short = 'u', global = true, default_value = DEFAULT_USER_OPTS_FILE)]
    pub user_opts_file: String,

    /// App credentials file inside the options directory
    #[arg(long, global = true, default_value = DEFAULT_APP_FILE)]
    pub app_file: String,

    /// Formatter used to render release notes
    #[arg(long, global = true, default_value = DEFAULT_FORMATTER)]
    pub output_formatter: String,

    /// Root directory for raw snapshots and working files
    #[arg(long, global = true, default_value = DEFAULT_SRC_DIR)]
    pub src_dir: PathBuf,

    /// Root directory for rendered release notes
    #[arg(long, global = true, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Show debug logging and detailed error information
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Options given on the command line, before the JIRA options file is
    /// merged over them.
    pub fn options(&self, mode: Mode, file: Option<String>) -> Options {
        Options {
            mode,
            output_formatter: self.output_formatter.clone(),
            user_opts_file: self.user_opts_file.clone(),
            app_file: self.app_file.clone(),
            jira_opts_file: self.jira_opts_file.clone(),
            file,
            ..Options::default()
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the sprint's issues and write a working file
    #[command(after_help = "EXAMPLES:
    release-notes get -j proj.json
    release-notes get -j proj.json --port 9000
    release-notes get -j proj.json --local")]
    Get(GetArgs),
    /// Render release notes from a working file
    #[command(after_help = "EXAMPLES:
    release-notes make -j proj.json -f working-PROJ-sprint-7-1700000000000.json
    release-notes make -f ./saved/working.json --output-dir site")]
    Make(MakeArgs),
    /// List the issues in a working file
    #[command(after_help = "EXAMPLES:
    release-notes show src/PROJ/working/working-PROJ-sprint-7-1700000000000.json
    release-notes show working.json --json")]
    Show {
        /// Path to the working file
        file: PathBuf,
    },
    /// Write the credential files interactively
    Init,
    /// Generate shell completions
    #[command(after_help = "EXAMPLES:
    release-notes completions bash > ~/.bash_completion.d/release-notes
    release-notes completions zsh > ~/.zfunc/_release-notes")]
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Args, Clone)]
pub struct GetArgs {
    /// Normalize the existing raw snapshot instead of fetching from Jira
    #[arg(long)]
    pub local: bool,

    /// Port of the local listener receiving the OAuth redirect
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

#[derive(Args, Clone)]
pub struct MakeArgs {
    /// Working file name (inside <src>/<project>/working) or path
    #[arg(long, short)]
    pub file: String,
}
