use clap::{ArgAction, Parser, Subcommand};

const CMD_NAME: &str = "fpr";
const DEFAULT_DATA_TYPE: &str = "DDA";

/// Stores our command-line args format.
#[derive(Parser)]
#[command(name = CMD_NAME, version, about = "Run FragPipe headless and prepare its manifests", long_about = None)]
pub struct Args {
    /// Bypass user confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Print additional debugging info (repeat for more)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub action: ArgsAction,
}

#[derive(Subcommand)]
pub enum ArgsAction {
    /// Convert an SDRF file into a FragPipe manifest
    Manifest {
        /// SDRF file (tab-separated, with header)
        #[arg(short, long, value_name = "FILE")]
        sdrf: String,

        /// Manifest file to write
        #[arg(short, long, value_name = "FILE")]
        output: String,

        /// Acquisition type; only DDA is supported
        #[arg(short, long, value_name = "TYPE", default_value = DEFAULT_DATA_TYPE)]
        data_type: String,

        /// SDRF column holding the experiment label
        #[arg(short, long, value_name = "COLUMN")]
        experiment_field: String,

        /// SDRF column holding the replicate label
        #[arg(short, long, value_name = "COLUMN")]
        replicate_field: String,

        /// SDRF column holding the raw file name (first one found is used)
        #[arg(long = "rawfile-field", value_name = "COLUMN")]
        rawfile_fields: Vec<String>,

        /// SDRF column holding the fraction number
        #[arg(long, value_name = "COLUMN")]
        fraction_field: Option<String>,
    },

    /// Point the raw file paths of a manifest at files in a directory
    Relink {
        /// Manifest file to rewrite in place
        #[arg(short, long, value_name = "FILE")]
        manifest: String,

        /// Directory containing the raw files
        #[arg(short, long, value_name = "DIR")]
        rawfile_dir: String,

        /// Keep the old path of raw files that aren't found instead of failing
        #[arg(long)]
        skip_missing: bool,
    },

    /// Run FragPipe in headless mode
    Run {
        /// FragPipe installation directory
        #[arg(short, long, value_name = "DIR")]
        #[arg(env = "FRAGPIPE_DIR")]
        fragpipe_dir: String,

        /// Workflow file
        #[arg(short, long, value_name = "FILE")]
        workflow: String,

        /// Manifest file
        #[arg(short, long, value_name = "FILE")]
        manifest: String,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: String,

        /// Memory limit in GB (0 lets FragPipe decide)
        #[arg(long, value_name = "GB", default_value_t = 0)]
        ram: u32,

        /// Number of threads (default lets FragPipe decide)
        #[arg(short, long, value_name = "N")]
        threads: Option<u32>,

        /// Write results here first and move them to the output directory afterwards
        #[arg(long, value_name = "DIR")]
        temp_dir: Option<String>,

        /// TOML file overriding FragPipe's command-line flag names
        #[arg(long, value_name = "FILE")]
        #[arg(env = "FRAGPIPE_CLI_CONFIG")]
        cli_config: Option<String>,

        /// Dry run; print the command but don't run it.
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Check whether an output directory holds FragPipe results
    Check {
        /// FragPipe output directory
        #[arg(short, long, value_name = "DIR")]
        output: String,
    },

    /// Delete FragPipe's temporary files from a raw file directory
    Clean {
        /// Directory containing the raw files
        #[arg(short, long, value_name = "DIR")]
        rawfile_dir: String,
    },
}
