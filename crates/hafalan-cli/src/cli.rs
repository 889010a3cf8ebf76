use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell;

use hafalan_core::VERSION;

/// Hafalan - Quran memorization tracker for classes and halaqah groups
#[derive(Parser)]
#[command(name = "hafalan")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the student store (CSV directory or SQLite file)
    #[arg(short, long, global = true, env = "HAFALAN_STORE")]
    pub store: Option<String>,

    /// Store backend (csv or sqlite), overrides the config file
    #[arg(long, global = true, env = "HAFALAN_BACKEND")]
    pub backend: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log more to stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Use ASCII symbols and table borders only
    #[arg(long, global = true)]
    pub ascii: bool,
}

/// Output selection shared by read commands.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Output JSON
    #[arg(long)]
    pub json: bool,

    /// Output format (table or plain)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Store location (defaults under the XDG data directory)
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Store backend (csv or sqlite)
    #[arg(long = "with-backend", value_name = "BACKEND")]
    pub with_backend: Option<String>,

    /// Identity strategy for new students (sequence, external or uuid)
    #[arg(long)]
    pub identity: Option<String>,

    /// Overwrite policy for recitations (last_write_wins or keep_passed)
    #[arg(long)]
    pub overwrite: Option<String>,

    /// Curriculum TOML file (defaults to Juz 'Amma)
    #[arg(long)]
    pub curriculum: Option<String>,

    /// Timezone used to display timestamps (IANA name)
    #[arg(long)]
    pub timezone: Option<String>,

    /// Default recorder name for `record`
    #[arg(long)]
    pub recorder: Option<String>,

    /// Replace an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `chapters` command
#[derive(Args)]
pub struct ChaptersArgs {
    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for `student add`
#[derive(Args)]
pub struct StudentAddArgs {
    /// Full name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Class or group
    #[arg(short, long)]
    pub class: String,

    /// External identifier (NIS)
    #[arg(short = 'x', long = "external-id", value_name = "ID")]
    pub external_id: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for `student list`
#[derive(Args)]
pub struct StudentListArgs {
    /// Only students in this class
    #[arg(short, long)]
    pub class: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for `student edit`
#[derive(Args)]
pub struct StudentEditArgs {
    /// Student id or external id
    #[arg(value_name = "STUDENT")]
    pub student: String,

    /// New name
    #[arg(long)]
    pub name: Option<String>,

    /// New class
    #[arg(short, long)]
    pub class: Option<String>,

    /// New external identifier
    #[arg(short = 'x', long = "external-id", value_name = "ID")]
    pub external_id: Option<String>,

    /// Remove the external identifier
    #[arg(long, conflicts_with = "external_id")]
    pub clear_external_id: bool,
}

/// Arguments for `student delete`
#[derive(Args)]
pub struct StudentDeleteArgs {
    /// Student id or external id
    #[arg(value_name = "STUDENT")]
    pub student: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for `student import`
#[derive(Args)]
pub struct StudentImportArgs {
    /// CSV file (`,` or `;` separated) with name and class columns
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Parse and report without saving
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Subcommand)]
pub enum StudentCommands {
    /// Register a student with an empty ledger
    Add(StudentAddArgs),

    /// List students
    #[command(alias = "ls")]
    List(StudentListArgs),

    /// Change a student's name, class or external id
    Edit(StudentEditArgs),

    /// Remove a student and their recitation log
    #[command(alias = "rm")]
    Delete(StudentDeleteArgs),

    /// Bulk-register students from a CSV file
    Import(StudentImportArgs),
}

/// Arguments for the `record` command
#[derive(Args)]
pub struct RecordArgs {
    /// Student id or external id
    #[arg(value_name = "STUDENT")]
    pub student: String,

    /// Chapter name or number
    #[arg(value_name = "CHAPTER")]
    pub chapter: String,

    /// Verse or range, e.g. `5` or `1-10`
    #[arg(value_name = "VERSES")]
    pub verses: String,

    /// Status to write (passed, repeating, not-done)
    #[arg(value_name = "STATUS", default_value = "passed")]
    pub status: String,

    /// Teacher's note
    #[arg(short, long)]
    pub note: Option<String>,

    /// Who listened to the recitation
    #[arg(short, long)]
    pub recorder: Option<String>,

    /// Overwrite policy for this update (last_write_wins or keep_passed)
    #[arg(long)]
    pub overwrite: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for the `show` command
#[derive(Args)]
pub struct ShowArgs {
    /// Student id or external id (prompts when omitted on a terminal)
    #[arg(value_name = "STUDENT")]
    pub student: Option<String>,

    /// Only this chapter, verse by verse
    #[arg(long)]
    pub chapter: Option<String>,

    /// Include chapters that have not been started
    #[arg(short, long)]
    pub all: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for the `leaderboard` command
#[derive(Args)]
pub struct LeaderboardArgs {
    /// Only students in this class
    #[arg(short, long)]
    pub class: Option<String>,

    /// Show at most this many rows
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for the `report` command
#[derive(Args)]
pub struct ReportArgs {
    /// Only students in this class
    #[arg(short, long)]
    pub class: Option<String>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,

    /// Output format (table, plain or csv)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Write the report to a file instead of stdout (CSV)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<String>,
}

/// Arguments for the `log` command
#[derive(Args)]
pub struct LogArgs {
    /// Only this student (id or external id)
    #[arg(long)]
    pub student: Option<String>,

    /// Only students in this class
    #[arg(short, long, conflicts_with = "student")]
    pub class: Option<String>,

    /// Only this chapter
    #[arg(long)]
    pub chapter: Option<String>,

    /// Only entries on or after this date/time (ISO-8601)
    #[arg(long)]
    pub since: Option<String>,

    /// Show at most this many entries
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for the `check` command
#[derive(Args)]
pub struct CheckArgs {
    /// Repair ledgers in place and save
    #[arg(long)]
    pub repair: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the config file and create an empty store
    Init(InitArgs),

    /// List the curriculum chapters
    Chapters(ChaptersArgs),

    /// Manage students
    #[command(subcommand)]
    Student(StudentCommands),

    /// Record a recitation result for a verse range
    Record(RecordArgs),

    /// Show one student's progress
    Show(ShowArgs),

    /// Rank students by passed verses
    Leaderboard(LeaderboardArgs),

    /// Class progress report
    Report(ReportArgs),

    /// Show the recitation log
    Log(LogArgs),

    /// Audit every ledger against the curriculum
    Check(CheckArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
