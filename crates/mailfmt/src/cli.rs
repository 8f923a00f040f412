//! Command-line interface definitions for mailfmt.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use expando::{
    Definition,
    domain::{
        alias::{ALIAS_FORMAT, QUERY_FORMAT},
        folder::FOLDER_FORMAT,
        index::INDEX_FORMAT,
        status::STATUS_FORMAT,
    },
};
use logging::LogArgs;

use crate::rc::Event;

/// Command-line interface for the `mailfmt` binary.
#[derive(Parser, Debug)]
#[command(
    name = "mailfmt",
    about = "Try out mail format strings, patterns and hooks against fixtures",
    version
)]
pub struct Cli {
    /// Logging controls.
    #[command(flatten)]
    pub log: LogArgs,

    /// What to do.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a format string for every row of a fixture.
    Render(RenderArgs),
    /// List the messages of a fixture that match a pattern.
    Search(SearchArgs),
    /// Source a hook rc file and fire events against a fixture.
    Hooks(HooksArgs),
    /// Generate a Message-Id.
    MessageId(MessageIdArgs),
}

/// Which table a format string is parsed against, and which rows it renders.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    /// `index_format`: one line per message.
    Index,
    /// `alias_format`: one line per alias.
    Alias,
    /// `query_format`: one line per alias.
    Query,
    /// `status_format`: a single line.
    Status,
    /// `folder_format`: one line per browser entry.
    Folder,
}

impl FormatKind {
    /// The codes this kind of string may use.
    pub fn definitions(self) -> &'static [Definition] {
        match self {
            Self::Index => INDEX_FORMAT,
            Self::Alias => ALIAS_FORMAT,
            Self::Query => QUERY_FORMAT,
            Self::Status => STATUS_FORMAT,
            Self::Folder => FOLDER_FORMAT,
        }
    }
}

/// Arguments for the `render` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// The format string, e.g. `%4C %-15.15L %s`.
    pub format: String,

    /// Table to parse against.
    #[arg(long, value_enum, default_value = "index")]
    pub kind: FormatKind,

    /// RON fixture with the rows to render.
    #[arg(long, value_name = "PATH")]
    pub fixture: Option<PathBuf>,

    /// Screen width in columns; unbounded when unset.
    #[arg(long, value_name = "COLS")]
    pub width: Option<usize>,

    /// Hook rc file to source first, for `%@name@` index-format hooks.
    #[arg(long, value_name = "PATH")]
    pub rc: Option<PathBuf>,

    /// Print the parsed tree as JSON instead of rendering.
    #[arg(long, conflicts_with = "dump")]
    pub ast: bool,

    /// Print the canonical debug form of the tree instead of rendering.
    #[arg(long)]
    pub dump: bool,
}

/// Arguments for the `search` subcommand.
#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// The pattern, e.g. `~f bob ~d<1w`. A plain word searches from and subject.
    pub pattern: String,

    /// RON fixture with the messages to search.
    #[arg(long, value_name = "PATH")]
    pub fixture: Option<PathBuf>,

    /// Search the fixture's aliases instead of its messages.
    #[arg(long)]
    pub aliases: bool,

    /// Allow header and body searches.
    #[arg(long)]
    pub full: bool,

    /// Address operators also match display names.
    #[arg(long)]
    pub full_address: bool,

    /// Message under the cursor, for `.` in message ranges.
    #[arg(long, value_name = "N")]
    pub current: Option<usize>,

    /// Index format for each matching message.
    #[arg(long, default_value = "%4C %-15.15L %s")]
    pub format: String,
}

/// Arguments for the `hooks` subcommand.
#[derive(Args, Debug, Clone)]
pub struct HooksArgs {
    /// The rc file to source.
    pub rc: PathBuf,

    /// RON fixture with messages and settings.
    #[arg(long, value_name = "PATH")]
    pub fixture: Option<PathBuf>,

    /// Events to fire in order, e.g. `startup`, `folder:=inbox`, `send:1`,
    /// `save:2`, `fcc:1`, `mbox:=inbox`, `crypt:bob@x.org`.
    #[arg(long = "event", value_name = "EVENT")]
    pub events: Vec<Event>,

    /// Print the hooks that are defined after sourcing.
    #[arg(long)]
    pub list: bool,
}

/// Arguments for the `message-id` subcommand.
#[derive(Args, Debug, Clone)]
pub struct MessageIdArgs {
    /// `message_id_format`, e.g. `%Y%m%d%H%M%S.%r3@%h`. Random when unset.
    #[arg(long)]
    pub format: Option<String>,

    /// Hostname for `%h`.
    #[arg(long, default_value = "localhost")]
    pub hostname: String,

    /// RON fixture supplying the clock and hostname.
    #[arg(long, value_name = "PATH")]
    pub fixture: Option<PathBuf>,

    /// How many ids to generate.
    #[arg(long, default_value_t = 1)]
    pub count: usize,
}
