//! Purpose: `tabulite` CLI entry point and argument surface.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Commands emit stable stdout formats (human on a TTY, JSON otherwise).
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `core::error::to_exit_code`.
//! Invariants: All table mutations go through `core::registry::Registry`.
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod render;

use tabulite::core::error::{Error, ErrorKind, to_exit_code};
use tabulite::core::registry::Registry;
use tabulite::core::row::{Cell, Row};
use tabulite::core::store::ColumnOrder;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage).with_message(err.to_string()));
            }
        },
    };

    let table_dir = cli.dir.unwrap_or_else(default_table_dir);
    command_dispatch::dispatch_command(cli.command, table_dir)
}

fn default_table_dir() -> PathBuf {
    let home = std::env::var_os("HOME").unwrap_or_default();
    PathBuf::from(home).join(".tabulite").join("tables")
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "tabulite",
    version,
    about = "Embedded schema-normalizing JSON table store"
)]
struct Cli {
    /// Directory holding the table files (default: ~/.tabulite/tables).
    #[arg(long, global = true, value_name = "DIR")]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate shell completions.
    Completion { shell: Shell },
    /// Create a table (idempotent; never truncates an existing one).
    Create { table: String },
    /// List tables present on disk.
    List,
    /// Delete a table's backing file.
    Drop { table: String },
    /// Insert one or more rows, closing the schema over all columns.
    Insert {
        table: String,
        /// Row as a JSON object; repeatable.
        #[arg(long = "row", value_name = "JSON", required = true)]
        rows: Vec<String>,
    },
    /// Print all rows (table on a TTY, JSON lines otherwise).
    Rows { table: String },
    /// Rows where a column equals a JSON value.
    Find {
        table: String,
        column: String,
        value: String,
    },
    /// Merge a patch into rows where a column equals a JSON value.
    Update {
        table: String,
        column: String,
        value: String,
        /// Patch as a JSON object.
        #[arg(long = "set", value_name = "JSON")]
        patch: String,
    },
    /// Delete rows where a column equals a JSON value.
    Delete {
        table: String,
        column: String,
        value: String,
    },
    /// Rename a column in every row that has it.
    Rename {
        table: String,
        old: String,
        new: String,
    },
    /// Sort rows by a column and persist the ordering.
    Sort {
        table: String,
        column: String,
        #[arg(long)]
        reverse: bool,
    },
    /// Reorder columns to match a reference row's value ordering; persists.
    SortColumns {
        table: String,
        reference_row: usize,
        #[arg(long)]
        reverse: bool,
    },
    /// Reorder columns by a JSON name list or priority map; persists.
    OrderColumns { table: String, order: String },
    /// Render the table for humans.
    Show { table: String },
}

fn parse_json_value(text: &str, what: &str) -> Result<Value, Error> {
    serde_json::from_str(text).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("{what} is not valid JSON"))
            .with_hint(format!("Got `{text}`. Quote strings: '\"alice\"'."))
            .with_source(err)
    })
}

fn parse_cell(text: &str) -> Result<Cell, Error> {
    Cell::from_json(&parse_json_value(text, "value")?)
}

fn parse_row(text: &str) -> Result<Row, Error> {
    Row::from_json(&parse_json_value(text, "row")?)
}

fn emit_json(value: Value) {
    let json = serde_json::to_string(&value).unwrap_or_else(|_| "{}".to_string());
    println!("{json}");
}

fn emit_rows(rows: &[Row]) {
    for row in rows {
        let json = serde_json::to_string(row).unwrap_or_else(|_| "{}".to_string());
        println!("{json}");
    }
}

fn emit_rows_or_table(rows: &[Row]) {
    if io::stdout().is_terminal() && !rows.is_empty() {
        print!("{}", render::render_table(rows));
    } else {
        emit_rows(rows);
    }
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {err}");
        if let Some(hint) = err.hint() {
            eprintln!("hint: {hint}");
        }
        return;
    }

    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_message(err: &Error) -> String {
    err.message()
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string())
}
