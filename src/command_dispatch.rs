//! Purpose: Hold top-level CLI command dispatch for `tabulite`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Stdout payloads are stable JSON envelopes (or human tables on a TTY).
//! Invariants: Sort/reorder commands persist through the registry pass-throughs.

use super::*;

pub(super) fn dispatch_command(command: Command, table_dir: PathBuf) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "tabulite", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Create { table } => {
            let mut registry = Registry::open(&table_dir)?;
            let store = registry.create(&table)?;
            emit_json(json!({
                "created": {
                    "table": table,
                    "path": store.path().display().to_string(),
                }
            }));
            Ok(RunOutcome::ok())
        }
        Command::List => {
            let registry = Registry::open(&table_dir)?;
            emit_json(json!({ "tables": registry.list()? }));
            Ok(RunOutcome::ok())
        }
        Command::Drop { table } => {
            let mut registry = Registry::open(&table_dir)?;
            emit_json(json!({ "dropped": registry.delete(&table)? }));
            Ok(RunOutcome::ok())
        }
        Command::Insert { table, rows } => {
            let parsed = rows
                .iter()
                .map(|text| parse_row(text))
                .collect::<Result<Vec<_>, _>>()?;
            let mut registry = Registry::open(&table_dir)?;
            let count = parsed.len();
            registry.resolve(&table)?.insert_many(parsed)?;
            emit_json(json!({ "inserted": count }));
            Ok(RunOutcome::ok())
        }
        Command::Rows { table } => {
            let mut registry = Registry::open(&table_dir)?;
            let rows = registry.resolve(&table)?.get_all()?;
            emit_rows_or_table(&rows);
            Ok(RunOutcome::ok())
        }
        Command::Find {
            table,
            column,
            value,
        } => {
            let mut registry = Registry::open(&table_dir)?;
            let rows = registry
                .resolve(&table)?
                .find_by(&column, &parse_cell(&value)?)?;
            emit_rows(&rows);
            Ok(RunOutcome::ok())
        }
        Command::Update {
            table,
            column,
            value,
            patch,
        } => {
            let mut registry = Registry::open(&table_dir)?;
            let count =
                registry
                    .resolve(&table)?
                    .update_by(&column, &parse_cell(&value)?, &parse_row(&patch)?)?;
            emit_json(json!({ "updated": count }));
            Ok(RunOutcome::ok())
        }
        Command::Delete {
            table,
            column,
            value,
        } => {
            let mut registry = Registry::open(&table_dir)?;
            let count = registry
                .resolve(&table)?
                .delete_by(&column, &parse_cell(&value)?)?;
            emit_json(json!({ "deleted": count }));
            Ok(RunOutcome::ok())
        }
        Command::Rename { table, old, new } => {
            let mut registry = Registry::open(&table_dir)?;
            emit_json(json!({ "renamed": registry.rename_column(&table, &old, &new)? }));
            Ok(RunOutcome::ok())
        }
        Command::Sort {
            table,
            column,
            reverse,
        } => {
            let mut registry = Registry::open(&table_dir)?;
            let rows = registry.sort_table(&table, &column, reverse)?;
            emit_rows_or_table(&rows);
            Ok(RunOutcome::ok())
        }
        Command::SortColumns {
            table,
            reference_row,
            reverse,
        } => {
            let mut registry = Registry::open(&table_dir)?;
            let rows = registry.sort_columns(&table, reference_row, reverse)?;
            emit_rows_or_table(&rows);
            Ok(RunOutcome::ok())
        }
        Command::OrderColumns { table, order } => {
            let order = ColumnOrder::from_json(&parse_json_value(&order, "column order")?)?;
            let mut registry = Registry::open(&table_dir)?;
            let rows = registry.sort_columns_by_order(&table, &order)?;
            emit_rows_or_table(&rows);
            Ok(RunOutcome::ok())
        }
        Command::Show { table } => {
            let mut registry = Registry::open(&table_dir)?;
            let rows = registry.resolve(&table)?.get_all()?;
            if rows.is_empty() {
                println!("table '{table}' is empty");
            } else {
                print!("{}", render::render_table(&rows));
            }
            Ok(RunOutcome::ok())
        }
    }
}
