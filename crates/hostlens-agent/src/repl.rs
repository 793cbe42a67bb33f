//! Interactive SQL loop.

use crate::Agent;
use hostlens_store::SqlValue;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// Tables recognized for query-result journaling.
const TABLES: &[&str] = &[
    "processes",
    "network_connections",
    "system_info",
    "process_events",
    "file_events",
    "network_events",
];

/// Read SQL lines from stdin until `exit`, EOF, or Ctrl-C.
///
/// A failed query prints its error and the loop continues; nothing a
/// user types can take the agent down.
pub async fn run(agent: &Agent) -> anyhow::Result<()> {
    let store = agent.store();
    let journal = agent.journal();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("hostlens ready. Enter SQL queries or 'exit' to quit.");

    loop {
        print!("SQL> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\ninterrupted, exiting");
                break;
            }
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            break; // EOF
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("exit") {
            break;
        }

        match store.query(query).await {
            Ok(rows) => {
                for row in &rows {
                    println!("{}", format_row(row));
                }
                debug!(rows = rows.len(), "query served");
                journal.append(&query_category(query), &rows_to_json(&rows));
            }
            Err(e) => {
                eprintln!("query error: {e}");
            }
        }
    }

    Ok(())
}

/// Pick the journal category from the first known table named in the
/// query. Crude on purpose: it only routes log lines.
fn query_category(query: &str) -> String {
    let lowered = query.to_lowercase();
    let table = TABLES
        .iter()
        .find(|table| lowered.contains(**table))
        .copied()
        .unwrap_or("unknown");
    format!("query_{table}")
}

fn format_row(row: &[SqlValue]) -> String {
    let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
    format!("({})", cells.join(", "))
}

fn rows_to_json(rows: &[Vec<SqlValue>]) -> serde_json::Value {
    serde_json::Value::Array(
        rows.iter()
            .map(|row| {
                serde_json::Value::Array(row.iter().map(value_to_json).collect())
            })
            .collect(),
    )
}

fn value_to_json(value: &SqlValue) -> serde_json::Value {
    match value {
        SqlValue::Null => serde_json::Value::Null,
        SqlValue::Integer(v) => serde_json::json!(v),
        SqlValue::Real(v) => serde_json::json!(v),
        SqlValue::Text(v) => serde_json::json!(v),
        SqlValue::Blob(v) => serde_json::json!(format!("<{} bytes>", v.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_category_finds_table() {
        assert_eq!(
            query_category("SELECT hostname FROM system_info"),
            "query_system_info"
        );
        assert_eq!(
            query_category("select * from PROCESS_EVENTS where pid = 1"),
            "query_process_events"
        );
        assert_eq!(query_category("SELECT 1"), "query_unknown");
    }

    #[test]
    fn test_format_row() {
        let row = vec![
            SqlValue::Integer(4321),
            SqlValue::Text("worker".into()),
            SqlValue::Null,
        ];
        assert_eq!(format_row(&row), "(4321, worker, NULL)");
    }

    #[test]
    fn test_rows_to_json_shape() {
        let rows = vec![vec![SqlValue::Integer(1), SqlValue::Real(2.5)]];
        let json = rows_to_json(&rows);
        assert_eq!(json[0][0], 1);
        assert_eq!(json[0][1], 2.5);
    }
}
