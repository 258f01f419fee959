//! Declarative SQLite table definitions.
//!
//! Tables are described as const data and turned into DDL at run start.
//! All songmart pipelines are full-refresh: destination tables are dropped
//! and recreated on every run, so there is no schema versioning here.

use anyhow::Result;
use rusqlite::{params, Connection};

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            // Allow unused_mut because the variable is only mutated when optional
            // field assignments are passed to the macro (e.g., `is_primary_key = true`)
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                autoincrement: false,
                non_null: false,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
}

pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static SqlType,
    pub is_primary_key: bool,
    pub autoincrement: bool,
    pub non_null: bool,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub indices: &'static [(&'static str, &'static str)],
}

impl Table {
    fn create_sql(&self) -> String {
        let mut create_sql = format!("CREATE TABLE IF NOT EXISTS {} (", self.name);
        for (column_index, column) in self.columns.iter().enumerate() {
            if column_index > 0 {
                create_sql.push_str(", ");
            }
            create_sql.push_str(&format!(
                "{} {}",
                column.name,
                match column.sql_type {
                    SqlType::Text => "TEXT",
                    SqlType::Integer => "INTEGER",
                    SqlType::Real => "REAL",
                }
            ));
            if column.is_primary_key {
                create_sql.push_str(" PRIMARY KEY");
            }
            if column.autoincrement {
                // Only meaningful on an INTEGER PRIMARY KEY column
                create_sql.push_str(" AUTOINCREMENT");
            }
            if column.non_null {
                create_sql.push_str(" NOT NULL");
            }
        }
        create_sql.push_str(");");
        create_sql
    }

    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute(&self.create_sql(), params![])?;
        for (index_name, column_names) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {}({});",
                    index_name, self.name, column_names
                ),
                params![],
            )?;
        }
        Ok(())
    }

    pub fn drop(&self, conn: &Connection) -> Result<()> {
        conn.execute(&format!("DROP TABLE IF EXISTS {};", self.name), params![])?;
        Ok(())
    }
}

/// Drop and recreate every table in `tables`, in order.
pub fn recreate_tables(conn: &Connection, tables: &[Table]) -> Result<()> {
    for table in tables {
        table.drop(conn)?;
    }
    for table in tables {
        table.create(conn)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_TABLE: Table = Table {
        name: "test_table",
        columns: &[
            sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
            sqlite_column!("name", &SqlType::Text, non_null = true),
            sqlite_column!("score", &SqlType::Real),
        ],
        indices: &[("idx_test_name", "name")],
    };

    #[test]
    fn test_create_sql_shape() {
        let sql = TEST_TABLE.create_sql();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS test_table (id INTEGER PRIMARY KEY, name TEXT NOT NULL, score REAL);"
        );
    }

    #[test]
    fn test_create_and_drop() {
        let conn = Connection::open_in_memory().unwrap();
        TEST_TABLE.create(&conn).unwrap();

        conn.execute(
            "INSERT INTO test_table (name, score) VALUES ('a', 1.5)",
            [],
        )
        .unwrap();

        let index_exists: bool = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type='index' AND name='idx_test_name'",
                [],
                |_| Ok(true),
            )
            .unwrap_or(false);
        assert!(index_exists);

        TEST_TABLE.drop(&conn).unwrap();
        let table_exists: bool = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type='table' AND name='test_table'",
                [],
                |_| Ok(true),
            )
            .unwrap_or(false);
        assert!(!table_exists);
    }

    #[test]
    fn test_recreate_wipes_rows() {
        let conn = Connection::open_in_memory().unwrap();
        recreate_tables(&conn, &[TEST_TABLE]).unwrap();
        conn.execute(
            "INSERT INTO test_table (name, score) VALUES ('a', 1.5)",
            [],
        )
        .unwrap();

        recreate_tables(&conn, &[TEST_TABLE]).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM test_table", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_autoincrement_column() {
        const AUTOINC_TABLE: Table = Table {
            name: "autoinc_table",
            columns: &[
                sqlite_column!(
                    "id",
                    &SqlType::Integer,
                    is_primary_key = true,
                    autoincrement = true
                ),
                sqlite_column!("value", &SqlType::Text),
            ],
            indices: &[],
        };

        let conn = Connection::open_in_memory().unwrap();
        AUTOINC_TABLE.create(&conn).unwrap();
        conn.execute("INSERT INTO autoinc_table (value) VALUES ('x')", [])
            .unwrap();
        conn.execute("INSERT INTO autoinc_table (value) VALUES ('y')", [])
            .unwrap();

        let max_id: i64 = conn
            .query_row("SELECT MAX(id) FROM autoinc_table", [], |r| r.get(0))
            .unwrap();
        assert_eq!(max_id, 2);
    }
}
