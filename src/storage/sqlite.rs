use crate::model::{ErrorRecord, Product, StorageError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rusqlite::{Connection, Row, params};
use std::str::FromStr;

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Открывает базу и создаёт таблицы. Отсутствующий файл означает пустой набор данных.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS products (
                position INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                price TEXT NOT NULL,
                old_price TEXT NOT NULL,
                site TEXT NOT NULL,
                marketplace_price TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT '',
                margin INTEGER NOT NULL DEFAULT 0,
                pursue INTEGER NOT NULL DEFAULT 0,
                review_correct INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS scrape_errors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_at TEXT NOT NULL,
                phase TEXT NOT NULL,
                message TEXT NOT NULL,
                item TEXT
            );
            "
        )?;

        // Older datasets only carried a single manual answer column
        Self::migrate_add_column_if_missing(&conn, "products", "feasible", "INTEGER NOT NULL DEFAULT 0")?;

        Ok(Self { conn })
    }

    /// Проверяет наличие столбца и в случае отсутствия добавляет его в таблицу
    fn migrate_add_column_if_missing(
        conn: &Connection,
        table: &str,
        column: &str,
        column_def: &str,
    ) -> Result<(), StorageError> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let existing_columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;

        if !existing_columns.iter().any(|c| c == column) {
            let alter_sql = format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def);
            conn.execute(&alter_sql, [])?;
        }

        Ok(())
    }

    /// Возвращает все строки набора данных в сохранённом порядке
    pub fn load_products(&self) -> Result<Vec<Product>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT name, price, old_price, site, marketplace_price, category,
                    margin, pursue, review_correct, feasible
             FROM products ORDER BY position ASC",
        )?;

        let rows = stmt.query_map([], Self::map_product)?;
        let mut products = Vec::new();
        for product in rows {
            products.push(product?);
        }

        Ok(products)
    }

    /// Заменяет набор данных целиком в одной транзакции
    pub fn replace_products(&mut self, products: &[Product]) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM products", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO products (
                    position, name, price, old_price, site, marketplace_price,
                    category, margin, pursue, review_correct, feasible
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for (position, p) in products.iter().enumerate() {
                stmt.execute(params![
                    position as i64,
                    &p.name,
                    p.price.to_string(),
                    p.previous_price.to_string(),
                    &p.site,
                    p.marketplace_price.to_string(),
                    &p.category,
                    p.margin,
                    p.pursue,
                    p.review_correct,
                    p.feasible,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Сохраняет журнал ошибок прогона
    pub fn save_errors(&mut self, run_at: DateTime<Utc>, records: &[ErrorRecord]) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO scrape_errors (run_at, phase, message, item) VALUES (?1, ?2, ?3, ?4)",
            )?;
            let run_at = run_at.to_rfc3339();
            for record in records {
                stmt.execute(params![&run_at, record.phase.as_str(), &record.message, &record.item])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Количество ошибок по фазам за последний прогон
    pub fn last_run_error_counts(&self) -> Result<Vec<(String, usize)>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT phase, COUNT(*) FROM scrape_errors
             WHERE run_at = (SELECT MAX(run_at) FROM scrape_errors)
             GROUP BY phase ORDER BY phase ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            let phase: String = row.get(0)?;
            let count: usize = row.get(1)?;
            Ok((phase, count))
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }

    fn map_product(row: &Row) -> Result<Product, rusqlite::Error> {
        Ok(Product {
            name: row.get(0)?,
            price: Self::decimal_at(row, 1)?,
            previous_price: Self::decimal_at(row, 2)?,
            site: row.get(3)?,
            marketplace_price: Self::decimal_at(row, 4)?,
            category: row.get(5)?,
            margin: row.get(6)?,
            pursue: row.get(7)?,
            review_correct: row.get(8)?,
            feasible: row.get(9)?,
        })
    }

    fn decimal_at(row: &Row, idx: usize) -> Result<Decimal, rusqlite::Error> {
        let text: String = row.get(idx)?;
        Decimal::from_str(&text).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Phase;
    use rust_decimal_macros::dec;

    fn product(name: &str) -> Product {
        let mut p = Product::new(name.into(), dec!(19.99), dec!(39.99), "Amazon".into());
        p.marketplace_price = dec!(120.50);
        p.category = "Toys".into();
        p.margin = 84;
        p.pursue = true;
        p.feasible = true;
        p
    }

    #[test]
    fn new_database_starts_empty() {
        let storage = SqliteStorage::new(":memory:").unwrap();
        assert!(storage.load_products().unwrap().is_empty());
    }

    #[test]
    fn replace_keeps_order_and_every_column() {
        let mut storage = SqliteStorage::new(":memory:").unwrap();
        let rows = vec![product("b"), product("a")];
        storage.replace_products(&rows).unwrap();
        assert_eq!(storage.load_products().unwrap(), rows);

        storage.replace_products(&rows[..1]).unwrap();
        assert_eq!(storage.load_products().unwrap().len(), 1);
    }

    #[test]
    fn legacy_table_gains_feasible_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE products (
                position INTEGER PRIMARY KEY, name TEXT NOT NULL, price TEXT NOT NULL,
                old_price TEXT NOT NULL, site TEXT NOT NULL, marketplace_price TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT '', margin INTEGER NOT NULL DEFAULT 0,
                pursue INTEGER NOT NULL DEFAULT 0, review_correct INTEGER NOT NULL DEFAULT 0
            );
            INSERT INTO products (name, price, old_price, site, marketplace_price)
            VALUES ('Widget', '10', '20', 'Woot', '0');",
        )
        .unwrap();
        SqliteStorage::migrate_add_column_if_missing(&conn, "products", "feasible", "INTEGER NOT NULL DEFAULT 0")
            .unwrap();
        let storage = SqliteStorage { conn };
        let rows = storage.load_products().unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].feasible);
    }

    #[test]
    fn error_ledger_is_persisted_per_run() {
        let mut storage = SqliteStorage::new(":memory:").unwrap();
        let records = vec![
            ErrorRecord { phase: Phase::Lookup, message: "timed out".into(), item: Some("Widget".into()) },
            ErrorRecord { phase: Phase::Lookup, message: "no results".into(), item: Some("Gizmo".into()) },
            ErrorRecord { phase: Phase::StructuralGate, message: "aborted".into(), item: None },
        ];
        storage.save_errors(Utc::now(), &records).unwrap();
        assert_eq!(
            storage.last_run_error_counts().unwrap(),
            vec![("lookup".to_string(), 2), ("structural-gate".to_string(), 1)]
        );
    }
}
