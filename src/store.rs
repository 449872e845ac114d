//! SQLite storage for client records

use crate::record::Record;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors from the record store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid balance '{value}' stored for client '{name}'")]
    InvalidBalance { name: String, value: String },
}

/// Source of the records a report is built from.
pub trait RecordStore {
    /// Every record, ordered by name.
    fn load_all(&self) -> Result<Vec<Record>, StoreError>;
}

/// SQLite-backed record store. Balances are stored as decimal text so they
/// round-trip exactly.
pub struct SqliteRecordStore {
    conn: Connection,
}

impl SqliteRecordStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS clients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                address TEXT NOT NULL,
                account_number TEXT NOT NULL,
                balance TEXT NOT NULL,
                email_address TEXT NOT NULL,
                phone_number TEXT NOT NULL,
                last_transaction_date TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn insert(&self, record: &Record) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO clients
             (name, address, account_number, balance, email_address, phone_number, last_transaction_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.name,
                record.address,
                record.account_number,
                record.balance.to_string(),
                record.email_address,
                record.phone_number,
                record.last_transaction_date,
            ],
        )?;
        Ok(())
    }

    /// Replaces the whole table with `records` in one transaction.
    pub fn replace_all(&mut self, records: &[Record]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM clients", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO clients
                 (name, address, account_number, balance, email_address, phone_number, last_transaction_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.name,
                    record.address,
                    record.account_number,
                    record.balance.to_string(),
                    record.email_address,
                    record.phone_number,
                    record.last_transaction_date,
                ])?;
            }
        }
        tx.commit()?;
        log::info!("Stored {} client record(s)", records.len());
        Ok(())
    }

    /// Resets the store to the sample client list.
    pub fn seed_sample_data(&mut self) -> Result<(), StoreError> {
        self.replace_all(&sample_records())
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM clients", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

impl RecordStore for SqliteRecordStore {
    fn load_all(&self) -> Result<Vec<Record>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT name, address, account_number, balance, email_address, phone_number, last_transaction_date
             FROM clients ORDER BY name, id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (name, address, account_number, balance, email_address, phone_number, last_transaction_date) = row?;
            let balance = Decimal::from_str(balance.trim())
                .map_err(|_| StoreError::InvalidBalance { name: name.clone(), value: balance.clone() })?;
            records.push(Record {
                name,
                address,
                account_number,
                balance,
                email_address,
                phone_number,
                last_transaction_date,
            });
        }
        log::debug!("Loaded {} client record(s)", records.len());
        Ok(records)
    }
}

impl RecordStore for Vec<Record> {
    fn load_all(&self) -> Result<Vec<Record>, StoreError> {
        let mut records = self.clone();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }
}

/// The fourteen sample clients the application ships with.
pub fn sample_records() -> Vec<Record> {
    let rows: [(&str, &str, &str, Decimal, &str, &str, &str); 14] = [
        ("John Doe", "123 Maple St, Springfield", "ACCT-1001", Decimal::new(250075, 2), "john.doe@email.com", "555-0101", "2024-12-09"),
        ("Jane Smith", "456 Oak Ave, Metropolis", "ACCT-1002", Decimal::new(1025050, 2), "jane.smith@email.com", "555-0102", "2024-12-10"),
        ("Carlos Reyes", "789 Pine Rd, Smalltown", "ACCT-1003", Decimal::new(50000, 2), "carlos.r@email.com", "555-0103", "2024-12-08"),
        ("Linda Carter", "321 Birch Blvd, Capital City", "ACCT-1004", Decimal::new(987599, 2), "linda.c@email.com", "555-0104", "2024-12-10"),
        ("Michael Chang", "567 Cedar Ln, Riverside", "ACCT-1005", Decimal::new(1575025, 2), "m.chang@email.com", "555-0105", "2024-12-09"),
        ("Sarah Wilson", "890 Elm St, Lakeside", "ACCT-1006", Decimal::new(320000, 2), "s.wilson@email.com", "555-0106", "2024-12-07"),
        ("Robert Brown", "432 Walnut Ave, Highland", "ACCT-1007", Decimal::new(670050, 2), "r.brown@email.com", "555-0107", "2024-12-10"),
        ("Emily Davis", "765 Spruce Dr, Valley View", "ACCT-1008", Decimal::new(1240075, 2), "e.davis@email.com", "555-0108", "2024-12-08"),
        ("David Martinez", "234 Aspen Ct, Mountain City", "ACCT-1009", Decimal::new(890025, 2), "d.martinez@email.com", "555-0109", "2024-12-09"),
        ("Lisa Anderson", "876 Redwood Rd, Forest Hills", "ACCT-1010", Decimal::new(430000, 2), "l.anderson@email.com", "555-0110", "2024-12-10"),
        ("James Wilson", "543 Magnolia Blvd, Sunnydale", "ACCT-1011", Decimal::new(760050, 2), "j.wilson@email.com", "555-0111", "2024-12-07"),
        ("Maria Garcia", "789 Willow Way, Bayside", "ACCT-1012", Decimal::new(510025, 2), "m.garcia@email.com", "555-0112", "2024-12-09"),
        ("Thomas Lee", "321 Sycamore St, Eastwood", "ACCT-1013", Decimal::new(920075, 2), "t.lee@email.com", "555-0113", "2024-12-08"),
        ("Patricia White", "654 Juniper Ln, Westbrook", "ACCT-1014", Decimal::new(1130050, 2), "p.white@email.com", "555-0114", "2024-12-10"),
    ];
    rows.into_iter()
        .map(|(name, address, account, balance, email, phone, date)| {
            Record::new(name, address, account, balance, email, phone, date)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn seeded_records_load_sorted_by_name() {
        let mut store = SqliteRecordStore::in_memory().unwrap();
        store.seed_sample_data().unwrap();
        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 14);
        assert_eq!(records[0].name, "Carlos Reyes");
        assert_eq!(records[13].name, "Thomas Lee");
        assert!(records.windows(2).all(|w| w[0].name <= w[1].name));
    }

    #[test]
    fn balances_round_trip_exactly() {
        let store = SqliteRecordStore::in_memory().unwrap();
        let record = Record::new("Z", "", "A-1", dec!(12345678901234.5678), "", "", "2024-01-01");
        store.insert(&record).unwrap();
        assert_eq!(store.load_all().unwrap(), vec![record]);
    }

    #[test]
    fn seeding_twice_does_not_duplicate() {
        let mut store = SqliteRecordStore::in_memory().unwrap();
        store.seed_sample_data().unwrap();
        store.seed_sample_data().unwrap();
        assert_eq!(store.count().unwrap(), 14);
    }

    #[test]
    fn corrupt_balance_is_reported() {
        let store = SqliteRecordStore::in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO clients (name, address, account_number, balance, email_address, phone_number, last_transaction_date)
                 VALUES ('Bad', '', '', 'lots', '', '', '')",
                [],
            )
            .unwrap();
        let err = store.load_all().unwrap_err();
        assert!(matches!(err, StoreError::InvalidBalance { ref value, .. } if value == "lots"));
    }

    #[test]
    fn sample_total() {
        let total = crate::record::total_balance(&sample_records()).unwrap();
        assert_eq!(total, dec!(107580.99));
    }
}
