//! Implements a SQLite backed store for users and ledgers.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use rusqlite::{Connection, ErrorCode, Row, types::Type};

use crate::{
    Currency, Error, PasswordHash, Transaction, TransactionType, User, Username,
    stores::{LedgerMap, LedgerStore, UserMap, UserStore},
};

/// Keeps users in the `user` table and transactions in the `ledger_entry`
/// table of one SQLite database.
///
/// The row id of `ledger_entry` gives the insertion order of a ledger.
#[derive(Debug, Clone)]
pub struct SQLiteStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteStore {
    /// Wrap an open connection, creating the tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns an [Error::SqlError] if the tables could not be created.
    pub fn new(connection: Connection) -> Result<Self, Error> {
        create_tables(&connection)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Open the database file at `path`, creating it if needed.
    ///
    /// A file that is not a SQLite database is moved to `<path>.corrupt` and
    /// replaced with an empty database.
    ///
    /// # Errors
    ///
    /// Returns an [Error::SqlError] if the database could not be opened or an
    /// [Error::StoreIoError] if a corrupt file could not be moved aside.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let connection = Connection::open(path)?;

        match create_tables(&connection) {
            Ok(()) => Ok(Self {
                connection: Arc::new(Mutex::new(connection)),
            }),
            Err(rusqlite::Error::SqliteFailure(error, _))
                if error.code == ErrorCode::NotADatabase =>
            {
                drop(connection);

                let corrupt_path = corrupt_path(path);
                tracing::warn!(
                    "{} is not a SQLite database, moving it to {} and starting from an empty store",
                    path.display(),
                    corrupt_path.display()
                );
                fs::rename(path, &corrupt_path).map_err(|error| {
                    Error::StoreIoError(format!("{}: {error}", path.display()))
                })?;

                Self::new(Connection::open(path)?)
            }
            Err(error) => Err(error.into()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)
    }
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut corrupt_path = path.as_os_str().to_owned();
    corrupt_path.push(".corrupt");
    PathBuf::from(corrupt_path)
}

fn create_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS ledger_entry (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL,
                amount REAL NOT NULL,
                description TEXT NOT NULL,
                type TEXT NOT NULL,
                date TEXT NOT NULL,
                time TEXT NOT NULL,
                original_currency TEXT NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_ledger_entry_username ON ledger_entry(username)",
        (),
    )?;

    Ok(())
}

fn insert_transaction(
    connection: &Connection,
    username: &Username,
    transaction: &Transaction,
) -> Result<(), rusqlite::Error> {
    connection.execute(
        "INSERT INTO ledger_entry (username, amount, description, type, date, time, original_currency)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            username.as_ref(),
            transaction.amount,
            &transaction.description,
            transaction.kind.as_str(),
            transaction.date,
            transaction.time,
            transaction.original_currency.code(),
        ),
    )?;

    Ok(())
}

/// Map a row of `amount, description, type, date, time, original_currency`
/// starting at `offset` to a [Transaction].
fn map_transaction_row(row: &Row, offset: usize) -> Result<Transaction, rusqlite::Error> {
    let raw_kind: String = row.get(offset + 2)?;
    let kind = raw_kind.parse::<TransactionType>().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(offset + 2, Type::Text, error.into())
    })?;

    let raw_currency: String = row.get(offset + 5)?;
    let original_currency = raw_currency.parse::<Currency>().map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(offset + 5, Type::Text, Box::new(error))
    })?;

    Ok(Transaction {
        amount: row.get(offset)?,
        description: row.get(offset + 1)?,
        kind,
        date: row.get(offset + 3)?,
        time: row.get(offset + 4)?,
        original_currency,
    })
}

impl UserStore for SQLiteStore {
    fn load(&self) -> Result<UserMap, Error> {
        let connection = self.lock()?;
        let mut statement = connection.prepare("SELECT username, password FROM user")?;

        statement
            .query_map([], |row| {
                let username: String = row.get(0)?;
                let password_hash: String = row.get(1)?;

                Ok((
                    Username::new_unchecked(&username),
                    PasswordHash::new_unchecked(&password_hash),
                ))
            })?
            .map(|maybe_user| maybe_user.map_err(Error::from))
            .collect()
    }

    fn save(&self, users: &UserMap) -> Result<(), Error> {
        let mut connection = self.lock()?;
        let sql_transaction = connection.transaction()?;

        sql_transaction.execute("DELETE FROM user", ())?;

        for (username, password_hash) in users {
            sql_transaction.execute(
                "INSERT INTO user (username, password) VALUES (?1, ?2)",
                (username.as_ref(), password_hash.as_ref()),
            )?;
        }

        sql_transaction.commit()?;

        Ok(())
    }

    /// Insert a new user into the database.
    ///
    /// # Errors
    ///
    /// Returns [Error::DuplicateUsername] if the username is taken or
    /// [Error::SqlError] if there are SQL related errors.
    fn create(&self, user: User) -> Result<(), Error> {
        let connection = self.lock()?;

        let result = connection.execute(
            "INSERT INTO user (username, password) VALUES (?1, ?2)",
            (user.username.as_ref(), user.password_hash.as_ref()),
        );

        match result {
            Ok(_) => Ok(()),
            // Code 2067 occurs when a UNIQUE constraint failed.
            Err(rusqlite::Error::SqliteFailure(error, _)) if error.extended_code == 2067 => {
                Err(Error::DuplicateUsername(user.username.to_string()))
            }
            Err(error) => Err(error.into()),
        }
    }

    fn get(&self, username: &Username) -> Result<User, Error> {
        self.lock()?
            .prepare("SELECT password FROM user WHERE username = :username")?
            .query_row(&[(":username", username.as_ref())], |row| {
                let password_hash: String = row.get(0)?;

                Ok(User::new(
                    username.clone(),
                    PasswordHash::new_unchecked(&password_hash),
                ))
            })
            .map_err(|error| error.into())
    }
}

impl LedgerStore for SQLiteStore {
    fn load(&self) -> Result<LedgerMap, Error> {
        let connection = self.lock()?;
        let mut statement = connection.prepare(
            "SELECT username, amount, description, type, date, time, original_currency
            FROM ledger_entry ORDER BY id ASC",
        )?;

        let rows = statement.query_map([], |row| {
            let username: String = row.get(0)?;
            Ok((Username::new_unchecked(&username), map_transaction_row(row, 1)?))
        })?;

        let mut ledger = LedgerMap::new();
        for row in rows {
            let (username, transaction) = row?;
            ledger.entry(username).or_default().push(transaction);
        }

        Ok(ledger)
    }

    fn save(&self, ledger: &LedgerMap) -> Result<(), Error> {
        let mut connection = self.lock()?;
        let sql_transaction = connection.transaction()?;

        sql_transaction.execute("DELETE FROM ledger_entry", ())?;

        for (username, transactions) in ledger {
            for transaction in transactions {
                insert_transaction(&sql_transaction, username, transaction)?;
            }
        }

        sql_transaction.commit()?;

        Ok(())
    }

    fn append(&self, username: &Username, transaction: Transaction) -> Result<(), Error> {
        let connection = self.lock()?;
        insert_transaction(&connection, username, &transaction)?;

        Ok(())
    }

    fn transactions(&self, username: &Username) -> Result<Vec<Transaction>, Error> {
        let connection = self.lock()?;
        let mut statement = connection.prepare(
            "SELECT amount, description, type, date, time, original_currency
            FROM ledger_entry WHERE username = :username ORDER BY id ASC",
        )?;

        statement
            .query_map(&[(":username", username.as_ref())], |row| {
                map_transaction_row(row, 0)
            })?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
            .collect()
    }
}
