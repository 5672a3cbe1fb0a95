//! Implements a store that keeps users and ledgers in two JSON files.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use serde::Serialize;
use serde_json::{Value, error::Category};

use crate::{
    Error, PasswordHash, Transaction, User, Username,
    stores::{LedgerMap, LedgerStore, UserMap, UserStore},
};

/// Keeps every user in `users.json` and every ledger in `ledger.json` inside
/// a data directory.
///
/// `users.json` maps usernames to password hashes and `ledger.json` maps
/// usernames to lists of transactions. Each file has its own lock, which is
/// held for the whole read-modify-write cycle of [UserStore::create] and
/// [LedgerStore::append].
#[derive(Debug)]
pub struct JsonStore {
    users_path: PathBuf,
    ledger_path: PathBuf,
    users_lock: Mutex<()>,
    ledger_lock: Mutex<()>,
}

impl JsonStore {
    /// The name of the file holding user accounts.
    pub const USERS_FILE: &str = "users.json";
    /// The name of the file holding transactions.
    pub const LEDGER_FILE: &str = "ledger.json";

    /// Open the store in `data_dir`, creating the directory if needed.
    ///
    /// The files themselves are created on the first write.
    ///
    /// # Errors
    ///
    /// Returns an [Error::StoreIoError] if the directory could not be created.
    pub fn open(data_dir: &Path) -> Result<Self, Error> {
        fs::create_dir_all(data_dir).map_err(|error| io_error(error, data_dir))?;

        Ok(Self {
            users_path: data_dir.join(Self::USERS_FILE),
            ledger_path: data_dir.join(Self::LEDGER_FILE),
            users_lock: Mutex::new(()),
            ledger_lock: Mutex::new(()),
        })
    }

    fn lock_users(&self) -> Result<MutexGuard<'_, ()>, Error> {
        self.users_lock.lock().map_err(|_| Error::DatabaseLockError)
    }

    fn lock_ledger(&self) -> Result<MutexGuard<'_, ()>, Error> {
        self.ledger_lock.lock().map_err(|_| Error::DatabaseLockError)
    }
}

impl UserStore for JsonStore {
    fn load(&self) -> Result<UserMap, Error> {
        let _guard = self.lock_users()?;
        let records = read_records(&self.users_path)?;

        Ok(records
            .into_iter()
            .filter_map(|(username, record)| {
                decode_password_hash(&username, record).map(|hash| (username, hash))
            })
            .collect())
    }

    fn save(&self, users: &UserMap) -> Result<(), Error> {
        let _guard = self.lock_users()?;
        write_atomically(&self.users_path, users)
    }

    fn create(&self, user: User) -> Result<(), Error> {
        let _guard = self.lock_users()?;
        let mut records = read_records(&self.users_path)?;

        // A record that could not be read still claims its username.
        if records.contains_key(&user.username) {
            return Err(Error::DuplicateUsername(user.username.to_string()));
        }

        records.insert(user.username, to_json_value(&user.password_hash)?);
        write_atomically(&self.users_path, &records)
    }

    fn get(&self, username: &Username) -> Result<User, Error> {
        let _guard = self.lock_users()?;
        let mut records = read_records(&self.users_path)?;

        records
            .remove(username)
            .and_then(|record| decode_password_hash(username, record))
            .map(|password_hash| User::new(username.clone(), password_hash))
            .ok_or(Error::NotFound)
    }
}

impl LedgerStore for JsonStore {
    fn load(&self) -> Result<LedgerMap, Error> {
        let _guard = self.lock_ledger()?;
        let records = read_records(&self.ledger_path)?;

        Ok(records
            .into_iter()
            .map(|(username, record)| {
                let transactions = decode_transactions(&username, record);
                (username, transactions)
            })
            .collect())
    }

    fn save(&self, ledger: &LedgerMap) -> Result<(), Error> {
        let _guard = self.lock_ledger()?;
        write_atomically(&self.ledger_path, ledger)
    }

    fn append(&self, username: &Username, transaction: Transaction) -> Result<(), Error> {
        let _guard = self.lock_ledger()?;
        let mut records = read_records(&self.ledger_path)?;
        let transaction = to_json_value(&transaction)?;

        // Entries that cannot be decoded are written back untouched.
        match records
            .entry(username.clone())
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            Value::Array(entries) => entries.push(transaction),
            other => {
                tracing::warn!(
                    "The ledger for {username} in {} is not a list, replacing {other}",
                    self.ledger_path.display()
                );
                *other = Value::Array(vec![transaction]);
            }
        }

        write_atomically(&self.ledger_path, &records)
    }

    fn transactions(&self, username: &Username) -> Result<Vec<Transaction>, Error> {
        let _guard = self.lock_ledger()?;
        let mut records = read_records(&self.ledger_path)?;

        Ok(records
            .remove(username)
            .map(|record| decode_transactions(username, record))
            .unwrap_or_default())
    }
}

fn io_error(error: io::Error, path: &Path) -> Error {
    Error::StoreIoError(format!("{}: {error}", path.display()))
}

fn to_json_value<T: Serialize>(value: &T) -> Result<Value, Error> {
    serde_json::to_value(value).map_err(|error| Error::JSONSerializationError(error.to_string()))
}

/// The contents of a store file before the records are checked.
type Records = BTreeMap<Username, Value>;

/// Read the JSON object at `path`, keyed by username.
///
/// A missing or blank file reads as empty. A file that is not a JSON object
/// is moved to `<path>.corrupt` and replaced with an empty object. The
/// individual records are left for the caller to check.
fn read_records(path: &Path) -> Result<Records, Error> {
    let contents = match fs::read(path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Records::new()),
        Err(error) => return Err(io_error(error, path)),
    };

    if contents.iter().all(u8::is_ascii_whitespace) {
        return Ok(Records::new());
    }

    match serde_json::from_slice(&contents) {
        Ok(records) => Ok(records),
        Err(error) => {
            let reason = match error.classify() {
                Category::Syntax | Category::Eof => "it is not valid JSON",
                Category::Data | Category::Io => "it is not an object keyed by username",
            };
            let corrupt_path = corrupt_path(path);
            tracing::warn!(
                "Could not read {} because {reason} ({error}), moving it to {} and starting from empty",
                path.display(),
                corrupt_path.display()
            );

            fs::rename(path, &corrupt_path).map_err(|error| io_error(error, path))?;
            let records = Records::new();
            write_atomically(path, &records)?;
            Ok(records)
        }
    }
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut corrupt_path = path.as_os_str().to_owned();
    corrupt_path.push(".corrupt");
    PathBuf::from(corrupt_path)
}

fn decode_password_hash(username: &Username, record: Value) -> Option<PasswordHash> {
    serde_json::from_value(record)
        .inspect_err(|error| {
            tracing::warn!("Skipping the account for {username}, it could not be read: {error}")
        })
        .ok()
}

/// Decode the ledger for `username`, skipping any entry that cannot be read.
fn decode_transactions(username: &Username, record: Value) -> Vec<Transaction> {
    let entries = match record {
        Value::Array(entries) => entries,
        other => {
            tracing::warn!("Skipping the ledger for {username}, it is not a list: {other}");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            serde_json::from_value(entry)
                .inspect_err(|error| {
                    tracing::warn!(
                        "Skipping entry {index} in the ledger for {username}, it could not be read: {error}"
                    )
                })
                .ok()
        })
        .collect()
}

/// Write `value` to a sibling temporary file and rename it over `path`.
fn write_atomically<T: Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    let json = serde_json::to_vec_pretty(value)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    fs::write(&temp_path, json).map_err(|error| io_error(error, &temp_path))?;
    fs::rename(&temp_path, path).map_err(|error| io_error(error, path))
}
