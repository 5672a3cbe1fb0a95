use std::sync::Arc;

use rusqlite::Connection;

use crate::{
    AppState, PasswordHash, RateTable, User, Username, ValidatedPassword,
    stores::{SQLiteStore, UserStore},
};

pub(crate) const TEST_USERNAME: &str = "asha";
pub(crate) const TEST_PASSWORD: &str = "averysafeandsecurepassword";

/// The lowest cost bcrypt accepts, so tests do not spend seconds hashing.
pub(crate) const TEST_HASH_COST: u32 = 4;

/// An [AppState] backed by an in-memory database with one registered user.
pub(crate) fn test_state() -> AppState {
    let store = Arc::new(
        SQLiteStore::new(Connection::open_in_memory().expect("Could not open database"))
            .expect("Could not create store"),
    );
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        TEST_HASH_COST,
    )
    .expect("Could not hash password");
    store
        .create(User::new(Username::new_unchecked(TEST_USERNAME), password_hash))
        .expect("Could not create test user");

    let mut state = AppState::new(
        "foobar",
        "Etc/UTC",
        RateTable::default(),
        store.clone(),
        store,
    );
    state.hash_cost = TEST_HASH_COST;

    state
}
