use flightbook_core::db::migrations::latest_version;
use flightbook_core::db::open_db_in_memory;
use flightbook_core::{
    AccountRegistrar, FieldError, NewUser, RegistrationError, RepoError, SqliteUserRepository,
    UserKey, UserRepository,
};
use rusqlite::Connection;

#[test]
fn register_then_lookup_by_either_key() {
    let conn = open_db_in_memory().unwrap();
    let registrar = AccountRegistrar::new(SqliteUserRepository::try_new(&conn).unwrap());

    let user = registrar
        .register_user("john_doe", "john@example.com", "password123")
        .unwrap();
    assert_eq!(user.id, 1);
    assert_eq!(user.username, "john_doe");

    let by_name = registrar.find_user_by_username("john_doe").unwrap().unwrap();
    let by_email = registrar
        .find_user_by_email("john@example.com")
        .unwrap()
        .unwrap();
    assert_eq!(by_name, user);
    assert_eq!(by_email, user);
    assert_eq!(registrar.get_user(user.id).unwrap(), Some(user));
}

#[test]
fn ids_are_assigned_sequentially() {
    let conn = open_db_in_memory().unwrap();
    let registrar = AccountRegistrar::new(SqliteUserRepository::try_new(&conn).unwrap());

    let first = registrar.register_user("a", "a@example.com", "p").unwrap();
    let second = registrar.register_user("b", "b@example.com", "p").unwrap();
    assert_eq!((first.id, second.id), (1, 2));

    let listed: Vec<_> = registrar
        .list_users()
        .unwrap()
        .into_iter()
        .map(|user| user.username)
        .collect();
    assert_eq!(listed, ["a", "b"]);
}

#[test]
fn duplicate_username_is_rejected_even_with_new_email() {
    let conn = open_db_in_memory().unwrap();
    let registrar = AccountRegistrar::new(SqliteUserRepository::try_new(&conn).unwrap());
    registrar
        .register_user("john_doe", "john@example.com", "password123")
        .unwrap();

    let err = registrar
        .register_user("john_doe", "other@example.com", "password123")
        .unwrap_err();
    assert!(matches!(err, RegistrationError::DuplicateUsername));
    assert_eq!(registrar.count_users().unwrap(), 1);
}

#[test]
fn duplicate_email_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let registrar = AccountRegistrar::new(SqliteUserRepository::try_new(&conn).unwrap());
    registrar
        .register_user("john_doe", "john@example.com", "password123")
        .unwrap();

    let err = registrar
        .register_user("jane_doe", "john@example.com", "password123")
        .unwrap_err();
    assert!(matches!(err, RegistrationError::DuplicateEmail));
    assert_eq!(registrar.count_users().unwrap(), 1);
}

#[test]
fn repeated_identical_registration_reports_username_first() {
    let conn = open_db_in_memory().unwrap();
    let registrar = AccountRegistrar::new(SqliteUserRepository::try_new(&conn).unwrap());

    registrar
        .register_user("john_doe", "john@example.com", "password123")
        .unwrap();
    let err = registrar
        .register_user("john_doe", "john@example.com", "password123")
        .unwrap_err();
    assert!(matches!(err, RegistrationError::DuplicateUsername));
}

#[test]
fn keys_are_compared_exactly() {
    let conn = open_db_in_memory().unwrap();
    let registrar = AccountRegistrar::new(SqliteUserRepository::try_new(&conn).unwrap());

    registrar
        .register_user("john_doe", "john@example.com", "p")
        .unwrap();
    registrar
        .register_user("John_Doe", "John@example.com", "p")
        .unwrap();
    assert_eq!(registrar.count_users().unwrap(), 2);
}

#[test]
fn invalid_fields_are_rejected_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let registrar = AccountRegistrar::new(SqliteUserRepository::try_new(&conn).unwrap());

    let err = registrar
        .register_user("", "john@example.com", "p")
        .unwrap_err();
    assert!(matches!(
        err,
        RegistrationError::Validation(FieldError::Empty { field: "username" })
    ));

    let err = registrar
        .register_user("u".repeat(51), "john@example.com", "p")
        .unwrap_err();
    assert!(matches!(
        err,
        RegistrationError::Validation(FieldError::TooLong {
            field: "username",
            max_chars: 50,
            actual_chars: 51,
        })
    ));

    let long_email = format!("{}@example.com", "e".repeat(100));
    let err = registrar
        .register_user("john_doe", long_email, "p")
        .unwrap_err();
    assert!(matches!(
        err,
        RegistrationError::Validation(FieldError::TooLong { field: "email", .. })
    ));

    let err = registrar
        .register_user("john_doe", "john@example.com", "p".repeat(101))
        .unwrap_err();
    assert!(matches!(
        err,
        RegistrationError::Validation(FieldError::TooLong {
            field: "password",
            ..
        })
    ));

    assert_eq!(registrar.count_users().unwrap(), 0);
}

#[test]
fn maximum_width_fields_are_accepted() {
    let conn = open_db_in_memory().unwrap();
    let registrar = AccountRegistrar::new(SqliteUserRepository::try_new(&conn).unwrap());

    let user = registrar
        .register_user("u".repeat(50), "e".repeat(100), "p".repeat(100))
        .unwrap();
    assert_eq!(user.username.len(), 50);
}

#[test]
fn store_enforces_unique_keys_without_the_repository() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO users (username, email, password) VALUES ('a', 'a@x', 'p');",
        [],
    )
    .unwrap();

    assert!(conn
        .execute(
            "INSERT INTO users (username, email, password) VALUES ('a', 'b@x', 'p');",
            [],
        )
        .is_err());
    assert!(conn
        .execute(
            "INSERT INTO users (username, email, password) VALUES ('b', 'a@x', 'p');",
            [],
        )
        .is_err());
}

#[test]
fn repository_returns_semantic_duplicate_errors() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    repo.register_user(&NewUser::new("a", "a@x", "p")).unwrap();
    let err = repo
        .register_user(&NewUser::new("b", "a@x", "p"))
        .unwrap_err();
    assert!(matches!(err, RepoError::Duplicate(UserKey::Email)));
}

#[test]
fn failed_registration_releases_the_write_lock() {
    let conn = open_db_in_memory().unwrap();
    let registrar = AccountRegistrar::new(SqliteUserRepository::try_new(&conn).unwrap());

    registrar.register_user("a", "a@x", "p").unwrap();
    registrar.register_user("a", "b@x", "p").unwrap_err();

    assert!(conn.is_autocommit());
    registrar.register_user("b", "b@x", "p").unwrap();
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteUserRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_users_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteUserRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("users"))
    ));
}

#[test]
fn repository_rejects_users_table_missing_email_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteUserRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "users",
            column: "email"
        })
    ));
}

#[test]
fn serialized_user_omits_password() {
    let conn = open_db_in_memory().unwrap();
    let registrar = AccountRegistrar::new(SqliteUserRepository::try_new(&conn).unwrap());
    let user = registrar
        .register_user("john_doe", "john@example.com", "password123")
        .unwrap();

    let json = serde_json::to_value(&user).unwrap();
    assert_eq!(json["username"], "john_doe");
    assert!(json.get("password").is_none());
    assert_eq!(
        user.to_string(),
        "<User(username='john_doe', email='john@example.com')>"
    );
    assert!(!format!("{user:?}").contains("password123"));
}
