//! `flightbook` command-line entry point.
//!
//! # Responsibility
//! - Open the record store once per invocation and inject it into the
//!   registrar and recorder.
//! - Print one success line to stdout, or `Error: <message>` to stderr with
//!   exit status 1.

use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand};
use flightbook_core::{
    core_version, default_log_level, init_logging, open_db, AccountRegistrar, RecordedReservation,
    RegistrationError, ReservationError, ReservationRecorder, SqliteReservationRepository,
    SqliteUserRepository, User, UserId,
};
use log::info;
use rusqlite::Connection;
use std::path::PathBuf;
use std::process::ExitCode;

/// Register users and record flight reservations
#[derive(Debug, Parser)]
#[command(name = "flightbook", version, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: Global,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Args)]
struct Global {
    /// SQLite database file, created on first use
    #[arg(
        long,
        global = true,
        env = "FLIGHTBOOK_DB",
        default_value = "flightbook.sqlite3"
    )]
    db: PathBuf,

    /// Absolute directory for rolling log files; file logging is off when unset
    #[arg(long, global = true, env = "FLIGHTBOOK_LOG_DIR")]
    log_dir: Option<String>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true, env = "FLIGHTBOOK_LOG_LEVEL")]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Register a new user account
    Register(RegisterArgs),

    /// Record a flight reservation for an existing user
    Reserve(ReserveArgs),

    /// Register `john_doe` and reserve flight ABC123 for user 1
    Demo,

    /// Look up one user
    User {
        #[command(flatten)]
        key: UserLookupArgs,

        /// Print JSON instead of the record summary
        #[arg(long)]
        json: bool,
    },

    /// List reservations owned by a user
    Reservations {
        #[arg(long)]
        user_id: UserId,

        /// Print JSON instead of one line per reservation
        #[arg(long)]
        json: bool,
    },

    /// Print the core version
    Version,
}

#[derive(Debug, Args)]
struct RegisterArgs {
    #[arg(long)]
    username: String,

    #[arg(long)]
    email: String,

    #[arg(long)]
    password: String,
}

#[derive(Debug, Args)]
struct ReserveArgs {
    #[arg(long)]
    user_id: UserId,

    #[arg(long)]
    flight_number: String,

    /// Departure time as "YYYY-MM-DD HH:MM:SS"
    #[arg(long)]
    departure_date: String,

    #[arg(long)]
    seat_number: Option<String>,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct UserLookupArgs {
    #[arg(long)]
    id: Option<UserId>,

    #[arg(long)]
    username: Option<String>,

    #[arg(long)]
    email: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    init_cli_logging(&cli.global)?;
    info!(
        "event=cli_command module=cli status=start command={}",
        command_name(&cli.command)
    );

    let db_path = cli.global.db;
    let open_store = || {
        open_db(&db_path)
            .map_err(|err| anyhow!("failed to open database `{}`: {err}", db_path.display()))
    };

    match cli.command {
        Commands::Register(args) => {
            let conn = open_store()?;
            let user = register(&conn, &args.username, &args.email, &args.password)?;
            println!("{}", registered_message(&user));
        }
        Commands::Reserve(args) => {
            let conn = open_store()?;
            let recorded = reserve(
                &conn,
                args.user_id,
                &args.flight_number,
                &args.departure_date,
                args.seat_number.as_deref(),
            )?;
            println!("{}", reserved_message(&recorded));
        }
        Commands::Demo => run_demo(&open_store()?)?,
        Commands::User { key, json } => show_user(&open_store()?, &key, json)?,
        Commands::Reservations { user_id, json } => {
            show_reservations(&open_store()?, user_id, json)?
        }
        Commands::Version => println!("flightbook_core version={}", core_version()),
    }
    Ok(())
}

fn init_cli_logging(global: &Global) -> Result<()> {
    let Some(log_dir) = global.log_dir.as_deref() else {
        return Ok(());
    };
    let level = global.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, log_dir).map_err(anyhow::Error::msg)
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Register(_) => "register",
        Commands::Reserve(_) => "reserve",
        Commands::Demo => "demo",
        Commands::User { .. } => "user",
        Commands::Reservations { .. } => "reservations",
        Commands::Version => "version",
    }
}

fn register(
    conn: &Connection,
    username: &str,
    email: &str,
    password: &str,
) -> Result<User, RegistrationError> {
    let repo = SqliteUserRepository::try_new(conn)?;
    AccountRegistrar::new(repo).register_user(username, email, password)
}

fn reserve(
    conn: &Connection,
    user_id: UserId,
    flight_number: &str,
    departure_date: &str,
    seat_number: Option<&str>,
) -> Result<RecordedReservation, ReservationError> {
    let repo = SqliteReservationRepository::try_new(conn)?;
    ReservationRecorder::new(repo).create_reservation(
        user_id,
        flight_number,
        departure_date,
        seat_number,
    )
}

fn registered_message(user: &User) -> String {
    format!("User '{}' registered successfully!", user.username)
}

fn reserved_message(recorded: &RecordedReservation) -> String {
    format!(
        "Reservation created successfully for user '{}'!",
        recorded.owner.username
    )
}

/// Each step reports its own outcome; a failed step does not stop the next.
fn run_demo(conn: &Connection) -> Result<()> {
    match register(conn, "john_doe", "john@example.com", "password123") {
        Ok(user) => println!("{}", registered_message(&user)),
        Err(RegistrationError::Store(err)) => return Err(err.into()),
        Err(err) => println!("Error: {err}"),
    }

    match reserve(conn, 1, "ABC123", "2024-05-15 10:00:00", Some("A1")) {
        Ok(recorded) => println!("{}", reserved_message(&recorded)),
        Err(ReservationError::Store(err)) => return Err(err.into()),
        Err(err) => println!("Error: {err}"),
    }
    Ok(())
}

fn show_user(conn: &Connection, key: &UserLookupArgs, json: bool) -> Result<()> {
    let registrar = AccountRegistrar::new(SqliteUserRepository::try_new(conn)?);
    let found = match (key.id, key.username.as_deref(), key.email.as_deref()) {
        (Some(id), _, _) => registrar.get_user(id)?,
        (None, Some(username), _) => registrar.find_user_by_username(username)?,
        (None, None, Some(email)) => registrar.find_user_by_email(email)?,
        (None, None, None) => bail!("one of --id, --username or --email is required"),
    };

    let Some(user) = found else {
        bail!("user not found");
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        println!("{} id={}", user, user.id);
    }
    Ok(())
}

fn show_reservations(conn: &Connection, user_id: UserId, json: bool) -> Result<()> {
    let recorder = ReservationRecorder::new(SqliteReservationRepository::try_new(conn)?);
    let reservations = recorder.list_reservations_for_user(user_id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&reservations)?);
        return Ok(());
    }
    for reservation in &reservations {
        println!("{} id={}", reservation, reservation.id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{registered_message, reserved_message, run_demo, Cli, Commands};
    use clap::{CommandFactory, Parser};
    use flightbook_core::{
        open_db_in_memory, parse_departure_date, AccountRegistrar, RecordedReservation,
        Reservation, ReservationRecorder, SqliteReservationRepository, SqliteUserRepository, User,
    };

    fn john() -> User {
        User {
            id: 1,
            username: "john_doe".to_string(),
            email: "john@example.com".to_string(),
            password: "password123".to_string(),
        }
    }

    #[test]
    fn success_messages_name_the_user() {
        assert_eq!(
            registered_message(&john()),
            "User 'john_doe' registered successfully!"
        );

        let recorded = RecordedReservation {
            reservation: Reservation {
                id: 1,
                user_id: 1,
                flight_number: "ABC123".to_string(),
                departure_date: parse_departure_date("2024-05-15 10:00:00").unwrap(),
                seat_number: Some("A1".to_string()),
            },
            owner: john(),
        };
        assert_eq!(
            reserved_message(&recorded),
            "Reservation created successfully for user 'john_doe'!"
        );
    }

    #[test]
    fn demo_continues_past_a_rejected_registration() {
        let conn = open_db_in_memory().unwrap();

        run_demo(&conn).unwrap();
        // Second run: the username is taken, the reservation still goes through.
        run_demo(&conn).unwrap();

        let registrar = AccountRegistrar::new(SqliteUserRepository::try_new(&conn).unwrap());
        assert_eq!(registrar.count_users().unwrap(), 1);
        let recorder =
            ReservationRecorder::new(SqliteReservationRepository::try_new(&conn).unwrap());
        assert_eq!(recorder.count_reservations().unwrap(), 2);
        assert_eq!(recorder.list_reservations_for_user(1).unwrap().len(), 2);
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn reserve_parses_optional_seat() {
        let cli = Cli::parse_from([
            "flightbook",
            "reserve",
            "--user-id",
            "1",
            "--flight-number",
            "ABC123",
            "--departure-date",
            "2024-05-15 10:00:00",
        ]);
        match cli.command {
            Commands::Reserve(args) => {
                assert_eq!(args.user_id, 1);
                assert_eq!(args.departure_date, "2024-05-15 10:00:00");
                assert!(args.seat_number.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn user_lookup_requires_exactly_one_key() {
        assert!(Cli::try_parse_from(["flightbook", "user"]).is_err());
        assert!(Cli::try_parse_from([
            "flightbook",
            "user",
            "--id",
            "1",
            "--username",
            "john_doe"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["flightbook", "user", "--json"]).is_err());
        assert!(Cli::try_parse_from([
            "flightbook",
            "user",
            "--email",
            "john@example.com",
            "--json"
        ])
        .is_ok());
    }
}
