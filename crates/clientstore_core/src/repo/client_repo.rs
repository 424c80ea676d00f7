//! Client store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the query surface over canonical `clients` storage.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `delete_by_id` is the only operation reporting a missing row as an error.
//! - Predicate-based reads and deletes treat "no match" as an empty result.
//! - List results are ordered by `id` ascending.
//! - CPF values are unique across stored clients.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::client::{Client, ClientId, ClientValidationError, Timestamp};
use log::info;
use rusqlite::types::FromSql;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Params, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const CLIENT_SELECT_SQL: &str = "SELECT
    id,
    name,
    cpf,
    income,
    birth_date
FROM clients";

const CLIENT_COLUMNS: [&str; 5] = ["id", "name", "cpf", "income", "birth_date"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for client persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ClientValidationError),
    Db(DbError),
    NotFound(ClientId),
    /// Another client already owns this CPF.
    DuplicateCpf(String),
    /// No identifier above the largest one ever stored is left to generate.
    IdSpaceExhausted,
    InvalidData(String),
    /// A `LIKE` pattern could not be compiled by an in-process matcher.
    InvalidPattern {
        pattern: String,
        message: String,
    },
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "client not found: {id}"),
            Self::DuplicateCpf(_) => write!(f, "cpf already belongs to another client"),
            Self::IdSpaceExhausted => write!(f, "no client identifier left to generate"),
            Self::InvalidData(message) => write!(f, "invalid persisted client data: {message}"),
            Self::InvalidPattern { pattern, message } => {
                write!(f, "invalid like pattern `{pattern}`: {message}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::DuplicateCpf(_)
            | Self::IdSpaceExhausted
            | Self::InvalidData(_)
            | Self::InvalidPattern { .. }
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<ClientValidationError> for RepoError {
    fn from(value: ClientValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query surface over stored clients.
///
/// Every list-returning method yields clients ordered by `id` ascending.
pub trait ClientStore {
    /// Inserts or fully updates a client and returns its identifier.
    ///
    /// A record with `id = None` gets a generated identifier. A record with
    /// an identifier replaces every field of the stored row, or is inserted
    /// under that identifier when no such row exists.
    fn save(&self, client: &Client) -> RepoResult<ClientId>;
    fn find_by_id(&self, id: ClientId) -> RepoResult<Option<Client>>;
    fn exists_by_id(&self, id: ClientId) -> RepoResult<bool>;
    fn find_all(&self) -> RepoResult<Vec<Client>>;
    fn count(&self) -> RepoResult<u64>;
    /// Removes one client; `RepoError::NotFound` when `id` is unknown.
    fn delete_by_id(&self, id: ClientId) -> RepoResult<()>;
    /// Removes the stored row of `client`; unsaved or already-removed
    /// records are a no-op.
    fn delete(&self, client: &Client) -> RepoResult<()>;
    /// Removes every client and returns how many rows were removed.
    fn delete_all(&self) -> RepoResult<usize>;
    fn find_by_cpf(&self, cpf: &str) -> RepoResult<Option<Client>>;
    fn delete_by_cpf(&self, cpf: &str) -> RepoResult<usize>;
    /// `%` matches any run of characters, `_` exactly one.
    fn find_by_cpf_like(&self, pattern: &str) -> RepoResult<Vec<Client>>;
    /// Exact, case-sensitive name match.
    fn find_by_name(&self, name: &str) -> RepoResult<Vec<Client>>;
    fn find_by_income_greater_than(&self, threshold: f64) -> RepoResult<Vec<Client>>;
    fn find_by_income_less_than(&self, threshold: f64) -> RepoResult<Vec<Client>>;
    /// Inclusive on both ends; empty when `low > high`.
    fn find_by_income_between(&self, low: f64, high: f64) -> RepoResult<Vec<Client>>;
    fn delete_by_income_greater_than(&self, threshold: f64) -> RepoResult<usize>;
    /// Inclusive on both ends; empty when `start > end`.
    fn find_by_birth_date_between(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> RepoResult<Vec<Client>>;
}

/// SQLite-backed client store.
pub struct SqliteClientStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteClientStore<'conn> {
    /// Constructs a store from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema
    ///   does not carry the `clients` shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_client_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn query_clients<P: Params>(&self, filter: &str, params: P) -> RepoResult<Vec<Client>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CLIENT_SELECT_SQL} {filter} ORDER BY id ASC;"))?;
        let mut rows = stmt.query(params)?;
        let mut clients = Vec::new();

        while let Some(row) = rows.next()? {
            clients.push(parse_client_row(row)?);
        }

        Ok(clients)
    }

    /// `AUTOINCREMENT` reports `SQLITE_FULL` once `sqlite_sequence` holds
    /// `ClientId::MAX`.
    fn id_space_exhausted(&self, err: &rusqlite::Error) -> RepoResult<bool> {
        if err.sqlite_error_code() != Some(ErrorCode::DiskFull) {
            return Ok(false);
        }

        let seq: Option<ClientId> = self
            .conn
            .query_row(
                "SELECT seq FROM sqlite_sequence WHERE name = 'clients';",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(seq == Some(ClientId::MAX))
    }

    fn query_one<P: Params>(&self, filter: &str, params: P) -> RepoResult<Option<Client>> {
        Ok(self.query_clients(filter, params)?.into_iter().next())
    }
}

impl ClientStore for SqliteClientStore<'_> {
    fn save(&self, client: &Client) -> RepoResult<ClientId> {
        client.validate()?;

        let result = self.conn.execute(
            "INSERT INTO clients (id, name, cpf, income, birth_date)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                cpf = excluded.cpf,
                income = excluded.income,
                birth_date = excluded.birth_date;",
            params![
                client.id,
                client.name.as_str(),
                client.cpf.as_str(),
                client.income,
                client.birth_date,
            ],
        );

        if let Err(err) = result {
            if is_unique_violation(&err) {
                return Err(RepoError::DuplicateCpf(client.cpf.clone()));
            }
            if client.id.is_none() && self.id_space_exhausted(&err)? {
                return Err(RepoError::IdSpaceExhausted);
            }
            return Err(err.into());
        }

        let id = client.id.unwrap_or_else(|| self.conn.last_insert_rowid());
        info!("event=client_save module=repo status=ok client_id={id}");
        Ok(id)
    }

    fn find_by_id(&self, id: ClientId) -> RepoResult<Option<Client>> {
        self.query_one("WHERE id = ?1", [id])
    }

    fn exists_by_id(&self, id: ClientId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM clients WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn find_all(&self) -> RepoResult<Vec<Client>> {
        self.query_clients("", [])
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM clients;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }

    fn delete_by_id(&self, id: ClientId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM clients WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        info!("event=client_delete module=repo status=ok by=id client_id={id}");
        Ok(())
    }

    fn delete(&self, client: &Client) -> RepoResult<()> {
        let Some(id) = client.id else {
            return Ok(());
        };

        let changed = self
            .conn
            .execute("DELETE FROM clients WHERE id = ?1;", [id])?;
        info!("event=client_delete module=repo status=ok by=entity client_id={id} removed={changed}");
        Ok(())
    }

    fn delete_all(&self) -> RepoResult<usize> {
        let removed = self.conn.execute("DELETE FROM clients;", [])?;
        info!("event=client_delete module=repo status=ok by=all removed={removed}");
        Ok(removed)
    }

    fn find_by_cpf(&self, cpf: &str) -> RepoResult<Option<Client>> {
        self.query_one("WHERE cpf = ?1", [cpf])
    }

    fn delete_by_cpf(&self, cpf: &str) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM clients WHERE cpf = ?1;", [cpf])?;
        info!("event=client_delete module=repo status=ok by=cpf removed={removed}");
        Ok(removed)
    }

    fn find_by_cpf_like(&self, pattern: &str) -> RepoResult<Vec<Client>> {
        self.query_clients("WHERE cpf LIKE ?1", [pattern])
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Vec<Client>> {
        self.query_clients("WHERE name = ?1", [name])
    }

    fn find_by_income_greater_than(&self, threshold: f64) -> RepoResult<Vec<Client>> {
        self.query_clients("WHERE income > ?1", [threshold])
    }

    fn find_by_income_less_than(&self, threshold: f64) -> RepoResult<Vec<Client>> {
        self.query_clients("WHERE income < ?1", [threshold])
    }

    fn find_by_income_between(&self, low: f64, high: f64) -> RepoResult<Vec<Client>> {
        self.query_clients("WHERE income BETWEEN ?1 AND ?2", [low, high])
    }

    fn delete_by_income_greater_than(&self, threshold: f64) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM clients WHERE income > ?1;", [threshold])?;
        info!("event=client_delete module=repo status=ok by=income_gt removed={removed}");
        Ok(removed)
    }

    fn find_by_birth_date_between(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> RepoResult<Vec<Client>> {
        self.query_clients("WHERE birth_date BETWEEN ?1 AND ?2", [start, end])
    }
}

fn parse_client_row(row: &Row<'_>) -> RepoResult<Client> {
    Ok(Client {
        id: Some(column(row, "id")?),
        name: column(row, "name")?,
        cpf: column(row, "cpf")?,
        income: column(row, "income")?,
        birth_date: column(row, "birth_date")?,
    })
}

fn column<T: FromSql>(row: &Row<'_>, name: &'static str) -> RepoResult<T> {
    row.get(name).map_err(|err| match err {
        rusqlite::Error::InvalidColumnType(_, _, actual) => RepoError::InvalidData(format!(
            "unexpected {actual} value in clients.{name}"
        )),
        rusqlite::Error::FromSqlConversionFailure(_, actual, _) => RepoError::InvalidData(
            format!("unconvertible {actual} value in clients.{name}"),
        ),
        other => other.into(),
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn ensure_client_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "clients")? {
        return Err(RepoError::MissingRequiredTable("clients"));
    }

    for column in CLIENT_COLUMNS {
        if !table_has_column(conn, "clients", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "clients",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
