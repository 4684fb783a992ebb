//! SQLite-backed token adapter
//!
//! Persists refresh-token records in a single table keyed by the token
//! value. The rotation race is settled by the database: consume is one
//! conditional UPDATE, and `rows_affected` tells the winner apart from the
//! losers.

use std::path::Path;

use async_trait::async_trait;
use sqlx::{
	sqlite::{self, SqlitePool, SqliteRow},
	Row,
};

use gateward::{
	prelude::*,
	token_adapter::{self, ConsumeOutcome, RefreshTokenRecord},
};

fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

fn map_res<T, F>(row: Result<SqliteRow, sqlx::Error>, f: F) -> GwResult<T>
where
	F: FnOnce(SqliteRow) -> Result<T, sqlx::Error>,
{
	match row {
		Ok(row) => f(row).inspect_err(inspect).map_err(|_| Error::DbError),
		Err(sqlx::Error::RowNotFound) => Err(Error::NotFound),
		Err(err) => {
			inspect(&err);
			Err(Error::DbError)
		}
	}
}

fn row_to_record(row: &SqliteRow) -> Result<RefreshTokenRecord, sqlx::Error> {
	Ok(RefreshTokenRecord {
		token: row.try_get::<String, _>(0)?.into(),
		subject_id: SubjectId(row.try_get(1)?),
		handle: row.try_get::<String, _>(2)?.into(),
		expires_at: Timestamp(row.try_get(3)?),
		revoked: row.try_get(4)?,
	})
}

#[derive(Debug)]
pub struct TokenAdapterSqlite {
	db: SqlitePool,
}

impl TokenAdapterSqlite {
	pub async fn new(path: impl AsRef<Path>) -> GwResult<Self> {
		let opts = sqlite::SqliteConnectOptions::new()
			.filename(path.as_ref())
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(inspect)
			.or(Err(Error::DbError))?;

		init_db(&db).await.inspect_err(inspect).or(Err(Error::DbError))?;

		Ok(Self { db })
	}
}

#[async_trait]
impl token_adapter::TokenAdapter for TokenAdapterSqlite {
	async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> GwResult<()> {
		sqlx::query(
			"INSERT INTO refresh_tokens (token, subject_id, handle, expires_at, revoked)
			VALUES (?1, ?2, ?3, ?4, ?5)",
		)
		.bind(&*record.token)
		.bind(record.subject_id.0)
		.bind(&*record.handle)
		.bind(record.expires_at.0)
		.bind(record.revoked)
		.execute(&self.db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;
		Ok(())
	}

	async fn read_refresh_token(&self, token: &str) -> GwResult<RefreshTokenRecord> {
		let row = sqlx::query(
			"SELECT token, subject_id, handle, expires_at, revoked
			FROM refresh_tokens WHERE token = ?1",
		)
		.bind(token)
		.fetch_one(&self.db)
		.await;
		map_res(row, |row| row_to_record(&row))
	}

	async fn consume_refresh_token(
		&self,
		token: &str,
		now: Timestamp,
	) -> GwResult<ConsumeOutcome> {
		// At most one caller flips revoked 0 -> 1 on a live record
		let res = sqlx::query(
			"UPDATE refresh_tokens SET revoked = 1
			WHERE token = ?1 AND revoked = 0 AND expires_at > ?2",
		)
		.bind(token)
		.bind(now.0)
		.execute(&self.db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;
		if res.rows_affected() == 1 {
			return Ok(ConsumeOutcome::Consumed);
		}

		// Lost the update: tell an already-revoked record apart from a
		// missing or expired one
		let row = sqlx::query("SELECT revoked FROM refresh_tokens WHERE token = ?1")
			.bind(token)
			.fetch_optional(&self.db)
			.await
			.inspect_err(inspect)
			.map_err(|_| Error::DbError)?;
		match row {
			Some(row) => {
				let revoked: bool =
					row.try_get(0).inspect_err(inspect).map_err(|_| Error::DbError)?;
				if revoked {
					Ok(ConsumeOutcome::AlreadyUsed)
				} else {
					Ok(ConsumeOutcome::Missing)
				}
			}
			None => Ok(ConsumeOutcome::Missing),
		}
	}

	async fn revoke_refresh_token(&self, token: &str) -> GwResult<()> {
		sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE token = ?1")
			.bind(token)
			.execute(&self.db)
			.await
			.inspect_err(inspect)
			.map_err(|_| Error::DbError)?;
		Ok(())
	}

	async fn list_subject_tokens(
		&self,
		subject_id: SubjectId,
	) -> GwResult<Vec<RefreshTokenRecord>> {
		let rows = sqlx::query(
			"SELECT token, subject_id, handle, expires_at, revoked
			FROM refresh_tokens WHERE subject_id = ?1",
		)
		.bind(subject_id.0)
		.fetch_all(&self.db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

		let mut records = Vec::with_capacity(rows.len());
		for row in rows {
			records.push(row_to_record(&row).inspect_err(inspect).map_err(|_| Error::DbError)?);
		}
		Ok(records)
	}

	async fn purge_expired(&self, now: Timestamp) -> GwResult<u32> {
		let res = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= ?1")
			.bind(now.0)
			.execute(&self.db)
			.await
			.inspect_err(inspect)
			.map_err(|_| Error::DbError)?;
		Ok(res.rows_affected() as u32)
	}
}

async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS refresh_tokens (
			token TEXT NOT NULL PRIMARY KEY,
			subject_id INTEGER NOT NULL,
			handle TEXT NOT NULL,
			expires_at INTEGER NOT NULL,
			revoked INTEGER NOT NULL DEFAULT 0
		)",
	)
	.execute(db)
	.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_refresh_tokens_subject
		ON refresh_tokens (subject_id)",
	)
	.execute(db)
	.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_refresh_tokens_expires
		ON refresh_tokens (expires_at)",
	)
	.execute(db)
	.await?;

	Ok(())
}

// vim: ts=4
