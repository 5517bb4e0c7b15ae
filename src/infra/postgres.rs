//! PostgreSQL fleet client backed by sqlx.
//!
//! Every resource is a database on one server. Connections are plain
//! `PgConnection`s, never pooled: a worker owns one session per database and
//! the session settings (`vacuum_cost_*`, `statement_timeout`) must stick to
//! it.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection, FromRow};
use tracing::{debug, warn};

use crate::config::Credentials;
use crate::core::client::{ResourceClient, SessionSetting};
use crate::core::error::MaintenanceError;
use crate::core::model::{ItemName, DEFAULT_SCHEMA};
use crate::core::policy::{Candidate, MaintenanceOp, Policy, Urgency};

/// `application_name` reported by every session.
pub const APPLICATION_NAME: &str = "flexible_freeze";

/// Database used for discovery.
const MAINTENANCE_DB: &str = "postgres";

const LIST_DATABASES: &str = r"
SELECT datname
FROM pg_database
WHERE datname NOT IN ('postgres', 'template0', 'template1')
  AND datallowconn
ORDER BY age(datfrozenxid) DESC";

const FREEZE_CANDIDATES: &str = r"
WITH tabfreeze AS (
    SELECT n.nspname::text AS schema_name,
           c.relname::text AS relation_name,
           greatest(age(c.relfrozenxid), age(t.relfrozenxid))::int8 AS freeze_age
    FROM pg_class c
    JOIN pg_namespace n ON c.relnamespace = n.oid
    LEFT JOIN pg_class t ON c.reltoastrelid = t.oid
    WHERE n.nspname NOT IN ('pg_catalog', 'information_schema')
      AND n.nspname NOT LIKE 'pg_temp%'
      AND c.relkind = 'r'
)
SELECT schema_name, relation_name, freeze_age
FROM tabfreeze
WHERE freeze_age > $1
  AND NOT (relation_name = ANY($2) AND schema_name = $3)
  AND NOT (schema_name || '.' || relation_name) = ANY($2)
ORDER BY freeze_age DESC
LIMIT $4";

const DECAY_CANDIDATES: &str = r"
WITH deadrow_tables AS (
    SELECT schemaname::text AS schema_name,
           relname::text AS relation_name,
           (n_dead_tup::float8 / (n_live_tup + 1)) AS dead_ratio,
           pg_relation_size(relid) AS size_bytes
    FROM pg_stat_user_tables
    WHERE n_dead_tup > $1
      AND (last_autovacuum IS NULL OR now() - last_autovacuum > make_interval(secs => $2))
      AND (last_vacuum IS NULL OR now() - last_vacuum > make_interval(secs => $2))
)
SELECT schema_name, relation_name, dead_ratio, size_bytes
FROM deadrow_tables
WHERE dead_ratio > $3
  AND size_bytes > $4
  AND NOT (relation_name = ANY($5) AND schema_name = $6)
  AND NOT (schema_name || '.' || relation_name) = ANY($5)
ORDER BY dead_ratio DESC, size_bytes DESC";

#[derive(Debug, FromRow)]
struct FreezeRow {
    schema_name: String,
    relation_name: String,
    freeze_age: i64,
}

#[derive(Debug, FromRow)]
struct DecayRow {
    schema_name: String,
    relation_name: String,
    dead_ratio: f64,
    size_bytes: i64,
}

/// Open session to one database.
#[derive(Debug)]
pub struct PgSession {
    database: String,
    backend_pid: i32,
    conn: PgConnection,
}

impl PgSession {
    /// Database the session is connected to.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Server process id serving this session.
    #[must_use]
    pub const fn backend_pid(&self) -> i32 {
        self.backend_pid
    }
}

/// Client for every database on one PostgreSQL server.
#[derive(Debug, Clone)]
pub struct PgClient {
    base: PgConnectOptions,
}

impl PgClient {
    /// Build a client from explicit credentials. Unset fields use the libpq
    /// environment (`PGHOST`, `PGUSER`, ...) as sqlx resolves it.
    #[must_use]
    pub fn new(credentials: &Credentials) -> Self {
        let mut base = PgConnectOptions::new().application_name(APPLICATION_NAME);
        if let Some(host) = credentials.host.as_deref().filter(|h| !h.is_empty()) {
            base = base.host(host);
        }
        if let Some(port) = credentials.port {
            base = base.port(port);
        }
        if let Some(user) = credentials.user.as_deref().filter(|u| !u.is_empty()) {
            base = base.username(user);
        }
        if let Some(password) = credentials.password.as_deref().filter(|p| !p.is_empty()) {
            base = base.password(password);
        }
        Self {
            base: base.disable_statement_logging(),
        }
    }

    fn options_for(&self, database: &str) -> PgConnectOptions {
        self.base.clone().database(database)
    }

    async fn open(&self, database: &str) -> Result<PgConnection, MaintenanceError> {
        self.options_for(database)
            .connect()
            .await
            .map_err(|e| MaintenanceError::Connection {
                resource: database.to_string(),
                reason: e.to_string(),
            })
    }

    async fn cancel_backend(&self, session: &PgSession) -> Result<(), sqlx::Error> {
        let mut side = self.options_for(&session.database).connect().await?;
        let cancelled: bool = sqlx::query_scalar("SELECT pg_cancel_backend($1)")
            .bind(session.backend_pid)
            .fetch_one(&mut side)
            .await?;
        debug!(database = %session.database, pid = session.backend_pid, cancelled, "cancel requested");
        side.close().await
    }
}

fn query_error(resource: &str, e: &sqlx::Error) -> MaintenanceError {
    MaintenanceError::Query {
        resource: resource.to_string(),
        reason: e.to_string(),
    }
}

#[async_trait]
impl ResourceClient for PgClient {
    type Connection = PgSession;

    async fn list_resources(&self) -> Result<Vec<String>, MaintenanceError> {
        let mut conn = self.open(MAINTENANCE_DB).await?;
        let names: Vec<String> = sqlx::query_scalar(LIST_DATABASES)
            .fetch_all(&mut conn)
            .await
            .map_err(|e| query_error(MAINTENANCE_DB, &e))?;
        if let Err(e) = conn.close().await {
            warn!(error = %e, "failed to close discovery connection");
        }
        Ok(names)
    }

    async fn connect(&self, resource: &str) -> Result<PgSession, MaintenanceError> {
        let mut conn = self.open(resource).await?;
        let backend_pid: i32 = sqlx::query_scalar("SELECT pg_backend_pid()")
            .fetch_one(&mut conn)
            .await
            .map_err(|e| query_error(resource, &e))?;
        debug!(database = resource, backend_pid, "connected");
        Ok(PgSession {
            database: resource.to_string(),
            backend_pid,
            conn,
        })
    }

    async fn candidates(
        &self,
        session: &mut PgSession,
        policy: &Policy,
        excluded: &[String],
    ) -> Result<Vec<Candidate>, MaintenanceError> {
        let excluded = excluded.to_vec();
        let candidates = match policy {
            Policy::Freeze(t) => {
                let limit = i64::try_from(t.limit).unwrap_or(i64::MAX);
                let rows: Vec<FreezeRow> = sqlx::query_as(FREEZE_CANDIDATES)
                    .bind(t.min_age)
                    .bind(&excluded)
                    .bind(DEFAULT_SCHEMA)
                    .bind(limit)
                    .fetch_all(&mut session.conn)
                    .await
                    .map_err(|e| query_error(&session.database, &e))?;
                rows.into_iter()
                    .map(|row| Candidate {
                        name: ItemName::new(row.schema_name, row.relation_name),
                        urgency: Urgency::FreezeAge(row.freeze_age),
                    })
                    .collect()
            }
            Policy::Decay(t) => {
                let rows: Vec<DecayRow> = sqlx::query_as(DECAY_CANDIDATES)
                    .bind(t.min_dead_rows)
                    .bind(t.quiet_period.as_secs_f64())
                    .bind(t.min_dead_ratio)
                    .bind(t.min_size_bytes)
                    .bind(&excluded)
                    .bind(DEFAULT_SCHEMA)
                    .fetch_all(&mut session.conn)
                    .await
                    .map_err(|e| query_error(&session.database, &e))?;
                rows.into_iter()
                    .map(|row| Candidate {
                        name: ItemName::new(row.schema_name, row.relation_name),
                        urgency: Urgency::Decay {
                            dead_ratio: row.dead_ratio,
                            size_bytes: row.size_bytes,
                        },
                    })
                    .collect()
            }
        };
        Ok(candidates)
    }

    async fn apply_setting(
        &self,
        session: &mut PgSession,
        setting: SessionSetting,
    ) -> Result<(), MaintenanceError> {
        sqlx::query("SELECT set_config($1, $2, false)")
            .bind(setting.key())
            .bind(setting.value())
            .execute(&mut session.conn)
            .await
            .map_err(|e| query_error(&session.database, &e))?;
        Ok(())
    }

    async fn maintain(
        &self,
        session: &mut PgSession,
        item: &ItemName,
        op: MaintenanceOp,
    ) -> Result<(), MaintenanceError> {
        let statement = op.statement(item);
        debug!(database = %session.database, %statement, "executing");
        sqlx::query(&statement)
            .persistent(false)
            .execute(&mut session.conn)
            .await
            .map_err(|e| MaintenanceError::Operation {
                item: item.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn close(&self, session: PgSession) {
        let database = session.database;
        if let Err(e) = session.conn.close().await {
            warn!(%database, error = %e, "failed to close connection");
        }
    }

    async fn abort(&self, session: PgSession) {
        if let Err(e) = self.cancel_backend(&session).await {
            warn!(database = %session.database, pid = session.backend_pid, error = %e, "could not cancel backend");
        }
        drop(session.conn);
    }
}
