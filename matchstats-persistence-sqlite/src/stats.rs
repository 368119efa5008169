use std::path::{Path, PathBuf};

use log::{debug, info};
use matchstats_domain::{
    ServiceError, ServiceResult,
    stats::{MatchStats, StatId, StatName, StatRecord, StatRepository},
};
use sqlx::{
    Connection, Pool, Row, Sqlite,
    pool::PoolConnection,
    sqlite::SqliteRow,
};

use crate::{create_stats_db_pool, seed::read_seed_file};

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS estatisticas (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nome TEXT NOT NULL,
    abates INTEGER NOT NULL,
    mortes INTEGER NOT NULL,
    assistencias INTEGER NOT NULL,
    dano INTEGER NOT NULL,
    data TEXT NOT NULL,
    dinheiro INTEGER NOT NULL
)";

const INSERT_SQL: &str = "INSERT INTO estatisticas (nome, abates, mortes, assistencias, dano, data, dinheiro) VALUES (?, ?, ?, ?, ?, ?, ?)";

const SELECT_SQL: &str =
    "SELECT id, nome, abates, mortes, assistencias, dano, data, dinheiro FROM estatisticas";

fn db_error(e: sqlx::Error) -> ServiceError {
    ServiceError::Internal(e.to_string())
}

pub struct SqliteStatRepository {
    pool: Pool<Sqlite>,
    seed_path: PathBuf,
}

impl SqliteStatRepository {
    pub fn new(db_path: impl AsRef<Path>, seed_path: impl Into<PathBuf>) -> ServiceResult<Self> {
        let pool = create_stats_db_pool(db_path.as_ref())?;
        Ok(Self {
            pool,
            seed_path: seed_path.into(),
        })
    }

    /// One connection per operation, returned to the pool when dropped.
    async fn connection(&self) -> ServiceResult<PoolConnection<Sqlite>> {
        self.pool.acquire().await.map_err(db_error)
    }

    fn record_from_row(row: &SqliteRow) -> ServiceResult<StatRecord> {
        let name: String = row.try_get("nome").map_err(db_error)?;
        Ok(StatRecord {
            id: row.try_get("id").map_err(db_error)?,
            stats: MatchStats {
                name: StatName::parse(&name).map_err(|e| ServiceError::Internal(e.to_string()))?,
                kills: row.try_get("abates").map_err(db_error)?,
                deaths: row.try_get("mortes").map_err(db_error)?,
                assists: row.try_get("assistencias").map_err(db_error)?,
                damage: row.try_get("dano").map_err(db_error)?,
                earnings: row.try_get("dinheiro").map_err(db_error)?,
                date: row.try_get("data").map_err(db_error)?,
            },
        })
    }
}

fn bind_stats<'q>(
    query: sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    stats: &'q MatchStats,
) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(stats.name.as_str())
        .bind(stats.kills)
        .bind(stats.deaths)
        .bind(stats.assists)
        .bind(stats.damage)
        .bind(stats.date.as_str())
        .bind(stats.earnings)
}

#[async_trait::async_trait]
impl StatRepository for SqliteStatRepository {
    async fn initialize(&self) -> ServiceResult<usize> {
        let mut conn = self.connection().await?;

        sqlx::query(CREATE_TABLE_SQL)
            .execute(&mut *conn)
            .await
            .map_err(db_error)?;

        // Write lock first, so concurrent cold starts cannot both see an empty table.
        let mut tx = conn.begin_with("BEGIN IMMEDIATE").await.map_err(db_error)?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM estatisticas")
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?;
        if total > 0 {
            debug!("Statistics table already holds {} rows", total);
            return Ok(0);
        }

        let rows = read_seed_file(&self.seed_path).await?;
        for stats in &rows {
            bind_stats(sqlx::query(INSERT_SQL), stats)
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }
        tx.commit().await.map_err(db_error)?;

        info!(
            "Seeded {} statistics from {}",
            rows.len(),
            self.seed_path.display()
        );
        Ok(rows.len())
    }

    async fn list_all(&self) -> ServiceResult<Vec<StatRecord>> {
        let mut conn = self.connection().await?;
        let rows = sqlx::query(&format!("{} ORDER BY id", SELECT_SQL))
            .fetch_all(&mut *conn)
            .await
            .map_err(db_error)?;
        rows.iter().map(Self::record_from_row).collect()
    }

    async fn get(&self, id: StatId) -> ServiceResult<Option<StatRecord>> {
        let mut conn = self.connection().await?;
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_SQL))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(db_error)?;
        row.as_ref().map(Self::record_from_row).transpose()
    }

    async fn create(&self, stats: &MatchStats) -> ServiceResult<StatRecord> {
        let mut conn = self.connection().await?;
        // Id is auto-incremented
        let res = bind_stats(sqlx::query(INSERT_SQL), stats)
            .execute(&mut *conn)
            .await
            .map_err(db_error)?;
        Ok(StatRecord {
            id: res.last_insert_rowid(),
            stats: stats.clone(),
        })
    }

    async fn update(&self, id: StatId, stats: &MatchStats) -> ServiceResult<StatRecord> {
        let mut conn = self.connection().await?;
        let res = bind_stats(
            sqlx::query(
                "UPDATE estatisticas SET nome = ?, abates = ?, mortes = ?, assistencias = ?, dano = ?, data = ?, dinheiro = ? WHERE id = ?",
            ),
            stats,
        )
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(db_error)?;

        if res.rows_affected() == 0 {
            return ServiceError::not_found(format!("Statistic with ID {} not found", id));
        }
        Ok(StatRecord {
            id,
            stats: stats.clone(),
        })
    }

    async fn delete(&self, id: StatId) -> ServiceResult<()> {
        let mut conn = self.connection().await?;
        let res = sqlx::query("DELETE FROM estatisticas WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(db_error)?;

        if res.rows_affected() == 0 {
            return ServiceError::not_found(format!("Statistic with ID {} not found", id));
        }
        Ok(())
    }
}
