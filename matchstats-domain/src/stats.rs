use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{ServiceError, ServiceResult, ValidationError};

pub type StatId = i64;

/// Non-negative tally, stored as an SQLite `INTEGER`.
pub type StatCount = i64;

/// Player name of a record. Never empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatName(String);

impl StatName {
    pub fn parse(name: &str) -> Result<Self, ValidationError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The seven business fields of one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchStats {
    pub name: StatName,
    pub kills: StatCount,
    pub deaths: StatCount,
    pub assists: StatCount,
    pub damage: StatCount,
    pub earnings: StatCount,
    pub date: String,
}

impl MatchStats {
    /// Kills per death. `None` when the player never died, since the ratio is undefined there.
    pub fn kd_ratio(&self) -> Option<f64> {
        if self.deaths == 0 {
            None
        } else {
            Some(self.kills as f64 / self.deaths as f64)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatRecord {
    pub id: StatId,
    pub stats: MatchStats,
}

#[async_trait::async_trait]
pub trait StatRepository {
    /// Creates the table if needed and seeds it when empty.
    /// Returns the number of seeded rows.
    async fn initialize(&self) -> ServiceResult<usize>;

    /// All records, ascending by id.
    async fn list_all(&self) -> ServiceResult<Vec<StatRecord>>;

    async fn get(&self, id: StatId) -> ServiceResult<Option<StatRecord>>;

    async fn create(&self, stats: &MatchStats) -> ServiceResult<StatRecord>;

    /// Full replacement: every field of the row is overwritten, nothing is merged.
    /// Fails with `ServiceError::NotFound` when no row has this id.
    async fn update(&self, id: StatId, stats: &MatchStats) -> ServiceResult<StatRecord>;

    /// Fails with `ServiceError::NotFound` when no row has this id.
    async fn delete(&self, id: StatId) -> ServiceResult<()>;
}

pub type ArcStatRepository = Arc<Box<dyn StatRepository + Send + Sync>>;

#[derive(Default)]
struct MockStatTable {
    rows: Vec<StatRecord>,
    last_id: StatId,
}

/// In-memory repository with AUTOINCREMENT-like ids, used by tests.
#[derive(Clone, Default)]
pub struct MockStatRepository {
    table: Arc<Mutex<MockStatTable>>,
    seed: Arc<Vec<MatchStats>>,
    broken: bool,
}

impl MockStatRepository {
    pub fn with_seed(seed: Vec<MatchStats>) -> Self {
        Self {
            seed: Arc::new(seed),
            ..Default::default()
        }
    }

    /// A repository whose every operation fails with an internal error.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }

    fn table(&self) -> ServiceResult<MutexGuard<'_, MockStatTable>> {
        if self.broken {
            return ServiceError::internal("mock repository is broken");
        }
        self.table
            .lock()
            .map_err(|_| ServiceError::Internal("mock repository lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl StatRepository for MockStatRepository {
    async fn initialize(&self) -> ServiceResult<usize> {
        let mut table = self.table()?;
        if !table.rows.is_empty() {
            return Ok(0);
        }
        for stats in self.seed.iter() {
            table.last_id += 1;
            let id = table.last_id;
            table.rows.push(StatRecord {
                id,
                stats: stats.clone(),
            });
        }
        Ok(self.seed.len())
    }

    async fn list_all(&self) -> ServiceResult<Vec<StatRecord>> {
        Ok(self.table()?.rows.clone())
    }

    async fn get(&self, id: StatId) -> ServiceResult<Option<StatRecord>> {
        Ok(self.table()?.rows.iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, stats: &MatchStats) -> ServiceResult<StatRecord> {
        let mut table = self.table()?;
        table.last_id += 1;
        let record = StatRecord {
            id: table.last_id,
            stats: stats.clone(),
        };
        table.rows.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: StatId, stats: &MatchStats) -> ServiceResult<StatRecord> {
        let mut table = self.table()?;
        match table.rows.iter_mut().find(|r| r.id == id) {
            Some(row) => {
                row.stats = stats.clone();
                Ok(row.clone())
            }
            None => ServiceError::not_found(format!("Statistic with ID {} not found", id)),
        }
    }

    async fn delete(&self, id: StatId) -> ServiceResult<()> {
        let mut table = self.table()?;
        let before = table.rows.len();
        table.rows.retain(|r| r.id != id);
        if table.rows.len() == before {
            return ServiceError::not_found(format!("Statistic with ID {} not found", id));
        }
        Ok(())
    }
}
