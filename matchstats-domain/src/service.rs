use std::sync::Arc;

use log::{debug, info};

use crate::{
    ServiceError, ServiceResult,
    audit::{ArcAuditLog, AuditEntry, events},
    fields::FieldMap,
    stats::{ArcStatRepository, MatchStats, StatId, StatRecord},
};

#[async_trait::async_trait]
pub trait StatService {
    /// Startup initialization. Records `inicializa_banco` once the store is ready.
    async fn bootstrap(&self) -> ServiceResult<usize>;
    /// Silent re-initialization, for deployments where every request may hit a fresh store.
    async fn ensure_ready(&self) -> ServiceResult<()>;
    async fn list_stats(&self) -> ServiceResult<Vec<StatRecord>>;
    async fn get_stat(&self, id: StatId) -> ServiceResult<StatRecord>;
    async fn create_stat(&self, fields: &FieldMap) -> ServiceResult<StatRecord>;
    async fn update_stat(&self, id: StatId, fields: &FieldMap) -> ServiceResult<StatRecord>;
    async fn delete_stat(&self, id: StatId) -> ServiceResult<()>;
    fn list_logs(&self) -> ServiceResult<Vec<AuditEntry>>;
}

pub type ArcStatService = Arc<Box<dyn StatService + Send + Sync>>;

pub struct StatServiceImpl {
    stat_repository: ArcStatRepository,
    audit_log: ArcAuditLog,
}

impl StatServiceImpl {
    pub fn new(stat_repository: ArcStatRepository, audit_log: ArcAuditLog) -> Self {
        Self {
            stat_repository,
            audit_log,
        }
    }
}

#[async_trait::async_trait]
impl StatService for StatServiceImpl {
    async fn bootstrap(&self) -> ServiceResult<usize> {
        let seeded = self.stat_repository.initialize().await?;
        if seeded > 0 {
            info!("Seeded {} statistics", seeded);
        }
        self.audit_log
            .record(events::INIT_DB, "banco foi inicializado");
        Ok(seeded)
    }

    async fn ensure_ready(&self) -> ServiceResult<()> {
        self.stat_repository.initialize().await?;
        Ok(())
    }

    async fn list_stats(&self) -> ServiceResult<Vec<StatRecord>> {
        let records = self.stat_repository.list_all().await?;
        self.audit_log
            .record(events::ROUTE_ACCESS, "rota estatisticas foi acessada");
        Ok(records)
    }

    async fn get_stat(&self, id: StatId) -> ServiceResult<StatRecord> {
        match self.stat_repository.get(id).await? {
            Some(record) => Ok(record),
            None => ServiceError::not_found(format!("Statistic with ID {} not found", id)),
        }
    }

    async fn create_stat(&self, fields: &FieldMap) -> ServiceResult<StatRecord> {
        let stats = MatchStats::from_fields(fields)?;
        let record = self.stat_repository.create(&stats).await?;
        debug!("Created statistic {}", record.id);
        self.audit_log.record(
            events::STAT_CREATED,
            &format!("estatistica {} criada para {}", record.id, record.stats.name),
        );
        Ok(record)
    }

    async fn update_stat(&self, id: StatId, fields: &FieldMap) -> ServiceResult<StatRecord> {
        let stats = MatchStats::from_fields(fields)?;
        let record = self.stat_repository.update(id, &stats).await?;
        debug!("Updated statistic {}", id);
        self.audit_log
            .record(events::STAT_UPDATED, &format!("estatistica {} atualizada", id));
        Ok(record)
    }

    async fn delete_stat(&self, id: StatId) -> ServiceResult<()> {
        self.stat_repository.delete(id).await?;
        debug!("Deleted statistic {}", id);
        self.audit_log
            .record(events::STAT_DELETED, &format!("estatistica {} removida", id));
        Ok(())
    }

    fn list_logs(&self) -> ServiceResult<Vec<AuditEntry>> {
        self.audit_log.read_all()
    }
}
