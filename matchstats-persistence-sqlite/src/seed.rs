use std::{io::Read, path::Path};

use matchstats_domain::{
    ServiceError, ServiceResult,
    fields::{StatField, parse_count},
    stats::{MatchStats, StatName},
};

/// One row of the seed dataset, header `nome,abates,mortes,assistencias,dano,data,dinheiro`.
#[derive(Debug, serde::Deserialize)]
struct SeedRow {
    nome: String,
    abates: String,
    mortes: String,
    assistencias: String,
    dano: String,
    data: String,
    dinheiro: String,
}

impl SeedRow {
    fn into_stats(self, line: usize) -> ServiceResult<MatchStats> {
        let count = |field: StatField, raw: &str| {
            parse_count(raw.trim()).ok_or_else(|| {
                ServiceError::Internal(format!(
                    "Seed row {}: column '{}' is not a non-negative integer: '{}'",
                    line,
                    field.column(),
                    raw
                ))
            })
        };
        Ok(MatchStats {
            name: StatName::parse(&self.nome).map_err(|e| {
                ServiceError::Internal(format!("Seed row {}: {}", line, e))
            })?,
            kills: count(StatField::Kills, &self.abates)?,
            deaths: count(StatField::Deaths, &self.mortes)?,
            assists: count(StatField::Assists, &self.assistencias)?,
            damage: count(StatField::Damage, &self.dano)?,
            earnings: count(StatField::Earnings, &self.dinheiro)?,
            date: self.data,
        })
    }
}

/// Parses a whole seed dataset. Any bad row fails the whole read.
pub fn read_seed<R: Read>(reader: R) -> ServiceResult<Vec<MatchStats>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    csv_reader
        .deserialize::<SeedRow>()
        .enumerate()
        .map(|(index, row)| {
            let line = index + 1;
            row.map_err(|e| ServiceError::Internal(format!("Seed row {}: {}", line, e)))?
                .into_stats(line)
        })
        .collect()
}

pub async fn read_seed_file(path: &Path) -> ServiceResult<Vec<MatchStats>> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        ServiceError::Internal(format!(
            "Failed to read seed file {}: {}",
            path.display(),
            e
        ))
    })?;
    read_seed(bytes.as_slice())
}
