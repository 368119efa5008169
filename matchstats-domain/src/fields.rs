use std::collections::BTreeMap;

use serde_json::Value;

use crate::{
    ValidationError,
    stats::{MatchStats, StatCount, StatName},
};

/// A request payload normalized to one shape, whatever encoding it arrived in.
pub type FieldMap = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatField {
    Name,
    Kills,
    Deaths,
    Assists,
    Damage,
    Earnings,
    Date,
}

impl StatField {
    pub const ALL: [StatField; 7] = [
        StatField::Name,
        StatField::Kills,
        StatField::Deaths,
        StatField::Assists,
        StatField::Damage,
        StatField::Earnings,
        StatField::Date,
    ];

    /// Key used by the JSON API.
    pub fn key(self) -> &'static str {
        match self {
            StatField::Name => "name",
            StatField::Kills => "kills",
            StatField::Deaths => "deaths",
            StatField::Assists => "assists",
            StatField::Damage => "damage",
            StatField::Earnings => "earnings",
            StatField::Date => "date",
        }
    }

    /// Column name in the `estatisticas` table and the seed CSV. Also accepted as a payload key.
    pub fn column(self) -> &'static str {
        match self {
            StatField::Name => "nome",
            StatField::Kills => "abates",
            StatField::Deaths => "mortes",
            StatField::Assists => "assistencias",
            StatField::Damage => "dano",
            StatField::Earnings => "dinheiro",
            StatField::Date => "data",
        }
    }

    fn lookup(self, fields: &FieldMap) -> Option<&Value> {
        fields
            .get(self.key())
            .or_else(|| fields.get(self.column()))
            .filter(|value| !value.is_null())
    }
}

/// Strict base-10 parse of a non-negative count: ASCII digits with an optional leading `+`.
/// Minus signs, whitespace and separators are rejected.
pub fn parse_count(text: &str) -> Option<StatCount> {
    let digits = text.strip_prefix('+').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn coerce_count(value: &Value) -> Option<StatCount> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| StatCount::try_from(n).ok()),
        Value::String(s) => parse_count(s.trim()),
        _ => None,
    }
}

impl MatchStats {
    /// Validates a payload. Absent fields are reported first, then fields of the wrong type,
    /// then an empty name. Unknown keys, `id` included, are ignored.
    pub fn from_fields(fields: &FieldMap) -> Result<Self, ValidationError> {
        let missing: Vec<String> = StatField::ALL
            .iter()
            .filter(|field| field.lookup(fields).is_none())
            .map(|field| field.key().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        let mut invalid = Vec::new();

        let name = StatField::Name.lookup(fields).and_then(Value::as_str);
        if name.is_none() {
            invalid.push(StatField::Name.key().to_string());
        }

        let mut count = |field: StatField| match field.lookup(fields).and_then(coerce_count) {
            Some(value) => value,
            None => {
                invalid.push(field.key().to_string());
                0
            }
        };
        let kills = count(StatField::Kills);
        let deaths = count(StatField::Deaths);
        let assists = count(StatField::Assists);
        let damage = count(StatField::Damage);
        let earnings = count(StatField::Earnings);

        let date = StatField::Date.lookup(fields).and_then(Value::as_str);
        if date.is_none() {
            invalid.push(StatField::Date.key().to_string());
        }

        let (Some(name), Some(date)) = (name, date) else {
            return Err(ValidationError::InvalidFields(invalid));
        };
        if !invalid.is_empty() {
            return Err(ValidationError::InvalidFields(invalid));
        }

        Ok(MatchStats {
            name: StatName::parse(name)?,
            kills,
            deaths,
            assists,
            damage,
            earnings,
            date: date.to_string(),
        })
    }
}
