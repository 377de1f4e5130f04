//! Typed aggregation pipeline and its in-process executor.
//!
//! Stages follow document store semantics: a leading `Match` is pushed down to
//! the store, `LeftJoin` behaves like a lookup followed by an unwind that keeps
//! rows without a match, `Group` emits buckets in first-appearance order.

use crate::server::database::{filter_eq, get_path, matches, Collection, Document, DocumentStore, Filter, StoreError};
use crate::server::util::price::{from_decimal, round_decimal, to_decimal, PRICE_PLACES};
use log::debug;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

/// Key under which `Group` stores the bucket key.
pub(crate) const GROUP_KEY: &str = "_id";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    /// value at a dotted path of the current row, absent when the path does not resolve
    Field(&'static str),
    /// product of two numbers rounded to price precision, absent unless both are numbers
    Multiply(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Accumulator {
    /// numeric sum, values that are not numbers are skipped
    Sum(Expr),
    Count,
    /// every row of the bucket, in order
    PushRow,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Stage {
    Match(Filter),
    LeftJoin {
        from: Collection,
        local_field: &'static str,
        foreign_field: &'static str,
        as_field: &'static str,
    },
    Project(Vec<(&'static str, Expr)>),
    Group {
        key: Vec<(&'static str, Expr)>,
        accumulators: Vec<(&'static str, Accumulator)>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn match_on(mut self, filter: Filter) -> Self {
        self.stages.push(Stage::Match(filter));
        self
    }

    pub fn left_join(
        mut self,
        from: Collection,
        local_field: &'static str,
        foreign_field: &'static str,
        as_field: &'static str,
    ) -> Self {
        self.stages.push(Stage::LeftJoin {
            from,
            local_field,
            foreign_field,
            as_field,
        });
        self
    }

    pub fn project(mut self, fields: Vec<(&'static str, Expr)>) -> Self {
        self.stages.push(Stage::Project(fields));
        self
    }

    pub fn group(
        mut self,
        key: Vec<(&'static str, Expr)>,
        accumulators: Vec<(&'static str, Accumulator)>,
    ) -> Self {
        self.stages.push(Stage::Group { key, accumulators });
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}

/// Run `pipeline` over `collection`, stage by stage.
pub(crate) async fn execute<S>(store: &S, collection: Collection, pipeline: &Pipeline) -> Result<Vec<Document>, StoreError>
where
    S: DocumentStore + ?Sized,
{
    let mut stages = pipeline.stages.iter().peekable();
    let mut rows = match stages.next_if(|stage| matches!(stage, Stage::Match(_))) {
        Some(Stage::Match(filter)) => store.find_many(collection, filter).await?,
        _ => store.find_many(collection, &Filter::new()).await?,
    };
    debug!("pipeline on {} started with {} rows", collection, rows.len());

    for stage in stages {
        rows = match stage {
            Stage::Match(filter) => rows.into_iter().filter(|row| matches(row, filter)).collect(),
            Stage::LeftJoin {
                from,
                local_field,
                foreign_field,
                as_field,
            } => left_join(store, rows, *from, local_field, foreign_field, as_field).await?,
            Stage::Project(fields) => rows.iter().map(|row| project(row, fields)).collect::<Result<_, _>>()?,
            Stage::Group { key, accumulators } => group(rows, key, accumulators)?,
        };
    }
    Ok(rows)
}

async fn left_join<S>(
    store: &S,
    rows: Vec<Document>,
    from: Collection,
    local_field: &str,
    foreign_field: &str,
    as_field: &str,
) -> Result<Vec<Document>, StoreError>
where
    S: DocumentStore + ?Sized,
{
    let mut cache: HashMap<String, Vec<Document>> = HashMap::new();
    let mut joined = Vec::with_capacity(rows.len());
    for row in rows {
        let local = match get_path(&row, local_field) {
            None | Some(Value::Null) => {
                joined.push(row);
                continue;
            }
            Some(local) => local.clone(),
        };
        let cache_key = local.to_string();
        if !cache.contains_key(&cache_key) {
            let found = store.find_many(from, &filter_eq(foreign_field, local)).await?;
            cache.insert(cache_key.clone(), found);
        }
        let foreign = &cache[&cache_key];
        if foreign.is_empty() {
            joined.push(row);
            continue;
        }
        for doc in foreign {
            let mut out = row.clone();
            out.insert(as_field.to_string(), Value::Object(doc.clone()));
            joined.push(out);
        }
    }
    Ok(joined)
}

fn project(row: &Document, fields: &[(&'static str, Expr)]) -> Result<Document, StoreError> {
    let mut out = Document::new();
    for (name, expr) in fields {
        if let Some(value) = evaluate(row, expr)? {
            out.insert(name.to_string(), value);
        }
    }
    Ok(out)
}

fn group(
    rows: Vec<Document>,
    key: &[(&'static str, Expr)],
    accumulators: &[(&'static str, Accumulator)],
) -> Result<Vec<Document>, StoreError> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(Value, Vec<Document>)> = Vec::new();
    for row in rows {
        let mut fields = Map::new();
        for (name, expr) in key {
            fields.insert(name.to_string(), evaluate(&row, expr)?.unwrap_or(Value::Null));
        }
        let bucket_key = Value::Object(fields);
        let position = *index.entry(bucket_key.to_string()).or_insert_with(|| {
            buckets.push((bucket_key, Vec::new()));
            buckets.len() - 1
        });
        buckets[position].1.push(row);
    }

    buckets
        .into_iter()
        .map(|(bucket_key, rows)| {
            let mut out = Map::new();
            out.insert(GROUP_KEY.to_string(), bucket_key);
            for (name, accumulator) in accumulators {
                out.insert(name.to_string(), accumulate(&rows, accumulator)?);
            }
            Ok::<_, StoreError>(out)
        })
        .collect()
}

fn accumulate(rows: &[Document], accumulator: &Accumulator) -> Result<Value, StoreError> {
    match accumulator {
        Accumulator::Sum(expr) => {
            let mut total = Decimal::ZERO;
            for row in rows {
                let Some(value) = evaluate(row, expr)?.as_ref().and_then(Value::as_f64) else {
                    continue;
                };
                total = total
                    .checked_add(decimal(value)?)
                    .ok_or_else(|| overflow(format!("sum overflows after adding {}", value)))?;
            }
            Ok(number(from_decimal(total)))
        }
        Accumulator::Count => Ok(Value::from(rows.len() as u64)),
        Accumulator::PushRow => Ok(Value::Array(rows.iter().cloned().map(Value::Object).collect())),
    }
}

fn evaluate(row: &Document, expr: &Expr) -> Result<Option<Value>, StoreError> {
    match expr {
        Expr::Field(path) => Ok(get_path(row, path).cloned()),
        Expr::Multiply(left, right) => {
            let (Some(left), Some(right)) = (
                evaluate(row, left)?.as_ref().and_then(Value::as_f64),
                evaluate(row, right)?.as_ref().and_then(Value::as_f64),
            ) else {
                return Ok(None);
            };
            let product = decimal(left)?
                .checked_mul(decimal(right)?)
                .ok_or_else(|| overflow(format!("{} * {}", left, right)))?;
            Ok(Some(number(round_decimal(product, PRICE_PLACES))))
        }
    }
}

fn decimal(value: f64) -> Result<Decimal, StoreError> {
    to_decimal(value).ok_or_else(|| overflow(format!("{} has no decimal representation", value)))
}

fn overflow(reason: String) -> StoreError {
    StoreError::Overflow { reason }
}

fn number(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}
