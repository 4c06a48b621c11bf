use crate::domain::model::StudentRecord;
use crate::domain::ports::FixtureStore;
use crate::utils::error::{AppError, Result};
use rand::distr::Alphanumeric;
use rand::Rng;
use std::collections::HashMap;

pub const DEFAULT_SEED_COUNT: usize = 100;
const MAX_MARKS: u8 = 100;

/// Immutable name -> marks table, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    marks: HashMap<String, u8>,
}

impl Roster {
    /// Later records win when a name repeats.
    pub fn from_records(records: Vec<StudentRecord>) -> Self {
        let marks = records
            .into_iter()
            .map(|record| (record.name, record.marks))
            .collect();
        Self { marks }
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<u8> {
        self.marks.get(name).copied()
    }

    /// Marks for each requested name, positionally aligned; unknown names are `None`.
    pub fn lookup(&self, names: &[String]) -> Result<Vec<Option<u8>>> {
        if names.is_empty() {
            return Err(AppError::NoNamesProvided);
        }

        Ok(names.iter().map(|name| self.get(name)).collect())
    }

    /// Load the fixture at `path`, or seed a random one when it does not exist yet.
    pub async fn load_or_seed<S: FixtureStore>(
        store: &S,
        path: &str,
        seed_count: usize,
    ) -> Result<Self> {
        match store.read_file(path).await {
            Ok(bytes) => {
                let records = parse_fixture(&bytes)?;
                tracing::info!("Loaded {} students from {}", records.len(), path);
                Ok(Self::from_records(records))
            }
            Err(AppError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    "Fixture {} not found, seeding {} random students",
                    path,
                    seed_count
                );

                let records = synthesize_students(seed_count, &mut rand::rng());
                let bytes = serde_json::to_vec(&records)?;
                store.write_file(path, &bytes).await?;

                Ok(Self::from_records(records))
            }
            Err(e) => Err(e),
        }
    }
}

/// A JSON array of `{name, marks}` objects with marks in 0..=100.
pub fn parse_fixture(bytes: &[u8]) -> Result<Vec<StudentRecord>> {
    let records: Vec<StudentRecord> =
        serde_json::from_slice(bytes).map_err(|e| AppError::FixtureError {
            message: format!("malformed fixture: {}", e),
        })?;

    if let Some(bad) = records.iter().find(|record| record.marks > MAX_MARKS) {
        return Err(AppError::FixtureError {
            message: format!(
                "marks for '{}' is {}, expected 0 to {}",
                bad.name, bad.marks, MAX_MARKS
            ),
        });
    }

    Ok(records)
}

/// Random alphanumeric names of 5 to 10 characters with marks in 0..=100.
pub fn synthesize_students<R: Rng>(count: usize, rng: &mut R) -> Vec<StudentRecord> {
    (0..count)
        .map(|_| {
            let len = rng.random_range(5..=10);
            let name = (0..len)
                .map(|_| char::from(rng.sample(Alphanumeric)))
                .collect();
            StudentRecord {
                name,
                marks: rng.random_range(0..=MAX_MARKS),
            }
        })
        .collect()
}
