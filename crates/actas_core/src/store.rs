use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::schema::VotingAct;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use time::PrimitiveDateTime;
use time::macros::format_description;
use tracing::{debug, warn};

/// Extracts the calendar year from a record date ("dd/mm/yyyy HH:MM:SS").
pub fn year_key(date: &str) -> Result<i32, StoreError> {
    let format = format_description!("[day]/[month]/[year] [hour]:[minute]:[second]");
    PrimitiveDateTime::parse(date.trim(), &format)
        .map(|parsed| parsed.year())
        .map_err(|_| StoreError::UnparsableDate(date.to_string()))
}

/// Append-only collections of voting acts, one per calendar year, each mirrored to
/// its own JSON file.
#[derive(Debug)]
pub struct YearStore {
    config: StoreConfig,
    years: BTreeMap<i32, Vec<VotingAct>>,
    discarded: Vec<i32>,
}

impl YearStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            years: BTreeMap::new(),
            discarded: Vec::new(),
        }
    }

    /// Loads every year in `years` that has a persisted file.
    ///
    /// A missing file means an empty year. An unreadable or corrupt file is logged and
    /// the year starts empty; its next persist overwrites the old contents.
    pub fn load(config: StoreConfig, years: RangeInclusive<i32>) -> Self {
        let mut store = Self::new(config);
        for year in years {
            store.load_year(year);
        }
        store
    }

    fn load_year(&mut self, year: i32) {
        match self.read_year(year) {
            Ok(Some(acts)) => {
                debug!(year, count = acts.len(), "loaded year collection");
                self.years.insert(year, acts);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(year, error = %err, "discarding unreadable year collection");
                self.discarded.push(year);
            }
        }
    }

    fn read_year(&self, year: i32) -> Result<Option<Vec<VotingAct>>, StoreError> {
        let path = self.config.year_path(year);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Corrupt { path, source })
    }

    /// Adds `act` to its year. A year not yet in memory (outside the loaded range) is
    /// read from disk first, so the next persist keeps what earlier runs stored.
    pub fn append(&mut self, year: i32, act: VotingAct) {
        if !self.years.contains_key(&year) && !self.discarded.contains(&year) {
            self.load_year(year);
        }
        self.years.entry(year).or_default().push(act);
    }

    /// Rewrites the whole file for `year` from memory.
    ///
    /// The collection is written to a sibling temp file and renamed into place, so a
    /// reader sees either the previous or the new contents.
    pub fn persist(&self, year: i32) -> Result<PathBuf, StoreError> {
        let path = self.config.year_path(year);
        let acts = self.acts(year);

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        acts.serialize(&mut ser)
            .map_err(|source| StoreError::Serialize {
                path: path.clone(),
                source,
            })?;

        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.config.output_dir).map_err(io_err)?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &buf).map_err(io_err)?;
        fs::rename(&tmp_path, &path).map_err(io_err)?;

        Ok(path)
    }

    pub fn acts(&self, year: i32) -> &[VotingAct] {
        self.years.get(&year).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn years(&self) -> impl Iterator<Item = (i32, &[VotingAct])> {
        self.years.iter().map(|(year, acts)| (*year, acts.as_slice()))
    }

    /// Years whose file existed but could not be read, either during [`YearStore::load`]
    /// or when [`YearStore::append`] first touched them.
    pub fn discarded_years(&self) -> &[i32] {
        &self.discarded
    }

    pub fn len(&self) -> usize {
        self.years.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_act_id(&self) -> Option<u64> {
        self.years.values().flatten().map(|act| act.act_id).max()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}
