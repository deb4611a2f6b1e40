//! Restart dumps: one JSON document per component per snapshot.

use crate::component::Category;
use crate::domain::{Calendar, DateTime};
use crate::error::{CouplingError, Result};
use crate::store::{Field, StateHistory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

pub const DUMP_VERSION: u32 = 1;

/// A snapshot of one component, taken at the start of the step `timestamp` begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dump {
    pub version: u32,
    pub model: String,
    pub category: Category,
    pub kind: String,
    pub calendar: Calendar,
    pub timestamp: DateTime,
    pub states: BTreeMap<String, StateHistory>,
    /// Latest outwards, used to reseed lagged transfers on restart.
    pub outwards: BTreeMap<String, Field>,
}

/// Which file a snapshot is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpTag {
    /// One file per component, overwritten at every snapshot.
    Latest,
    /// One file per snapshot.
    At(DateTime),
    /// One file per spin-up cycle.
    SpinUp(u32),
}

pub fn dump_file_name(identifier: &str, category: Category, tag: DumpTag) -> String {
    match tag {
        DumpTag::Latest => format!("{}_{}_dump.json", identifier, category),
        DumpTag::At(dt) => format!("{}_{}_dump_{}.json", identifier, category, dt.compact()),
        DumpTag::SpinUp(cycle) => format!("{}_{}_dump_spinup{}.json", identifier, category, cycle),
    }
}

impl Dump {
    /// Writes to a temporary file next to `path`, then renames it into place.
    /// On failure the temporary file is removed and `path` is untouched.
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| CouplingError::io(dir, e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CouplingError::io(dir, e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, self)
                .map_err(|e| CouplingError::Dump(format!("cannot serialise dump: {}", e)))?;
            writer.flush().map_err(|e| CouplingError::io(path, e))?;
        }
        tmp.as_file().sync_all().map_err(|e| CouplingError::io(path, e))?;
        tmp.persist(path).map_err(|e| CouplingError::io(path, e))?;
        debug!(path = %path.display(), category = %self.category, timestamp = %self.timestamp, "dump written");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| CouplingError::io(path, e))?;
        let dump: Dump = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| CouplingError::Dump(format!("'{}' is not a valid dump: {}", path.display(), e)))?;
        if dump.version != DUMP_VERSION {
            return Err(CouplingError::Dump(format!(
                "'{}' has dump version {}, expected {}",
                path.display(),
                dump.version,
                DUMP_VERSION
            )));
        }
        Ok(dump)
    }
}

/// Loads every dump of `category` for model `identifier` found in `directory`,
/// sorted by file name.
pub fn find_dumps(directory: &Path, identifier: &str, category: Category) -> Result<Vec<(PathBuf, Dump)>> {
    let prefix = format!("{}_{}_dump", identifier, category);
    let mut paths: Vec<PathBuf> = fs::read_dir(directory)
        .map_err(|e| CouplingError::io(directory, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".json"))
        })
        .collect();
    paths.sort();
    paths
        .into_iter()
        .map(|p| {
            let dump = Dump::load(&p)?;
            Ok((p, dump))
        })
        .collect()
}

/// The snapshot taken at `at`, or the latest one when `at` is `None`.
/// Among equal timestamps the last file by name wins.
pub fn select_dump(dumps: Vec<(PathBuf, Dump)>, at: Option<&DateTime>) -> Option<(PathBuf, Dump)> {
    match at {
        Some(at) => dumps.into_iter().rev().find(|(_, d)| &d.timestamp == at),
        None => dumps.into_iter().max_by(|(_, a), (_, b)| a.timestamp.cmp(&b.timestamp)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn sample(timestamp: DateTime) -> Dump {
        let mut history = StateHistory::zeros(&smallvec![1, 3], 1);
        history.previous_mut().values_mut().copy_from_slice(&[0.1, 1.0 / 3.0, 2e-300]);
        Dump {
            version: DUMP_VERSION,
            model: "test".into(),
            category: Category::SubSurface,
            kind: "soil_bucket".into(),
            calendar: Calendar::NoLeap,
            timestamp,
            states: BTreeMap::from([("soil_moisture".to_string(), history)]),
            outwards: BTreeMap::from([("runoff".to_string(), Field::filled(&smallvec![1, 3], 0.7))]),
        }
    }

    #[test]
    fn test_file_names() {
        let dt = DateTime::new(2019, 1, 2, 9, 0, 0);
        assert_eq!(dump_file_name("m", Category::OpenWater, DumpTag::Latest), "m_openwater_dump.json");
        assert_eq!(
            dump_file_name("m", Category::OpenWater, DumpTag::At(dt)),
            "m_openwater_dump_20190102090000.json"
        );
        assert_eq!(dump_file_name("m", Category::SurfaceLayer, DumpTag::SpinUp(2)), "m_surfacelayer_dump_spinup2.json");
    }

    #[test]
    fn test_write_then_load_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m_subsurface_dump.json");
        let dump = sample(DateTime::ymd(2019, 1, 2));
        dump.write_atomic(&path).unwrap();
        assert_eq!(Dump::load(&path).unwrap(), dump);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();
        let res = sample(DateTime::ymd(2019, 1, 2)).write_atomic(&blocker.join("dump.json"));
        assert!(matches!(res, Err(CouplingError::Io { .. })));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_truncated_file_is_a_dump_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m_subsurface_dump.json");
        fs::write(&path, b"{\"version\": 1, \"model\"").unwrap();
        assert!(matches!(Dump::load(&path), Err(CouplingError::Dump(_))));
    }

    #[rstest::rstest]
    #[case::short_lagged_slot("/states/soil_moisture/slots/1/values", serde_json::json!([1.0]))]
    #[case::no_slots("/states/soil_moisture/slots", serde_json::json!([]))]
    #[case::ragged_slots("/states/soil_moisture/slots/1/shape", serde_json::json!([3]))]
    #[case::short_outward("/outwards/runoff/values", serde_json::json!([0.7, 0.7]))]
    fn test_malformed_arrays_are_a_dump_error(#[case] pointer: &str, #[case] replacement: serde_json::Value) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m_subsurface_dump.json");
        let mut doc = serde_json::to_value(sample(DateTime::ymd(2019, 1, 2))).unwrap();
        *doc.pointer_mut(pointer).unwrap() = replacement;
        fs::write(&path, doc.to_string()).unwrap();

        assert!(matches!(Dump::load(&path), Err(CouplingError::Dump(_))));
    }

    #[test]
    fn test_select_latest_or_exact() {
        let dir = tempfile::tempdir().unwrap();
        for day in [3, 1, 2] {
            let dt = DateTime::ymd(2019, 1, day);
            sample(dt)
                .write_atomic(&dir.path().join(dump_file_name("m", Category::SubSurface, DumpTag::At(dt))))
                .unwrap();
        }
        let dumps = find_dumps(dir.path(), "m", Category::SubSurface).unwrap();
        assert_eq!(dumps.len(), 3);
        assert!(find_dumps(dir.path(), "m", Category::OpenWater).unwrap().is_empty());

        let (_, latest) = select_dump(dumps.clone(), None).unwrap();
        assert_eq!(latest.timestamp, DateTime::ymd(2019, 1, 3));
        let (_, exact) = select_dump(dumps.clone(), Some(&DateTime::ymd(2019, 1, 2))).unwrap();
        assert_eq!(exact.timestamp, DateTime::ymd(2019, 1, 2));
        assert!(select_dump(dumps, Some(&DateTime::ymd(2019, 1, 9))).is_none());
    }
}
