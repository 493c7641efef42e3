// src/store/json_dir.rs

use anyhow::{anyhow, Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{self, BufReader, BufWriter},
    path::{Path, PathBuf},
    sync::RwLock,
};
use tracing::{debug, error};

use super::PortfolioStore;
use crate::engine::RunResponse;
use crate::models::{Portfolio, Position, Recommendation};

const PORTFOLIOS_FILE: &str = "portfolios.json";
const POSITIONS_FILE: &str = "positions.json";
const RECOMMENDATIONS_FILE: &str = "recommendations.json";
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Session {
    #[serde(default)]
    current_portfolio_id: Option<String>,
    #[serde(default)]
    last_run: Option<RunResponse>,
}

/// One pretty-printed JSON file per collection under `dir`.
///
/// Missing files read as empty. Corrupt files are logged and also read as
/// empty; the next write replaces them. Writes go to a sibling temp file
/// that is renamed over the target, so readers never see a partial file.
pub struct JsonDirStore {
    dir: PathBuf,
    /// Readers share; read-modify-write cycles are exclusive.
    lock: RwLock<()>,
}

impl JsonDirStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating store directory {:?}", &dir))?;
        Ok(Self {
            dir,
            lock: RwLock::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        let _guard = self
            .lock
            .read()
            .map_err(|_| anyhow!("json store lock poisoned"))?;
        self.load_unlocked(name)
    }

    fn load_unlocked<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(e).with_context(|| format!("opening {:?}", &path)),
        };
        match serde_json::from_reader(BufReader::new(file)) {
            Ok(value) => Ok(value),
            Err(e) => {
                error!("Skipping corrupt {:?}: {}", path, e);
                Ok(T::default())
            }
        }
    }

    fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let tmp_path = self.dir.join(format!(".{}.tmp", name));
        let file = File::create(&tmp_path).with_context(|| format!("creating {:?}", &tmp_path))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)
            .with_context(|| format!("writing {:?}", &tmp_path))?;
        let file = writer
            .into_inner()
            .map_err(|e| e.into_error())
            .with_context(|| format!("flushing {:?}", &tmp_path))?;
        file.sync_all()
            .with_context(|| format!("syncing {:?}", &tmp_path))?;
        fs::rename(&tmp_path, &path)
            .with_context(|| format!("replacing {:?}", &path))?;
        debug!(path = %path.display(), "store file written");
        Ok(())
    }

    fn update<T, F>(&self, name: &str, f: F) -> Result<()>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T),
    {
        let _guard = self
            .lock
            .write()
            .map_err(|_| anyhow!("json store lock poisoned"))?;
        let mut value: T = self.load_unlocked(name)?;
        f(&mut value);
        self.save(name, &value)
    }
}

impl PortfolioStore for JsonDirStore {
    fn portfolio(&self, id: &str) -> Result<Option<Portfolio>> {
        let portfolios: Vec<Portfolio> = self.load(PORTFOLIOS_FILE)?;
        Ok(portfolios.into_iter().find(|p| p.id == id))
    }

    fn put_portfolio(&self, portfolio: &Portfolio) -> Result<()> {
        self.update(PORTFOLIOS_FILE, |portfolios: &mut Vec<Portfolio>| {
            match portfolios.iter_mut().find(|p| p.id == portfolio.id) {
                Some(existing) => *existing = portfolio.clone(),
                None => portfolios.push(portfolio.clone()),
            }
        })
    }

    fn positions(&self, portfolio_id: &str) -> Result<Vec<Position>> {
        let mut all: BTreeMap<String, Vec<Position>> = self.load(POSITIONS_FILE)?;
        Ok(all.remove(portfolio_id).unwrap_or_default())
    }

    fn put_positions(&self, portfolio_id: &str, positions: &[Position]) -> Result<()> {
        self.update(POSITIONS_FILE, |all: &mut BTreeMap<String, Vec<Position>>| {
            all.insert(portfolio_id.to_string(), positions.to_vec());
        })
    }

    fn current_portfolio_id(&self) -> Result<Option<String>> {
        Ok(self.load::<Session>(SESSION_FILE)?.current_portfolio_id)
    }

    fn set_current_portfolio_id(&self, id: &str) -> Result<()> {
        self.update(SESSION_FILE, |session: &mut Session| {
            session.current_portfolio_id = Some(id.to_string());
        })
    }

    fn last_run(&self) -> Result<Option<RunResponse>> {
        Ok(self.load::<Session>(SESSION_FILE)?.last_run)
    }

    fn set_last_run(&self, run: &RunResponse) -> Result<()> {
        self.update(SESSION_FILE, |session: &mut Session| {
            session.last_run = Some(run.clone());
        })
    }

    fn recommendations(&self) -> Result<Vec<Recommendation>> {
        self.load(RECOMMENDATIONS_FILE)
    }

    fn push_recommendation(&self, recommendation: &Recommendation) -> Result<()> {
        self.update(RECOMMENDATIONS_FILE, |all: &mut Vec<Recommendation>| {
            all.push(recommendation.clone());
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{exercise_store, sample_portfolio};
    use tempfile::tempdir;

    #[test]
    fn test_json_dir_store() {
        let tmp = tempdir().unwrap();
        exercise_store(&JsonDirStore::new(tmp.path()).unwrap());
    }

    #[test]
    fn test_persistence_across_instances() {
        let tmp = tempdir().unwrap();
        {
            let store = JsonDirStore::new(tmp.path()).unwrap();
            store.put_portfolio(&sample_portfolio("keep")).unwrap();
            store.set_current_portfolio_id("keep").unwrap();
        }

        let store = JsonDirStore::new(tmp.path()).unwrap();
        assert!(store.portfolio("keep").unwrap().is_some());
        assert_eq!(store.current_portfolio_id().unwrap().as_deref(), Some("keep"));
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join(PORTFOLIOS_FILE), "{ not json").unwrap();
        fs::write(tmp.path().join(SESSION_FILE), "42").unwrap();

        let store = JsonDirStore::new(tmp.path()).unwrap();
        assert!(store.portfolio("any").unwrap().is_none());
        assert!(store.current_portfolio_id().unwrap().is_none());

        // writing replaces the corrupt file
        store.put_portfolio(&sample_portfolio("fresh")).unwrap();
        assert!(store.portfolio("fresh").unwrap().is_some());
    }

    #[test]
    fn test_reads_during_writes_see_whole_files() {
        let tmp = tempdir().unwrap();
        let store = JsonDirStore::new(tmp.path()).unwrap();
        for i in 0..200 {
            store.put_portfolio(&sample_portfolio(&format!("p{}", i))).unwrap();
        }

        let misses = std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..300 {
                    store.put_portfolio(&sample_portfolio("p0")).unwrap();
                }
            });
            (0..3000)
                .filter(|_| store.portfolio("p199").unwrap().is_none())
                .count()
        });
        assert_eq!(misses, 0);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let tmp = tempdir().unwrap();
        let store = JsonDirStore::new(tmp.path()).unwrap();
        store.put_portfolio(&sample_portfolio("only")).unwrap();

        let names: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![PORTFOLIOS_FILE.to_string()]);
    }
}
