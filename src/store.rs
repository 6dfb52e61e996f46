//! The one mutable piece of state: the current dataset, replaced only as a
//! whole and persisted as two independent blobs (order lines, expenses).

use log::{error, info, warn};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::schema::{ExpenseTable, OrderRecord, SalesSnapshot};
use crate::settings::DashboardSettings;

/// Key/value persistence for serialized dataset halves.
pub trait SnapshotStorage {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&mut self, key: &str, contents: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Stores each blob as `<key>.json` inside a directory.
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    root: PathBuf,
}

impl DirectoryStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

impl SnapshotStorage for DirectoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.path_for(key), contents)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn write(&mut self, key: &str, contents: &str) -> Result<()> {
        self.blobs.insert(key.to_string(), contents.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.blobs.remove(key);
        Ok(())
    }
}

/// Owns the current dataset. Every change replaces it wholesale and bumps
/// [`DatasetStore::version`].
pub struct DatasetStore<S: SnapshotStorage> {
    storage: S,
    sales_key: String,
    expenses_key: String,
    defaults: SalesSnapshot,
    dataset: SalesSnapshot,
    version: u64,
}

impl DatasetStore<DirectoryStorage> {
    pub fn open_directory(settings: &DashboardSettings, defaults: SalesSnapshot) -> Result<Self> {
        Self::open(
            DirectoryStorage::new(settings.storage_dir.clone()),
            settings,
            defaults,
        )
    }
}

impl<S: SnapshotStorage> DatasetStore<S> {
    /// Restores the dataset from `storage`. A missing or unreadable blob falls
    /// back to the matching half of `defaults`.
    pub fn open(storage: S, settings: &DashboardSettings, defaults: SalesSnapshot) -> Result<Self> {
        settings.validate()?;

        let sales = match storage.read(&settings.sales_key)? {
            Some(blob) => serde_json::from_str::<Vec<OrderRecord>>(&blob).unwrap_or_else(|e| {
                error!("Failed to parse stored sales data: {}", e);
                defaults.sales.clone()
            }),
            None => defaults.sales.clone(),
        };

        let expenses = match storage.read(&settings.expenses_key)? {
            Some(blob) => serde_json::from_str::<ExpenseTable>(&blob).unwrap_or_else(|e| {
                error!("Failed to parse stored expenses: {}", e);
                defaults.expenses.clone()
            }),
            None => defaults.expenses.clone(),
        };

        info!(
            "Dataset restored with {} order lines and {} expense periods",
            sales.len(),
            expenses.len()
        );

        Ok(Self {
            storage,
            sales_key: settings.sales_key.clone(),
            expenses_key: settings.expenses_key.clone(),
            defaults,
            dataset: SalesSnapshot::new(sales, expenses),
            version: 0,
        })
    }

    pub fn dataset(&self) -> &SalesSnapshot {
        &self.dataset
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Installs a new dataset (file import or backup restore) and persists it.
    ///
    /// If the expenses blob cannot be written, the previous sales blob is put
    /// back so storage never pairs new sales with old expenses.
    pub fn replace(&mut self, snapshot: SalesSnapshot) -> Result<()> {
        let sales_blob = serde_json::to_string(&snapshot.sales)?;
        let expenses_blob = serde_json::to_string(&snapshot.expenses)?;
        let previous_sales = self.storage.read(&self.sales_key)?;

        self.storage.write(&self.sales_key, &sales_blob)?;
        if let Err(e) = self.storage.write(&self.expenses_key, &expenses_blob) {
            error!("Failed to persist expenses, restoring previous sales: {}", e);
            let rollback = match previous_sales {
                Some(blob) => self.storage.write(&self.sales_key, &blob),
                None => self.storage.remove(&self.sales_key),
            };
            if let Err(rollback_err) = rollback {
                error!("Failed to restore previous sales: {}", rollback_err);
            }
            return Err(e);
        }

        info!(
            "Dataset replaced: {} order lines, {} expense periods",
            snapshot.sales.len(),
            snapshot.expenses.len()
        );
        self.dataset = snapshot;
        self.version += 1;
        Ok(())
    }

    /// Restores a backup document produced by [`DatasetStore::export_json`].
    pub fn import_json(&mut self, json: &str) -> Result<()> {
        let snapshot = SalesSnapshot::from_json(json)?;
        self.replace(snapshot)
    }

    pub fn export_json(&self) -> Result<String> {
        self.dataset.to_json()
    }

    /// Drops persisted data and goes back to the default order lines with an
    /// empty expense table.
    pub fn clear(&mut self) -> Result<()> {
        self.storage.remove(&self.sales_key)?;
        self.storage.remove(&self.expenses_key)?;

        warn!("Dataset reset to defaults");
        self.dataset = SalesSnapshot::new(self.defaults.sales.clone(), ExpenseTable::new());
        self.version += 1;
        Ok(())
    }
}
