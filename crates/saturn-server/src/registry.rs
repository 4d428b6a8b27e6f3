//! Job Registry: name -> handler table consulted by the router.
//!
//! Registration normally happens during startup, but the table is guarded so
//! lookups may interleave with late registrations.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::RegistryError;
use crate::job::{CancellableJobHandler, Job, JobHandler};
use crate::run_tracker::RunTracker;

static GLOBAL_REGISTRY: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::new()));

/// A registered job together with its run table.
#[derive(Debug)]
pub struct RegisteredJob {
    name: String,
    job: Job,
    runs: Option<Arc<RunTracker>>,
}

impl RegisteredJob {
    fn new(name: String, job: Job) -> Self {
        // Cancellable jobs own their tracker from registration onwards
        let runs = job.is_cancellable().then(|| Arc::new(RunTracker::new()));
        Self { name, job, runs }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn is_cancellable(&self) -> bool {
        self.job.is_cancellable()
    }

    /// The run table, present for cancellable jobs only.
    pub fn runs(&self) -> Option<&Arc<RunTracker>> {
        self.runs.as_ref()
    }
}

/// Name -> job table.
#[derive(Debug, Default)]
pub struct Registry {
    jobs: RwLock<HashMap<String, Arc<RegisteredJob>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used when a server is not given its own.
    pub fn global() -> Arc<Registry> {
        GLOBAL_REGISTRY.clone()
    }

    /// Register `job` under `name`.
    ///
    /// Checks run in order: blank name, missing handler, duplicate name. The
    /// first registration of a name wins; later attempts are rejected and leave
    /// the existing entry untouched.
    pub fn register(&self, name: &str, job: Option<Job>) -> Result<(), RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidName);
        }
        let job = job.ok_or_else(|| RegistryError::NilHandler(name.to_string()))?;

        let mut jobs = self.jobs.write();
        if jobs.contains_key(name) {
            debug!(job = %name, "Rejected duplicate registration");
            return Err(RegistryError::DuplicateJob(name.to_string()));
        }
        let cancellable = job.is_cancellable();
        jobs.insert(
            name.to_string(),
            Arc::new(RegisteredJob::new(name.to_string(), job)),
        );
        info!(job = %name, cancellable, "Registered job");
        Ok(())
    }

    /// Register a plain job.
    pub fn add_job<H>(&self, name: &str, handler: H) -> Result<(), RegistryError>
    where
        H: JobHandler + 'static,
    {
        self.register(name, Some(Job::plain(handler)))
    }

    /// Register a cancellable job.
    pub fn add_cancellable_job<H>(&self, name: &str, handler: H) -> Result<(), RegistryError>
    where
        H: CancellableJobHandler + 'static,
    {
        self.register(name, Some(Job::cancellable(handler)))
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<RegisteredJob>> {
        self.jobs.read().get(name).cloned()
    }

    /// Run table of a cancellable job, `None` for plain or unknown jobs.
    pub fn runs(&self, name: &str) -> Option<Arc<RunTracker>> {
        self.lookup(name).and_then(|job| job.runs().cloned())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.jobs.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    /// Registered names, sorted.
    pub fn job_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.jobs.read().keys().cloned().collect();
        names.sort();
        names
    }
}
