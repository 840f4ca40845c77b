//! Mock platform service for testing
//!
//! These are test utilities - not all may be used by every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use stackbot::error::{Error, Result};
use stackbot::platform::{PlatformProvider, PlatformService};
use stackbot::types::{
    CheckRun, CheckRunReport, PlatformConfig, ProtectionPolicy, PullRequest, RepoId,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Call record for `update_pr_base`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateBaseCall {
    pub pr_number: u64,
    pub new_base: String,
}

/// Call record for `search_open_prs_by_base`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCall {
    pub base: String,
    pub page: u32,
    pub per_page: u8,
}

/// In-memory stand-in for a GitHub repository
///
/// This manually implements `PlatformService` rather than using mockall so
/// state (refs, check runs, labels) can be inspected after each operation.
///
/// Features:
/// - PRs, branches, protection rules, check runs and labels held in memory
/// - A search index that is only updated through `index_search`, like
///   GitHub's search which lags behind writes
/// - Call tracking for verification
/// - Error injection for failure path testing
pub struct MockPlatformService {
    config: PlatformConfig,
    prs: Mutex<HashMap<u64, PullRequest>>,
    branches: Mutex<HashMap<String, String>>,
    protections: Mutex<HashMap<String, ProtectionPolicy>>,
    check_runs: Mutex<Vec<CheckRun>>,
    next_check_run_id: AtomicU64,
    labels: Mutex<HashMap<u64, BTreeSet<String>>>,
    search_index: Mutex<HashMap<String, Vec<u64>>>,
    // Call tracking
    update_base_calls: Mutex<Vec<UpdateBaseCall>>,
    search_calls: Mutex<Vec<SearchCall>>,
    create_check_run_calls: AtomicU64,
    update_check_run_calls: AtomicU64,
    label_calls: AtomicU64,
    // Error injection
    error_on_get_pr: Mutex<Option<String>>,
    error_on_update_base: Mutex<HashSet<u64>>,
    error_on_search: Mutex<Option<String>>,
    error_on_list_check_runs: Mutex<Option<String>>,
    error_on_labels: Mutex<Option<String>>,
    error_on_create_branch: Mutex<Option<String>>,
    error_on_get_branch: Mutex<Option<String>>,
    error_on_protection: Mutex<Option<String>>,
}

impl MockPlatformService {
    /// Create a new mock with the given config
    pub fn with_config(config: PlatformConfig) -> Self {
        Self {
            config,
            prs: Mutex::new(HashMap::new()),
            branches: Mutex::new(HashMap::new()),
            protections: Mutex::new(HashMap::new()),
            check_runs: Mutex::new(Vec::new()),
            next_check_run_id: AtomicU64::new(1000),
            labels: Mutex::new(HashMap::new()),
            search_index: Mutex::new(HashMap::new()),
            update_base_calls: Mutex::new(Vec::new()),
            search_calls: Mutex::new(Vec::new()),
            create_check_run_calls: AtomicU64::new(0),
            update_check_run_calls: AtomicU64::new(0),
            label_calls: AtomicU64::new(0),
            error_on_get_pr: Mutex::new(None),
            error_on_update_base: Mutex::new(HashSet::new()),
            error_on_search: Mutex::new(None),
            error_on_list_check_runs: Mutex::new(None),
            error_on_labels: Mutex::new(None),
            error_on_create_branch: Mutex::new(None),
            error_on_get_branch: Mutex::new(None),
            error_on_protection: Mutex::new(None),
        }
    }

    // === Setup ===

    /// Add or replace a PR; its labels seed the label store
    pub fn add_pr(&self, pr: PullRequest) {
        self.labels
            .lock()
            .unwrap()
            .insert(pr.number, pr.labels.iter().cloned().collect());
        self.prs.lock().unwrap().insert(pr.number, pr);
    }

    /// Create a branch directly
    pub fn add_branch(&self, branch: &str, sha: &str) {
        self.branches
            .lock()
            .unwrap()
            .insert(branch.to_string(), sha.to_string());
    }

    /// Make the search index list `numbers` as open PRs based on `base`
    pub fn index_search(&self, base: &str, numbers: &[u64]) {
        self.search_index
            .lock()
            .unwrap()
            .insert(base.to_string(), numbers.to_vec());
    }

    // === Error injection methods ===

    /// Make `get_pull_request` return an error
    pub fn fail_get_pr(&self, msg: &str) {
        *self.error_on_get_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `update_pr_base` fail for one PR
    pub fn fail_update_base_for(&self, pr_number: u64) {
        self.error_on_update_base.lock().unwrap().insert(pr_number);
    }

    /// Make `search_open_prs_by_base` return an error
    pub fn fail_search(&self, msg: &str) {
        *self.error_on_search.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `list_check_runs` return an error
    pub fn fail_list_check_runs(&self, msg: &str) {
        *self.error_on_list_check_runs.lock().unwrap() = Some(msg.to_string());
    }

    /// Make label calls return an error
    pub fn fail_labels(&self, msg: &str) {
        *self.error_on_labels.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `create_branch` return a non-conflict error
    pub fn fail_create_branch(&self, msg: &str) {
        *self.error_on_create_branch.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `get_branch_sha` return a non-absence error
    pub fn fail_get_branch(&self, msg: &str) {
        *self.error_on_get_branch.lock().unwrap() = Some(msg.to_string());
    }

    /// Make protection calls return a non-absence error
    pub fn fail_protection(&self, msg: &str) {
        *self.error_on_protection.lock().unwrap() = Some(msg.to_string());
    }

    // === Inspection ===

    /// Current PR state
    pub fn pr(&self, pr_number: u64) -> PullRequest {
        let mut pr = self.prs.lock().unwrap().get(&pr_number).cloned().unwrap();
        pr.labels = self.labels_of(pr_number);
        pr
    }

    /// Base branch of a PR
    pub fn base_of(&self, pr_number: u64) -> String {
        self.pr(pr_number).base_ref
    }

    /// SHA a branch points at
    pub fn branch_sha(&self, branch: &str) -> Option<String> {
        self.branches.lock().unwrap().get(branch).cloned()
    }

    /// Protection rule on a branch
    pub fn protection(&self, branch: &str) -> Option<ProtectionPolicy> {
        self.protections.lock().unwrap().get(branch).cloned()
    }

    /// All check runs on a commit
    pub fn check_runs_on(&self, head_sha: &str) -> Vec<CheckRun> {
        self.check_runs
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.head_sha == head_sha)
            .cloned()
            .collect()
    }

    /// Sorted labels on a PR
    pub fn labels_of(&self, pr_number: u64) -> Vec<String> {
        self.labels
            .lock()
            .unwrap()
            .get(&pr_number)
            .map(|l| l.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Get all `update_pr_base` calls
    pub fn get_update_base_calls(&self) -> Vec<UpdateBaseCall> {
        self.update_base_calls.lock().unwrap().clone()
    }

    /// Get all search calls
    pub fn get_search_calls(&self) -> Vec<SearchCall> {
        self.search_calls.lock().unwrap().clone()
    }

    /// Number of check runs created
    pub fn create_check_run_count(&self) -> u64 {
        self.create_check_run_calls.load(Ordering::SeqCst)
    }

    /// Number of check-run updates
    pub fn update_check_run_count(&self) -> u64 {
        self.update_check_run_calls.load(Ordering::SeqCst)
    }

    /// Number of label add/remove calls
    pub fn label_call_count(&self) -> u64 {
        self.label_calls.load(Ordering::SeqCst)
    }

    /// Assert that `update_pr_base` was called with specific args
    pub fn assert_update_base_called(&self, pr_number: u64, new_base: &str) {
        let calls = self.get_update_base_calls();
        assert!(
            calls
                .iter()
                .any(|c| c.pr_number == pr_number && c.new_base == new_base),
            "Expected update_pr_base({pr_number}, {new_base}) but got: {calls:?}"
        );
    }

    /// Assert that `update_pr_base` was never called for a PR
    pub fn assert_update_base_not_called(&self, pr_number: u64) {
        let calls = self.get_update_base_calls();
        assert!(
            !calls.iter().any(|c| c.pr_number == pr_number),
            "Expected no update_pr_base({pr_number}) but got: {calls:?}"
        );
    }

    fn injected(slot: &Mutex<Option<String>>) -> Result<()> {
        match slot.lock().unwrap().as_ref() {
            Some(msg) => Err(Error::Platform(msg.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    fn config(&self) -> &PlatformConfig {
        &self.config
    }

    async fn get_pull_request(&self, pr_number: u64) -> Result<PullRequest> {
        Self::injected(&self.error_on_get_pr)?;
        let mut pr = self
            .prs
            .lock()
            .unwrap()
            .get(&pr_number)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("PR #{pr_number}")))?;
        pr.labels = self.labels_of(pr_number);
        Ok(pr)
    }

    async fn update_pr_base(&self, pr_number: u64, new_base: &str) -> Result<()> {
        self.update_base_calls.lock().unwrap().push(UpdateBaseCall {
            pr_number,
            new_base: new_base.to_string(),
        });

        if self.error_on_update_base.lock().unwrap().contains(&pr_number) {
            return Err(Error::Platform(format!("cannot update base of #{pr_number}")));
        }

        let mut prs = self.prs.lock().unwrap();
        let pr = prs
            .get_mut(&pr_number)
            .ok_or_else(|| Error::NotFound(format!("PR #{pr_number}")))?;
        pr.base_ref = new_base.to_string();
        Ok(())
    }

    async fn search_open_prs_by_base(
        &self,
        base: &str,
        page: u32,
        per_page: u8,
    ) -> Result<Vec<u64>> {
        self.search_calls.lock().unwrap().push(SearchCall {
            base: base.to_string(),
            page,
            per_page,
        });
        Self::injected(&self.error_on_search)?;

        let index = self.search_index.lock().unwrap();
        let all = index.get(base).cloned().unwrap_or_default();
        let start = (page as usize - 1) * usize::from(per_page);
        Ok(all
            .into_iter()
            .skip(start)
            .take(usize::from(per_page))
            .collect())
    }

    async fn get_branch_sha(&self, branch: &str) -> Result<String> {
        Self::injected(&self.error_on_get_branch)?;
        self.branch_sha(branch)
            .ok_or_else(|| Error::NotFound(format!("heads/{branch}")))
    }

    async fn create_branch(&self, branch: &str, sha: &str) -> Result<()> {
        Self::injected(&self.error_on_create_branch)?;
        let mut branches = self.branches.lock().unwrap();
        if branches.contains_key(branch) {
            return Err(Error::AlreadyExists("Reference already exists".to_string()));
        }
        branches.insert(branch.to_string(), sha.to_string());
        Ok(())
    }

    async fn update_branch(&self, branch: &str, sha: &str, _force: bool) -> Result<()> {
        let mut branches = self.branches.lock().unwrap();
        match branches.get_mut(branch) {
            Some(current) => {
                *current = sha.to_string();
                Ok(())
            }
            None => Err(Error::NotFound("Reference does not exist".to_string())),
        }
    }

    async fn delete_branch(&self, branch: &str) -> Result<()> {
        self.branches
            .lock()
            .unwrap()
            .remove(branch)
            .map(drop)
            .ok_or_else(|| Error::NotFound("Reference does not exist".to_string()))
    }

    async fn set_branch_protection(&self, branch: &str, policy: &ProtectionPolicy) -> Result<()> {
        Self::injected(&self.error_on_protection)?;
        if !self.branches.lock().unwrap().contains_key(branch) {
            return Err(Error::NotFound("Branch not found".to_string()));
        }
        self.protections
            .lock()
            .unwrap()
            .insert(branch.to_string(), policy.clone());
        Ok(())
    }

    async fn remove_branch_protection(&self, branch: &str) -> Result<()> {
        Self::injected(&self.error_on_protection)?;
        self.protections
            .lock()
            .unwrap()
            .remove(branch)
            .map(drop)
            .ok_or_else(|| Error::NotFound("Branch not protected".to_string()))
    }

    async fn list_check_runs(&self, head_sha: &str, name: &str) -> Result<Vec<CheckRun>> {
        Self::injected(&self.error_on_list_check_runs)?;
        Ok(self
            .check_runs_on(head_sha)
            .into_iter()
            .filter(|r| r.name == name)
            .collect())
    }

    async fn create_check_run(&self, head_sha: &str, report: &CheckRunReport) -> Result<()> {
        self.create_check_run_calls.fetch_add(1, Ordering::SeqCst);
        let id = self.next_check_run_id.fetch_add(1, Ordering::SeqCst);

        // GitHub associates a run with the open PRs whose head is this commit
        let pull_requests = self
            .prs
            .lock()
            .unwrap()
            .values()
            .filter(|pr| pr.head_sha == head_sha)
            .map(|pr| pr.number)
            .collect();

        self.check_runs.lock().unwrap().push(CheckRun {
            id,
            name: report.name.clone(),
            head_sha: head_sha.to_string(),
            status: report.status,
            conclusion: Some(report.conclusion),
            pull_requests,
        });
        Ok(())
    }

    async fn update_check_run(&self, check_run_id: u64, report: &CheckRunReport) -> Result<()> {
        self.update_check_run_calls.fetch_add(1, Ordering::SeqCst);
        let mut runs = self.check_runs.lock().unwrap();
        let run = runs
            .iter_mut()
            .find(|r| r.id == check_run_id)
            .ok_or_else(|| Error::NotFound(format!("check run {check_run_id}")))?;
        run.status = report.status;
        run.conclusion = Some(report.conclusion);
        Ok(())
    }

    async fn add_label(&self, pr_number: u64, label: &str) -> Result<()> {
        self.label_calls.fetch_add(1, Ordering::SeqCst);
        Self::injected(&self.error_on_labels)?;
        self.labels
            .lock()
            .unwrap()
            .entry(pr_number)
            .or_default()
            .insert(label.to_string());
        Ok(())
    }

    async fn remove_label(&self, pr_number: u64, label: &str) -> Result<()> {
        self.label_calls.fetch_add(1, Ordering::SeqCst);
        Self::injected(&self.error_on_labels)?;
        let removed = self
            .labels
            .lock()
            .unwrap()
            .get_mut(&pr_number)
            .is_some_and(|l| l.remove(label));
        if removed {
            Ok(())
        } else {
            Err(Error::NotFound("Label does not exist".to_string()))
        }
    }
}

/// Provider that hands out the same mock for every repository
pub struct MockProvider {
    pub platform: Arc<MockPlatformService>,
}

impl PlatformProvider for MockProvider {
    fn for_repo(&self, _repo: &RepoId) -> Result<Arc<dyn PlatformService>> {
        Ok(self.platform.clone())
    }
}
