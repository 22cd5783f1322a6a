//! Test utilities shared across the workspace.
//! Only compiled when running tests or with the `testing` feature.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::client::{ComputationClient, HostedImage, ImageHostingClient, UploadOptions};
use crate::error::Error;
use crate::result::ResultTree;

/// A computation client that returns pre-configured results.
pub struct MockComputationClient {
    responses: Mutex<Vec<Result<Option<ResultTree>, Error>>>,
    /// Captured query inputs (for assertion).
    pub captured_queries: Mutex<Vec<String>>,
}

impl MockComputationClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            captured_queries: Mutex::new(Vec::new()),
        }
    }

    /// Queue a tree for the next query() call (FIFO).
    pub fn queue_tree(&self, tree: ResultTree) {
        self.responses.lock().unwrap().insert(0, Ok(Some(tree)));
    }

    /// Queue a "no answer" response.
    pub fn queue_no_answer(&self) {
        self.responses.lock().unwrap().insert(0, Ok(None));
    }

    pub fn queue_error(&self, error: Error) {
        self.responses.lock().unwrap().insert(0, Err(error));
    }

    pub fn query_count(&self) -> usize {
        self.captured_queries.lock().unwrap().len()
    }
}

impl Default for MockComputationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComputationClient for MockComputationClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn query(&self, input: &str) -> Result<Option<ResultTree>, Error> {
        self.captured_queries.lock().unwrap().push(input.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(Error::Unknown("No mock result queued".to_string())))
    }
}

/// An image host that answers immediately unless an upload has been held.
///
/// `hold(url)` makes the upload of `url` wait until `release(url)` is
/// called, which lets tests choose the order in which rehosts complete.
/// A held upload that is never released never completes.
pub struct MockImageHost {
    /// Captured uploads in call order.
    pub uploads: Mutex<Vec<(String, UploadOptions)>>,
    /// URLs whose upload returned, in completion order.
    pub completed: Mutex<Vec<String>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    releases: Mutex<HashMap<String, oneshot::Sender<()>>>,
    failures: Mutex<HashSet<String>>,
}

impl MockImageHost {
    pub fn new() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            completed: Mutex::new(Vec::new()),
            gates: Mutex::new(HashMap::new()),
            releases: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashSet::new()),
        }
    }

    /// The URL this host hands back for an upload of `url`.
    pub fn rehosted_url(url: &str) -> String {
        let name = url.rsplit('/').next().unwrap_or(url);
        format!("https://images.test/{}.png", name)
    }

    pub fn hold(&self, url: &str) {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(url.to_string(), rx);
        self.releases.lock().unwrap().insert(url.to_string(), tx);
    }

    /// Let a held upload finish. Returns false if `url` was not held.
    pub fn release(&self, url: &str) -> bool {
        match self.releases.lock().unwrap().remove(url) {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// Make the upload of `url` fail.
    pub fn fail(&self, url: &str) {
        self.failures.lock().unwrap().insert(url.to_string());
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

impl Default for MockImageHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageHostingClient for MockImageHost {
    fn name(&self) -> &str {
        "mock"
    }

    async fn upload(&self, url: &str, options: &UploadOptions) -> Result<HostedImage, Error> {
        self.uploads
            .lock()
            .unwrap()
            .push((url.to_string(), options.clone()));

        let gate = self.gates.lock().unwrap().remove(url);
        if let Some(gate) = gate {
            gate.await
                .map_err(|_| Error::Unknown(format!("Held upload dropped: {}", url)))?;
        }

        self.completed.lock().unwrap().push(url.to_string());

        if self.failures.lock().unwrap().contains(url) {
            return Err(Error::api(500, format!("Upload rejected: {}", url)));
        }

        Ok(HostedImage {
            secure_url: Self::rehosted_url(url),
            width: 100,
            height: 50,
        })
    }
}
