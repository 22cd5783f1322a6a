//! Turns a computation result tree into a finished list of fragments.
//!
//! Assembly runs in three steps:
//! - select the pods worth showing (all of them, or only the primary ones
//!   with a fallback to the second pod)
//! - flatten every selected subpod into a [`Fragment`]
//! - rehost every fragment image concurrently and deliver once each
//!   dispatched upload has settled
//!
//! The set of pending uploads is fixed at dispatch time. Each upload is
//! bounded by [`AssemblerConfig::rehost_timeout`], so assembly always
//! finishes. A failed or timed-out upload leaves the fragment in place with
//! its original image.

use std::collections::BTreeSet;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, warn};

use crate::answer::Answer;
use crate::client::{ImageHostingClient, UploadOptions};
use crate::error::Error;
use crate::fragment::{title_link, Fragment};
use crate::result::{Pod, ResultTree};

pub const DEFAULT_WEB_BASE_URL: &str = "http://www.wolframalpha.com/input/?i=";
pub const DEFAULT_ACCENT_COLOR: &str = "#F58120";
pub const DEFAULT_SERVICE_IMAGE_HOST: &str = "wolframalpha.com";
pub const DEFAULT_IMAGE_FORMAT: &str = "png";
pub const DEFAULT_REHOST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Prefix of the deep link back to the service's web UI. The encoded
    /// query is appended verbatim.
    pub web_base_url: String,
    pub accent_color: String,
    /// Host name that identifies images still served by the computation
    /// service.
    pub service_image_host: String,
    pub image_format: String,
    pub rehost_timeout: Duration,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            web_base_url: DEFAULT_WEB_BASE_URL.to_string(),
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
            service_image_host: DEFAULT_SERVICE_IMAGE_HOST.to_string(),
            image_format: DEFAULT_IMAGE_FORMAT.to_string(),
            rehost_timeout: DEFAULT_REHOST_TIMEOUT,
        }
    }
}

impl AssemblerConfig {
    pub fn with_web_base_url(mut self, url: impl Into<String>) -> Self {
        self.web_base_url = url.into();
        self
    }

    pub fn with_accent_color(mut self, color: impl Into<String>) -> Self {
        self.accent_color = color.into();
        self
    }

    pub fn with_rehost_timeout(mut self, timeout: Duration) -> Self {
        self.rehost_timeout = timeout;
        self
    }
}

/// Progress of a single assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyState {
    Dispatched,
    AwaitingImages { pending: BTreeSet<usize> },
    Delivered,
}

impl AssemblyState {
    /// Move out of `Dispatched` once the uploads for `pending` are in flight.
    /// Has no effect in any other state.
    pub fn dispatch(&mut self, pending: BTreeSet<usize>) {
        if *self != AssemblyState::Dispatched {
            return;
        }
        *self = if pending.is_empty() {
            AssemblyState::Delivered
        } else {
            AssemblyState::AwaitingImages { pending }
        };
    }

    /// Record that the upload for fragment `index` settled.
    pub fn settle(&mut self, index: usize) {
        if let AssemblyState::AwaitingImages { pending } = self {
            pending.remove(&index);
            if pending.is_empty() {
                *self = AssemblyState::Delivered;
            }
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, AssemblyState::Delivered)
    }
}

pub struct ResultAssembler<'a> {
    images: &'a dyn ImageHostingClient,
    config: &'a AssemblerConfig,
}

impl<'a> ResultAssembler<'a> {
    pub fn new(images: &'a dyn ImageHostingClient, config: &'a AssemblerConfig) -> Self {
        Self { images, config }
    }

    /// Assemble the answer for `query` from whatever the computation
    /// service returned.
    pub async fn assemble(
        &self,
        outcome: Result<Option<ResultTree>, Error>,
        query: &str,
        full: bool,
    ) -> Answer {
        let tree = match outcome {
            Ok(Some(tree)) => tree,
            Ok(None) => {
                debug!(query, "Computation service has no answer");
                return Answer::NoAnswer;
            }
            Err(e) => {
                warn!(query, error = %e, "Computation service query failed");
                return Answer::NoAnswer;
            }
        };

        if tree.is_empty() {
            debug!(query, "Computation service returned no pods");
            return Answer::NoAnswer;
        }

        let mut fragments = self.build_fragments(&tree, query, full);
        if fragments.is_empty() {
            debug!(query, pods = tree.pods.len(), "No pod produced a fragment");
            return Answer::NoAnswer;
        }

        self.rehost(&mut fragments).await;

        let unhosted = fragments
            .iter()
            .filter(|f| f.is_hosted_by(&self.config.service_image_host))
            .count();
        debug!(
            query,
            fragments = fragments.len(),
            unhosted,
            "Delivering assembled answer"
        );

        Answer::Fragments(fragments)
    }

    /// Select pods and flatten their subpods into fragments, in pod order
    /// then subpod order.
    pub fn build_fragments(&self, tree: &ResultTree, query: &str, full: bool) -> Vec<Fragment> {
        let link = title_link(&self.config.web_base_url, query);

        let mut fragments: Vec<Fragment> = tree
            .pods
            .iter()
            .filter(|pod| full || pod.primary)
            .flat_map(|pod| self.pod_fragments(pod, &link, full))
            .collect();

        // The primary pod is not always the useful one; the second pod
        // usually carries the actual result.
        if fragments.is_empty() && tree.pods.len() >= 2 {
            debug!(title = %tree.pods[1].title, "Falling back to second pod");
            fragments = self.pod_fragments(&tree.pods[1], &link, full);
        }

        fragments
    }

    fn pod_fragments(&self, pod: &Pod, link: &str, full: bool) -> Vec<Fragment> {
        let color = (!full || pod.primary).then(|| self.config.accent_color.clone());

        pod.subpods
            .iter()
            .map(|subpod| Fragment {
                title: pod.title.clone(),
                title_link: link.to_string(),
                image_url: subpod.image.clone(),
                fallback: subpod.plaintext.clone(),
                color: color.clone(),
                ..Default::default()
            })
            .collect()
    }

    async fn rehost(&self, fragments: &mut [Fragment]) {
        let targets: Vec<(usize, String)> = fragments
            .iter()
            .enumerate()
            .filter(|(_, fragment)| fragment.has_image())
            .filter_map(|(index, fragment)| fragment.image_url.clone().map(|url| (index, url)))
            .collect();

        let mut state = AssemblyState::Dispatched;
        state.dispatch(targets.iter().map(|(index, _)| *index).collect());
        if state.is_delivered() {
            debug!("No fragment images to rehost");
            return;
        }

        let options = UploadOptions::new(&self.config.image_format);
        let options = &options;
        let images = self.images;
        let timeout = self.config.rehost_timeout;

        debug!(count = targets.len(), host = images.name(), "Dispatching image rehosts");

        let mut in_flight: FuturesUnordered<_> = targets
            .into_iter()
            .map(|(index, url)| async move {
                let result = match tokio::time::timeout(timeout, images.upload(&url, options)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(Error::timeout(format!(
                        "rehosting took longer than {:?}",
                        timeout
                    ))),
                };
                (index, url, result)
            })
            .collect();

        while let Some((index, url, result)) = in_flight.next().await {
            match result {
                Ok(hosted) => {
                    debug!(index, url = %hosted.secure_url, "Image rehosted");
                    fragments[index].apply_hosted(hosted);
                }
                Err(e) => {
                    warn!(index, url = %url, error = %e, "Image rehost failed, keeping original");
                }
            }

            state.settle(index);
            if state.is_delivered() {
                break;
            }
        }
    }
}
