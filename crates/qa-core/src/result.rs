//! The structured answer returned by the computation service.

use serde::{Deserialize, Serialize};

/// An ordered sequence of pods. An absent tree (no answer) is modelled as
/// `None` by the client, not as an empty tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTree {
    pub pods: Vec<Pod>,
}

impl ResultTree {
    pub fn new(pods: Vec<Pod>) -> Self {
        Self { pods }
    }

    pub fn is_empty(&self) -> bool {
        self.pods.is_empty()
    }
}

/// A titled section of an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    pub title: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub subpods: Vec<Subpod>,
}

impl Pod {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            primary: false,
            subpods: Vec::new(),
        }
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn with_subpod(mut self, subpod: Subpod) -> Self {
        self.subpods.push(subpod);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subpod {
    /// Image rendering of this subpod, if the service produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub plaintext: String,
}

impl Subpod {
    pub fn new(image: impl Into<String>, plaintext: impl Into<String>) -> Self {
        Self {
            image: Some(image.into()),
            plaintext: plaintext.into(),
        }
    }

    pub fn text_only(plaintext: impl Into<String>) -> Self {
        Self {
            image: None,
            plaintext: plaintext.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pod_builder() {
        let pod = Pod::new("Result")
            .primary()
            .with_subpod(Subpod::new("https://img/1.gif", "42"))
            .with_subpod(Subpod::text_only("forty-two"));

        assert!(pod.primary);
        assert_eq!(pod.subpods.len(), 2);
        assert_eq!(pod.subpods[1].image, None);
    }

    #[test]
    fn test_pod_primary_defaults_to_false() {
        let pod: Pod = serde_json::from_str(r#"{"title": "Input"}"#).unwrap();
        assert!(!pod.primary);
        assert!(pod.subpods.is_empty());
    }
}
