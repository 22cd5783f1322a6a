use serde::{Deserialize, Serialize};

use crate::client::HostedImage;

/// A single displayable unit of an answer, shaped like a chat attachment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub title: String,
    pub title_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_height: Option<u32>,
    /// Rehosted location of the image, set once rehosting succeeds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_url: Option<String>,
    pub fallback: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Fragment {
    /// An empty URL counts as no image.
    pub fn has_image(&self) -> bool {
        self.image_url.as_deref().is_some_and(|url| !url.is_empty())
    }

    /// True if the image still points at `host` (for example, the computation
    /// service's own image server rather than the rehosted copy).
    pub fn is_hosted_by(&self, host: &str) -> bool {
        self.image_url
            .as_deref()
            .is_some_and(|url| url.contains(host))
    }

    pub(crate) fn apply_hosted(&mut self, hosted: HostedImage) {
        self.image_width = Some(hosted.width);
        self.image_height = Some(hosted.height);
        self.from_url = Some(hosted.secure_url.clone());
        self.image_url = Some(hosted.secure_url);
    }
}

/// Deep link into the computation service's web UI for `query`.
pub fn title_link(base_url: &str, query: &str) -> String {
    format!("{}{}", base_url, urlencoding::encode(query))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_link_encodes_query() {
        let link = title_link("http://www.wolframalpha.com/input/?i=", "2 + 2 = x & y");
        assert_eq!(
            link,
            "http://www.wolframalpha.com/input/?i=2%20%2B%202%20%3D%20x%20%26%20y"
        );
    }

    #[test]
    fn test_has_image() {
        let mut fragment = Fragment::default();
        assert!(!fragment.has_image());

        fragment.image_url = Some(String::new());
        assert!(!fragment.has_image());

        fragment.image_url = Some("https://www4b.wolframalpha.com/Calculate/MSP/1.gif".to_string());
        assert!(fragment.has_image());
    }

    #[test]
    fn test_apply_hosted() {
        let mut fragment = Fragment {
            image_url: Some("https://www4b.wolframalpha.com/Calculate/MSP/1.gif".to_string()),
            ..Default::default()
        };
        assert!(fragment.is_hosted_by("wolframalpha.com"));

        fragment.apply_hosted(HostedImage {
            secure_url: "https://res.cloudinary.com/demo/1.png".to_string(),
            width: 120,
            height: 40,
        });

        assert!(!fragment.is_hosted_by("wolframalpha.com"));
        assert_eq!(fragment.image_width, Some(120));
        assert_eq!(fragment.image_height, Some(40));
        assert_eq!(fragment.from_url, fragment.image_url);
    }

    #[test]
    fn test_serialize_omits_unset_fields() {
        let fragment = Fragment {
            title: "Result".to_string(),
            title_link: "http://x".to_string(),
            fallback: "42".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&fragment).unwrap();
        assert!(json.get("image_url").is_none());
        assert!(json.get("color").is_none());
        assert_eq!(json["fallback"], "42");
    }
}
