use serde::{Deserialize, Serialize};

use crate::parser::ACCESS_URL_SUFFIX;

/// Placeholder substituted with the content identifier in gateway templates.
pub const CID_PLACEHOLDER: &str = "{cid}";

pub const DEFAULT_GATEWAY_TEMPLATES: &[&str] = &[
    "https://ipfs.io/ipfs/{cid}",
    "https://dweb.link/ipfs/{cid}",
    "https://gateway.pinata.cloud/ipfs/{cid}",
];

/// Public gateway URL templates used to derive mirror URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct GatewaySet {
    templates: Vec<String>,
}

impl Default for GatewaySet {
    fn default() -> Self {
        Self::new(DEFAULT_GATEWAY_TEMPLATES.iter().map(|t| t.to_string()).collect())
    }
}

impl From<Vec<String>> for GatewaySet {
    fn from(templates: Vec<String>) -> Self {
        Self::new(templates)
    }
}

impl From<GatewaySet> for Vec<String> {
    fn from(set: GatewaySet) -> Self {
        set.templates
    }
}

impl GatewaySet {
    /// Templates without a `{cid}` placeholder are dropped.
    pub fn new(templates: Vec<String>) -> Self {
        let templates = templates
            .into_iter()
            .filter(|t| {
                let ok = t.contains(CID_PLACEHOLDER);
                if !ok {
                    tracing::warn!(template = %t, "Ignoring gateway template without {{cid}} placeholder");
                }
                ok
            })
            .collect();
        Self { templates }
    }

    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    /// Mirror URLs for `content_id`, in template order.
    pub fn mirror_urls(&self, content_id: &str) -> Vec<String> {
        self.templates
            .iter()
            .map(|t| t.replace(CID_PLACEHOLDER, content_id))
            .collect()
    }
}

/// Access URL for an ENS subdomain label.
pub fn access_url(label: &str) -> String {
    format!("https://{label}{ACCESS_URL_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrors_follow_template_order() {
        let set = GatewaySet::default();
        let urls = set.mirror_urls("bafybeixyz");
        assert_eq!(
            urls,
            vec![
                "https://ipfs.io/ipfs/bafybeixyz",
                "https://dweb.link/ipfs/bafybeixyz",
                "https://gateway.pinata.cloud/ipfs/bafybeixyz",
            ]
        );
    }

    #[test]
    fn templates_without_placeholder_are_ignored() {
        let set = GatewaySet::new(vec![
            "https://example.com/static".into(),
            "https://{cid}.ipfs.example.org".into(),
        ]);
        assert_eq!(set.mirror_urls("bafk1"), vec!["https://bafk1.ipfs.example.org"]);
    }

    #[test]
    fn access_url_uses_suffix() {
        assert_eq!(access_url("abc123"), "https://abc123.pinit.eth.limo");
    }
}
