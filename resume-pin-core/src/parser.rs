//! Recovers the content identifier and access URL from PinMe CLI output.
//!
//! The tool's output is human-oriented and has changed between versions, so each
//! field is matched by an ordered list of named [`Matcher`]s: the labeled form
//! first, then looser structural shapes. [`first_match`] picks the first matcher
//! that yields a value. Absence is a normal outcome, never an error.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Every content identifier the network hands out starts with this prefix.
pub const CID_PREFIX: &str = "baf";
/// Characters allowed after [`CID_PREFIX`].
pub const CID_BODY_CLASS: &str = "[a-z0-9]";
/// Shortest identifier accepted without a label. A base32 CIDv1 over sha2-256
/// is 59 characters.
pub const BARE_CID_MIN_LEN: usize = 50;
/// Host suffix of the human-facing access URL (`https://<label>.pinit.eth.limo`).
pub const ACCESS_URL_SUFFIX: &str = ".pinit.eth.limo";
/// Label preceding the access URL in tool output.
pub const URL_LABEL: &str = "ENS URL:";
/// Label preceding the content identifier in tool output.
pub const CID_LABEL: &str = "IPFS CID:";

fn cid_shape() -> String {
    format!("{}{}+", regex::escape(CID_PREFIX), CID_BODY_CLASS)
}

fn access_url_shape() -> String {
    format!("https://[a-z0-9]+{}", regex::escape(ACCESS_URL_SUFFIX))
}

/// A named extraction strategy. Capture group 1 is the extracted value.
#[derive(Debug)]
pub struct Matcher {
    pub name: &'static str,
    pattern: Regex,
}

impl Matcher {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            // Patterns are assembled from the constants above and are always valid.
            pattern: Regex::new(pattern).expect("matcher pattern must compile"),
        }
    }

    pub fn find(&self, text: &str) -> Option<String> {
        self.pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|s| !s.is_empty())
    }
}

static URL_MATCHERS: LazyLock<Vec<Matcher>> = LazyLock::new(|| {
    let url = access_url_shape();
    vec![
        Matcher::new(
            "labeled-access-url",
            &format!(r"(?i){}\s*({})", regex::escape(URL_LABEL), url),
        ),
        Matcher::new("bare-access-url", &format!(r"(?i)({url})")),
        Matcher::new(
            "gateway-path-url",
            &format!(r"(?i)(https://[a-z0-9.-]+/ipfs/{})", cid_shape()),
        ),
    ]
});

static CID_MATCHERS: LazyLock<Vec<Matcher>> = LazyLock::new(|| {
    let cid = cid_shape();
    vec![
        Matcher::new(
            "labeled-ipfs-cid",
            &format!(r"(?i){}\s*({})", regex::escape(CID_LABEL), cid),
        ),
        Matcher::new("labeled-cid", &format!(r"(?i)\bCID:\s*({cid})")),
        Matcher::new("ipfs-path-cid", &format!(r"(?i)/ipfs/({cid})")),
        Matcher::new(
            "bare-cid",
            &format!(
                r"(?i)\b({}{}{{{},}})\b",
                regex::escape(CID_PREFIX),
                CID_BODY_CLASS,
                BARE_CID_MIN_LEN - CID_PREFIX.len()
            ),
        ),
    ]
});

/// Access URL strategies, highest confidence first.
pub fn url_matchers() -> &'static [Matcher] {
    &URL_MATCHERS
}

/// Content identifier strategies, highest confidence first.
pub fn cid_matchers() -> &'static [Matcher] {
    &CID_MATCHERS
}

/// Runs matchers in order and returns the first hit with the matcher's name.
pub fn first_match(matchers: &[Matcher], text: &str) -> Option<(&'static str, String)> {
    matchers
        .iter()
        .find_map(|m| m.find(text).map(|value| (m.name, value)))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedOutput {
    pub content_id: Option<String>,
    pub url: Option<String>,
}

/// Extract both fields from a single block of tool output.
pub fn parse(text: &str) -> ParsedOutput {
    ParsedOutput {
        content_id: first_match(cid_matchers(), text).map(|(_, v)| v),
        url: first_match(url_matchers(), text).map(|(_, v)| v),
    }
}

/// Parse the listing output, falling back per field to the upload output.
///
/// Some tool versions print the access URL only at upload time.
pub fn parse_outputs(list_output: &str, upload_output: &str) -> ParsedOutput {
    let from_list = parse(list_output);
    if from_list.content_id.is_some() && from_list.url.is_some() {
        return from_list;
    }
    let from_upload = parse(upload_output);
    ParsedOutput {
        content_id: from_list.content_id.or(from_upload.content_id),
        url: from_list.url.or(from_upload.url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labeled_fields_are_extracted() {
        let parsed = parse("ENS URL: https://abc123.pinit.eth.limo\nIPFS CID: bafybeigabc");
        assert_eq!(parsed.content_id.as_deref(), Some("bafybeigabc"));
        assert_eq!(parsed.url.as_deref(), Some("https://abc123.pinit.eth.limo"));
    }

    #[test]
    fn matcher_order_is_declared_priority() {
        let names: Vec<_> = url_matchers().iter().map(|m| m.name).collect();
        assert_eq!(
            names,
            ["labeled-access-url", "bare-access-url", "gateway-path-url"]
        );
        let names: Vec<_> = cid_matchers().iter().map(|m| m.name).collect();
        assert_eq!(
            names,
            ["labeled-ipfs-cid", "labeled-cid", "ipfs-path-cid", "bare-cid"]
        );
    }

    #[test]
    fn labeled_url_beats_earlier_bare_url() {
        let text = "mirror https://zzz.pinit.eth.limo\nENS URL: https://abc.pinit.eth.limo";
        let (name, value) = first_match(url_matchers(), text).unwrap();
        assert_eq!(name, "labeled-access-url");
        assert_eq!(value, "https://abc.pinit.eth.limo");
    }

    #[test]
    fn each_backup_matcher_works_on_its_own() {
        let text = "uploaded to https://dweb.link/ipfs/bafybeihello123";
        let (name, value) = first_match(url_matchers(), text).unwrap();
        assert_eq!(name, "gateway-path-url");
        assert_eq!(value, "https://dweb.link/ipfs/bafybeihello123");
        let (name, value) = first_match(cid_matchers(), text).unwrap();
        assert_eq!(name, "ipfs-path-cid");
        assert_eq!(value, "bafybeihello123");

        let (name, value) = first_match(cid_matchers(), "root CID: bafkreiabcdef").unwrap();
        assert_eq!(name, "labeled-cid");
        assert_eq!(value, "bafkreiabcdef");
    }

    #[test]
    fn short_bare_tokens_are_not_identifiers() {
        assert_eq!(first_match(cid_matchers(), "the baffle was loud"), None);
        assert_eq!(first_match(cid_matchers(), "No bafflements today"), None);
        let just_short = format!("baf{}", "a".repeat(BARE_CID_MIN_LEN - 4));
        assert_eq!(first_match(cid_matchers(), &just_short), None);
        let long_enough = format!("baf{}", "a".repeat(BARE_CID_MIN_LEN - 3));
        assert_eq!(
            first_match(cid_matchers(), &long_enough),
            Some(("bare-cid", long_enough.clone()))
        );
    }

    #[test]
    fn upload_output_fills_missing_fields() {
        let parsed = parse_outputs(
            "IPFS CID: bafybeilisted",
            "done: https://q1w2e3.pinit.eth.limo",
        );
        assert_eq!(parsed.content_id.as_deref(), Some("bafybeilisted"));
        assert_eq!(parsed.url.as_deref(), Some("https://q1w2e3.pinit.eth.limo"));
    }

    #[test]
    fn listing_output_wins_over_upload_output() {
        let parsed = parse_outputs(
            "ENS URL: https://fromlist.pinit.eth.limo",
            "ENS URL: https://fromupload.pinit.eth.limo",
        );
        assert_eq!(parsed.url.as_deref(), Some("https://fromlist.pinit.eth.limo"));
    }
}
