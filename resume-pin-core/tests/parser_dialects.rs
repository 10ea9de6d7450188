use resume_pin_core::parser::{parse, parse_outputs, ParsedOutput};

const NOISE: &[&str] = &[
    "",
    "\u{1b}[32m✔\u{1b}[0m Upload complete\n",
    "Warning: a newer version of pinme is available\n",
    "[2024-05-01T10:00:00Z] progress 100%\n",
    "Error: none\n",
];

#[test]
fn labeled_listing_parses_both_fields() {
    assert_eq!(
        parse("ENS URL: https://abc123.pinit.eth.limo\nIPFS CID: bafybeigabc"),
        ParsedOutput {
            content_id: Some("bafybeigabc".into()),
            url: Some("https://abc123.pinit.eth.limo".into()),
        }
    );
}

#[test]
fn labeled_url_survives_surrounding_noise() {
    for before in NOISE {
        for after in NOISE {
            let text = format!("{before}ENS URL: https://k3y9.pinit.eth.limo\n{after}");
            assert_eq!(
                parse(&text).url.as_deref(),
                Some("https://k3y9.pinit.eth.limo"),
                "input: {text:?}"
            );
        }
    }
}

#[test]
fn backup_patterns_apply_without_labels() {
    let text = "Your site: https://m0n.pinit.eth.limo (cid bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi)";
    let parsed = parse(text);
    assert_eq!(parsed.url.as_deref(), Some("https://m0n.pinit.eth.limo"));
    assert_eq!(parsed.content_id.as_deref(), Some("bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi"));
}

#[test]
fn tabular_listing_dialect() {
    let text = "\
│ name    │ cid                                                         │ url                            │
│ cv.html │ bafkreidgvpkjawlxz6sffxzwgooowe5yt7i6wsyg236mfoks77nywkptdq │ https://p0q1.pinit.eth.limo    │
";
    let parsed = parse(text);
    assert_eq!(parsed.url.as_deref(), Some("https://p0q1.pinit.eth.limo"));
    assert_eq!(parsed.content_id.as_deref(), Some("bafkreidgvpkjawlxz6sffxzwgooowe5yt7i6wsyg236mfoks77nywkptdq"));
}

#[test]
fn label_matching_is_case_insensitive() {
    let parsed = parse("ens url: HTTPS://ABC.PINIT.ETH.LIMO\nipfs cid: BAFYBEIXYZ12345");
    assert_eq!(parsed.url.as_deref(), Some("HTTPS://ABC.PINIT.ETH.LIMO"));
    assert_eq!(parsed.content_id.as_deref(), Some("BAFYBEIXYZ12345"));
}

#[test]
fn words_starting_like_identifiers_are_not_identifiers() {
    let parsed = parse("Done: https://x1.pinit.eth.limo\nNo bafflements today, nothing baffling\n");
    assert_eq!(parsed.url.as_deref(), Some("https://x1.pinit.eth.limo"));
    assert_eq!(parsed.content_id, None);
}

#[test]
fn nothing_recognisable_yields_absence() {
    for text in NOISE {
        assert_eq!(parse(text), ParsedOutput::default());
    }
    assert_eq!(
        parse("visit http://example.com or ipfs://something"),
        ParsedOutput::default()
    );
    assert_eq!(parse_outputs("nothing", "still nothing"), ParsedOutput::default());
}
