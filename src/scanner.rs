//! Candidate discovery and correction over a subtree.

use tracing::{debug, trace};

use crate::dom::QueryableNode;
use crate::flags::{classify, Classification, FlagCorrector};

const OPTION_ROLES: &[&str] = &[
    "button",
    "menuitem",
    "menuitemradio",
    "menuitemcheckbox",
    "option",
];

/// Attributes that name a language, in lookup order.
const LANGUAGE_ATTRIBUTES: &[&str] = &["data-lang", "data-language", "data-locale", "hreflang", "lang"];

/// Whether `node` plausibly represents a language option.
///
/// `lang` on the root `<html>`/`<body>` describes the whole page, not an
/// option, and does not count.
pub fn is_candidate<N: QueryableNode>(node: &N) -> bool {
    let Some(tag) = node.tag_name() else {
        return false;
    };
    if tag == "button" {
        return true;
    }
    let role = node.attr_or_empty("role").to_ascii_lowercase();
    if OPTION_ROLES.contains(&role.as_str()) {
        return true;
    }
    LANGUAGE_ATTRIBUTES.iter().any(|attr| {
        if *attr == "lang" && (tag == "html" || tag == "body") {
            return false;
        }
        node.attribute(attr).is_some()
    })
}

/// Label text and language code for a candidate.
fn label_of<N: QueryableNode>(node: &N) -> (String, Option<String>) {
    let text = [
        node.attr_or_empty("aria-label"),
        node.attr_or_empty("title"),
        node.text_content(),
    ]
    .join(" ");
    let code = LANGUAGE_ATTRIBUTES
        .iter()
        .map(|attr| node.attr_or_empty(attr))
        .find(|value| !value.trim().is_empty());
    (text, code)
}

pub fn classify_candidate<N: QueryableNode>(node: &N) -> Classification {
    let (text, code) = label_of(node);
    classify(&text, code.as_deref())
}

/// Result of one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    pub candidates: usize,
    pub matched: usize,
    pub corrected: usize,
}

/// Applies the flag corrector to every classified candidate under a root.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    corrector: FlagCorrector,
}

impl Scanner {
    pub fn new(corrector: FlagCorrector) -> Self {
        Self { corrector }
    }

    pub fn corrector(&self) -> &FlagCorrector {
        &self.corrector
    }

    /// Scan `root` and its descendants.
    pub fn scan<N: QueryableNode>(&self, root: &N) -> ScanOutcome {
        let mut nodes = root.query_descendants(|n| is_candidate(n));
        if is_candidate(root) {
            nodes.insert(0, root.clone());
        }

        let mut outcome = ScanOutcome {
            candidates: nodes.len(),
            ..ScanOutcome::default()
        };
        for node in &nodes {
            let classification = classify_candidate(node);
            if !classification.is_match() {
                continue;
            }
            outcome.matched += 1;
            if classification.traditional && classification.simplified {
                debug!(tag = %node_tag(node), "Label carries both Traditional and Simplified signals");
            }
            for target in classification.targets() {
                outcome.corrected += self.corrector.correct_images(node, target);
            }
        }
        trace!(
            candidates = outcome.candidates,
            matched = outcome.matched,
            corrected = outcome.corrected,
            "Scan finished"
        );
        outcome
    }
}

fn node_tag<N: QueryableNode>(node: &N) -> String {
    node.tag_name().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn scanner() -> Scanner {
        Scanner::new(FlagCorrector::default().with_stamp(|| 42))
    }

    #[test]
    fn candidate_selector() {
        let doc = Document::parse(
            r#"<html lang="zh-Hant"><body lang="en">
                <button id="b"></button>
                <div id="r" role="menuitem"></div>
                <a id="h" hreflang="zh-Hans"></a>
                <span id="l" lang="zh-Hant"></span>
                <span id="d" data-locale="zh_Hans"></span>
                <div id="x"></div>
            </body></html>"#,
        );
        for id in ["b", "r", "h", "l", "d"] {
            assert!(is_candidate(&doc.element_by_id(id).unwrap()), "{id}");
        }
        assert!(!is_candidate(&doc.element_by_id("x").unwrap()));
        assert!(!is_candidate(&doc.body().unwrap()));
        assert!(!is_candidate(&doc.root()));
    }

    #[test]
    fn label_uses_aria_title_text_and_code() {
        let doc = Document::parse(
            r#"<button id="a" aria-label="Traditional Chinese"></button>
               <button id="t" title="简体中文"></button>
               <div id="c" data-lang="zh-Hant">中文</div>"#,
        );
        assert!(classify_candidate(&doc.element_by_id("a").unwrap()).traditional);
        assert!(classify_candidate(&doc.element_by_id("t").unwrap()).simplified);
        assert!(classify_candidate(&doc.element_by_id("c").unwrap()).traditional);
    }

    #[test]
    fn scan_corrects_matched_candidates_only() {
        let doc = Document::parse(
            r#"<ul>
                <li role="menuitem" id="hant"><img src="/flags/CN.svg" alt="CN"> 繁體中文</li>
                <li role="menuitem" id="hans"><img src="/flags/TW.svg?v=1" alt="TW"> 简体中文</li>
                <li role="menuitem" id="en"><img src="/flags/CN.svg" alt="CN"> English</li>
            </ul>"#,
        );
        let outcome = scanner().scan(&doc.root());
        assert_eq!(outcome.candidates, 3);
        assert_eq!(outcome.matched, 2);
        assert_eq!(outcome.corrected, 2);

        let alt = |id: &str| {
            let li = doc.element_by_id(id).unwrap();
            li.query_descendants(|n| n.has_tag("img"))[0].attr_or_empty("alt")
        };
        assert_eq!(alt("hant"), "TW");
        assert_eq!(alt("hans"), "CN");
        assert_eq!(alt("en"), "CN");
    }

    #[test]
    fn scan_includes_root_candidate() {
        let doc = Document::parse(r#"<button id="b" data-lang="zh-Hans"><img src="/flags/TW.svg" alt="TW"></button>"#);
        let button = doc.element_by_id("b").unwrap();
        let outcome = scanner().scan(&button);
        assert_eq!(outcome.matched, 1);
        assert_eq!(outcome.corrected, 1);
    }
}
