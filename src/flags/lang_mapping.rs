//! Language label to flag mapping.
//!
//! Decides whether a language option's label names Traditional or
//! Simplified Chinese. The two signals are detected independently.

use once_cell::sync::Lazy;
use regex::Regex;

use super::FlagTarget;

// ASCII word boundaries, so CJK neighbours still count as a boundary. An
// optional region subtag may follow the script ("zh_Hant_TW", "zh-Hans-CN").
static HANT_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z0-9_])zh[-_]hant(?:[-_](?:[a-z]{2}|[0-9]{3}))?(?:[^a-z0-9_]|$)")
        .unwrap()
});
static HANS_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z0-9_])zh[-_]hans(?:[-_](?:[a-z]{2}|[0-9]{3}))?(?:[^a-z0-9_]|$)")
        .unwrap()
});

const TRADITIONAL_NAMES: &[&str] = &["繁體中文", "繁体中文", "traditional chinese"];
const SIMPLIFIED_NAMES: &[&str] = &["简体中文", "simplified chinese"];

/// Script signals found on one language option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    pub traditional: bool,
    pub simplified: bool,
}

impl Classification {
    pub fn is_match(self) -> bool {
        self.traditional || self.simplified
    }

    /// Flags to apply, Taiwan first. A contradictory label yields both.
    pub fn targets(self) -> Vec<FlagTarget> {
        let mut out = Vec::with_capacity(2);
        if self.traditional {
            out.push(FlagTarget::Tw);
        }
        if self.simplified {
            out.push(FlagTarget::Cn);
        }
        out
    }

    pub fn label(self) -> &'static str {
        match (self.traditional, self.simplified) {
            (true, true) => "both",
            (true, false) => "traditional",
            (false, true) => "simplified",
            (false, false) => "neither",
        }
    }
}

/// Classify a label.
///
/// `text` is the option's accessible label and visible text; it is
/// case-folded here. `code` is an explicit language attribute, if any.
pub fn classify(text: &str, code: Option<&str>) -> Classification {
    let folded = text.to_lowercase();
    let code = code.unwrap_or("");

    let traditional = HANT_CODE.is_match(&folded)
        || TRADITIONAL_NAMES.iter().any(|name| folded.contains(name))
        || HANT_CODE.is_match(code);
    let simplified = HANS_CODE.is_match(&folded)
        || SIMPLIFIED_NAMES.iter().any(|name| folded.contains(name))
        || HANS_CODE.is_match(code);

    Classification {
        traditional,
        simplified,
    }
}

/// Map an explicit language code to its flag.
///
/// Handles both separators and an optional region ("zh-Hant", "zh_Hans_CN").
/// Returns `None` for anything that is not a script-tagged Chinese code.
pub fn variant_for_code(code: &str) -> Option<FlagTarget> {
    if HANT_CODE.is_match(code) {
        Some(FlagTarget::Tw)
    } else if HANS_CODE.is_match(code) {
        Some(FlagTarget::Cn)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traditional_signals() {
        assert!(classify("繁體中文", None).traditional);
        assert!(classify("繁体中文", None).traditional);
        assert!(classify("Traditional Chinese", None).traditional);
        assert!(classify("Language: ZH-HANT", None).traditional);
        assert!(classify("zh_Hant", None).traditional);
        assert!(classify("", Some("zh-Hant-TW")).traditional);
        assert!(!classify("繁體中文", None).simplified);
    }

    #[test]
    fn simplified_signals() {
        assert!(classify("简体中文", None).simplified);
        assert!(classify("SIMPLIFIED CHINESE", None).simplified);
        assert!(classify("", Some("zh_Hans")).simplified);
        assert!(!classify("简体中文", None).traditional);
    }

    #[test]
    fn codes_need_word_boundaries() {
        assert!(!classify("xzh-hant", None).traditional);
        assert!(!classify("zh-hantx", None).traditional);
        assert!(!classify("", Some("zh-hans2")).simplified);
        // CJK characters are not ASCII word characters.
        assert!(classify("中文zh-hant", None).traditional);
    }

    #[test]
    fn unrelated_labels_match_nothing() {
        let c = classify("English", Some("en-US"));
        assert!(!c.is_match());
        assert_eq!(c.label(), "neither");
        assert!(c.targets().is_empty());
        // Bare "zh" carries no script information.
        assert!(!classify("中文", Some("zh")).is_match());
    }

    #[test]
    fn contradictory_label_reports_both() {
        let c = classify("繁體中文 / 简体中文", None);
        assert_eq!(c.label(), "both");
        assert_eq!(c.targets(), vec![FlagTarget::Tw, FlagTarget::Cn]);
    }

    #[test]
    fn code_mapping() {
        assert_eq!(variant_for_code("zh-Hant"), Some(FlagTarget::Tw));
        assert_eq!(variant_for_code("zh_Hans_CN"), Some(FlagTarget::Cn));
        assert_eq!(variant_for_code("zh-Hans-419"), Some(FlagTarget::Cn));
        assert_eq!(variant_for_code("zh-TW"), None);
        assert_eq!(variant_for_code("ja"), None);
    }

    #[test]
    fn underscore_region_codes() {
        assert_eq!(variant_for_code("zh_Hant_TW"), Some(FlagTarget::Tw));
        let c = classify("", Some("zh_Hant_TW"));
        assert!(c.traditional);
        assert!(!c.simplified);
        assert!(classify("", Some("zh_Hans_CN")).simplified);
        // A region must be a full subtag.
        assert_eq!(variant_for_code("zh_Hant_TWN"), None);
        assert_eq!(variant_for_code("zh_Hant_x"), None);
    }
}
