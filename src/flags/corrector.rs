//! Flag image correction inside a language option.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use super::{FlagTarget, DEFAULT_ICON_BASE};
use crate::dom::QueryableNode;

static FLAG_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)country-flag-icons|flag-icons|flagcdn\.com|/flags/").unwrap());
static FLAG_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|/)(?:cn|tw)\.svg(?:[?#]|$)").unwrap());

/// Whether an image source looks like one of the flag icons we manage.
pub fn is_flag_icon(src: &str) -> bool {
    FLAG_HOST.is_match(src) || FLAG_FILE.is_match(src)
}

fn cache_stamp() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Rewrites flag images to the icon matching a language option.
#[derive(Debug, Clone)]
pub struct FlagCorrector {
    icon_base: String,
    cache_bust: bool,
    stamp: fn() -> i64,
}

impl Default for FlagCorrector {
    fn default() -> Self {
        Self::new(DEFAULT_ICON_BASE, true)
    }
}

impl FlagCorrector {
    pub fn new(icon_base: impl Into<String>, cache_bust: bool) -> Self {
        Self {
            icon_base: icon_base.into(),
            cache_bust,
            stamp: cache_stamp,
        }
    }

    /// Replace the cache-busting clock.
    pub fn with_stamp(mut self, stamp: fn() -> i64) -> Self {
        self.stamp = stamp;
        self
    }

    pub fn icon_base(&self) -> &str {
        &self.icon_base
    }

    /// Address written into a corrected image.
    pub fn target_src(&self, target: FlagTarget) -> String {
        let url = target.icon_url(&self.icon_base);
        if self.cache_bust {
            format!("{url}?v={}", (self.stamp)())
        } else {
            url
        }
    }

    /// Point every flag image under `container` at `target`.
    ///
    /// Returns how many images were rewritten. Non-flag images and images
    /// that already show `target` are left alone.
    pub fn correct_images<N: QueryableNode>(&self, container: &N, target: FlagTarget) -> usize {
        let mut images = container.query_descendants(|n| n.has_tag("img"));
        if container.has_tag("img") {
            images.insert(0, container.clone());
        }

        let mut corrected = 0;
        for img in images {
            let src = img.attr_or_empty("src");
            if !is_flag_icon(&src) {
                continue;
            }
            let alt = img.attr_or_empty("alt");
            if already_shows(&src, &alt, target) {
                trace!(%src, %alt, %target, "Flag already correct");
                continue;
            }

            let new_src = self.target_src(target);
            debug!(from = %src, to = %new_src, %target, "Correcting flag image");
            img.set_attribute("src", &new_src);
            img.set_attribute("alt", target.code());
            corrected += 1;
        }
        corrected
    }
}

/// The raw `src` is compared, so a cache-busting query defeats the filename
/// check and only the alt shortcut remains.
fn already_shows(src: &str, alt: &str, target: FlagTarget) -> bool {
    let src = src.to_ascii_lowercase();
    let file = target.file_name().to_ascii_lowercase();
    let filename_matches = src == file || src.ends_with(&format!("/{file}"));
    filename_matches || alt == target.code()
}
