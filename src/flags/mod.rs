//! Flag icons module - the two flags a Chinese language option may carry.
//!
//! Traditional Chinese entries get the Taiwan flag, Simplified Chinese
//! entries get the China flag. Icons are served by the country-flag-icons
//! project and referenced by URL only.

mod corrector;
mod lang_mapping;

pub use corrector::{is_flag_icon, FlagCorrector};
pub use lang_mapping::{classify, variant_for_code, Classification};

/// Default location of the 1x1 SVG flag set.
pub const DEFAULT_ICON_BASE: &str = "https://purecatamphetamine.github.io/country-flag-icons/1x1";

/// Country flag a language option should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagTarget {
    /// Taiwan, for Traditional Chinese.
    Tw,
    /// China, for Simplified Chinese.
    Cn,
}

impl FlagTarget {
    /// ISO 3166-1 alpha-2 code, also used as the image alt text.
    pub fn code(self) -> &'static str {
        match self {
            FlagTarget::Tw => "TW",
            FlagTarget::Cn => "CN",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            FlagTarget::Tw => "TW.svg",
            FlagTarget::Cn => "CN.svg",
        }
    }

    /// Canonical icon address under `base`, without any cache-busting suffix.
    pub fn icon_url(self, base: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), self.file_name())
    }
}

impl std::fmt::Display for FlagTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
