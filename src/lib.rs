//! Points Chinese language-switcher entries at the right flag.
//!
//! Traditional Chinese options get the Taiwan flag and Simplified Chinese
//! options get the China flag. The corrector runs over a page it does not
//! control and keeps the fix applied as the page mutates and navigates.

pub mod app;
pub mod config;
pub mod dom;
pub mod error;
pub mod flags;
pub mod logging;
pub mod model;
pub mod page;
pub mod scanner;
pub mod scheduler;
pub mod update;

pub use app::{start, StartError, Tab};
pub use config::Config;
pub use error::FlagFixError;
pub use flags::{classify, Classification, FlagCorrector, FlagTarget};
pub use scanner::Scanner;
