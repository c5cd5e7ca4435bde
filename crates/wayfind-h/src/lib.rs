//! Chromium-backed implementation of the wayfind page capability.

pub mod backend;
pub mod cdp;
pub mod inject;
pub mod page;

pub use backend::HeadlessBrowser;
pub use page::ChromiumPage;
