//! Configuration section definitions.

mod build;
mod check;
mod serve;
mod site;

pub use build::BuildSectionConfig;
pub use check::CheckConfig;
pub use serve::ServeConfig;
pub use site::{NavItem, SiteSectionConfig};
