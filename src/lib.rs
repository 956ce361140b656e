pub mod browser;
pub mod core;
pub mod errors;
pub mod harvest;
pub mod testing;

pub use browser::ChromeDriver;
pub use core::{HarvestConfig, PageDriver, SelectorConfig, TimeoutConfig};
pub use errors::HarvestError;
pub use harvest::{HarvestReport, Harvester, LinkSink};
