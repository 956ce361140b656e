pub mod config;
pub mod driver;

pub use config::{BrowserConfig, HarvestConfig, SelectorConfig, TimeoutConfig, Viewport};
pub use driver::PageDriver;
