mod frame;
mod ids;
mod money;
mod project;
mod report_config;

pub use frame::*;
pub use ids::*;
pub use money::*;
pub use project::*;
pub use report_config::*;
