pub mod profit_lock;
pub mod registry;
pub mod vault;

pub use profit_lock::*;
pub use registry::*;
pub use vault::*;
