pub mod add_strategy;
pub mod configure;
pub mod deposit;
pub mod emergency_withdraw;
pub mod harvest;
pub mod initialize;
pub mod manage_strategy;
pub mod update_debt;
pub mod views;
pub mod withdraw;

pub use add_strategy::*;
pub use configure::*;
pub use deposit::*;
pub use emergency_withdraw::*;
pub use harvest::*;
pub use initialize::*;
pub use manage_strategy::*;
pub use update_debt::*;
pub use views::*;
pub use withdraw::*;
