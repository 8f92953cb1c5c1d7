pub mod data_table;
pub mod shared;
pub mod widget;

pub use data_table::*;
pub use shared::*;
pub use widget::*;
