mod aggregate;
mod category;
mod comparison;
mod filter;
mod money;
mod period;
mod quality;
mod record;
mod variation;

pub use aggregate::*;
pub use category::*;
pub use comparison::*;
pub use filter::*;
pub use money::*;
pub use period::*;
pub use quality::*;
pub use record::*;
pub use variation::*;
