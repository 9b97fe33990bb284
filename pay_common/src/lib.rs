mod ids;
mod minor_units;

pub use ids::{OrderId, OrderStatus, UserId, UserIdParseError};
pub use minor_units::{MinorUnits, MinorUnitsConversionError};
