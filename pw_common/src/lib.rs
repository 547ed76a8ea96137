mod helpers;
mod yen;

pub mod op;
mod secret;

pub use helpers::parse_boolean_flag;
pub use secret::Secret;
pub use yen::{Yen, YenConversionError, CURRENCY_CODE};
