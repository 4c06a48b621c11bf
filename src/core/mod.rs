pub mod decoder;
pub mod encoder;
pub mod roster;
pub mod token;

pub use crate::domain::model::{Dataset, DecodedResult, DecodedRow, Mark, Record, StudentRecord};
pub use crate::domain::ports::FixtureStore;
pub use crate::utils::error::Result;
pub use decoder::decode;
pub use encoder::{encode, encode_json};
pub use roster::Roster;
