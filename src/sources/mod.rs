pub mod adapter;
pub mod subtensor;

pub use adapter::{MetadataSource, SubnetSnapshot};
pub use subtensor::SubtensorSource;
