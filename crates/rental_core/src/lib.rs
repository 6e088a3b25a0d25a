pub mod domain;
pub mod listing;
pub mod map;
pub mod memory;
pub mod ports;
pub mod reference;
pub mod selection;

pub use domain::{Agent, Furnishing, GeoPoint, NewProperty, Property, PropertyImage, PropertyMetadata, PropertyStatus};
pub use listing::{PropertyFilter, SortOrder};
pub use memory::MemoryStore;
pub use ports::{KeyValueStore, PortError, PortResult, PropertyRepository, RandomSource};
pub use reference::MetadataSettings;
pub use selection::SelectionStore;
