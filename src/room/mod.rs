//! Room generation
//!
//! Biomes, placed features and the six-step pipeline that turns a request
//! for a single room into a finished layout.

pub mod biome;
pub mod feature;
pub mod request;
pub mod navigation;
pub mod pipeline;

pub use biome::{Biome, BiomeProfile, BiomeTable, BiomeType, FeatureOverride, Polarity};
pub use feature::{FeatureList, FeatureType, PlacedFeature};
pub use request::{LayoutType, RoomGenerationRequest};
pub use navigation::{navigation_hints, validate_reachability, NavigationHint, NavigationKind};
pub use pipeline::{PipelineConfig, RoomLayout, RoomPipeline};
