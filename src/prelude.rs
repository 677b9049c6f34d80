pub use crate::galaxy::{
    generate, CommitGalaxyParams, GalaxyCloud, GalaxyConfigUi, GalaxyError, GalaxyParams,
    GenerationStats, PointStyle,
};
