//! Surface style configuration.

mod glass;

pub use glass::{
    ConfigError, ContentExtent, EffectParams, GlassConfig, TextContent, NESTED_BLUR_PX,
    STANDALONE_BLUR_PX,
};
