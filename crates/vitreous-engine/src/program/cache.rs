use std::collections::HashMap;

use super::{ProgramSource, ShaderError, ShaderProgram, ShaderVariant, FRAGMENT_ENTRY, QUAD_ATTRIBUTES, VERTEX_ENTRY};

/// Compiles each variant once and hands out clones.
///
/// Failures are cached too; every surface asking for a broken variant gets
/// the same error.
#[derive(Debug, Default)]
pub struct ProgramCache {
    overrides: HashMap<ShaderVariant, String>,
    compiled: HashMap<ShaderVariant, Result<ShaderProgram, ShaderError>>,
}

impl ProgramCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a variant's WGSL. Surfaces pick it up on their next install.
    pub fn set_source(&mut self, variant: ShaderVariant, wgsl: impl Into<String>) {
        self.overrides.insert(variant, wgsl.into());
        self.compiled.remove(&variant);
    }

    pub fn get(&mut self, variant: ShaderVariant) -> Result<ShaderProgram, ShaderError> {
        let overrides = &self.overrides;
        self.compiled
            .entry(variant)
            .or_insert_with(|| match overrides.get(&variant) {
                Some(wgsl) => ShaderProgram::compile(ProgramSource {
                    label: variant.label(),
                    wgsl,
                    vertex_entry: VERTEX_ENTRY,
                    fragment_entry: FRAGMENT_ENTRY,
                    attributes: QUAD_ATTRIBUTES,
                    uniforms: variant.uniforms(),
                }),
                None => variant.compile(),
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broken_override_is_reported_and_cached() {
        let mut cache = ProgramCache::new();
        cache.set_source(ShaderVariant::Nested, "this is not wgsl");
        let first = cache.get(ShaderVariant::Nested).unwrap_err();
        assert!(matches!(first, ShaderError::Compile { .. }));
        assert_eq!(first.label(), "glass.nested");
        assert!(cache.get(ShaderVariant::Nested).is_err());
    }

    #[test]
    fn built_in_variant_compiles_through_cache() {
        let mut cache = ProgramCache::new();
        assert!(cache.get(ShaderVariant::Standalone).is_ok());
    }
}
