use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{Binding, Handle, Module, ShaderStage, Type, TypeInner};

use super::ShaderError;

/// Source and entry points of a vertex + fragment program.
#[derive(Debug, Clone, Copy)]
pub struct ProgramSource<'a> {
    pub label: &'a str,
    pub wgsl: &'a str,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
    /// Vertex inputs the caller will feed.
    pub attributes: &'a [&'a str],
    /// Resource bindings the caller will bind.
    pub uniforms: &'a [&'a str],
}

/// Where a named program input lives.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    Attribute(u32),
    Uniform { group: u32, binding: u32 },
}

/// A validated WGSL program with its input locations resolved.
///
/// Construction either yields a program whose stages link and whose
/// requested attributes/uniforms all exist, or a [`ShaderError`].
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    label: Arc<str>,
    wgsl: Arc<str>,
    vertex_entry: Arc<str>,
    fragment_entry: Arc<str>,
    locations: HashMap<String, Location>,
}

impl ShaderProgram {
    pub fn compile(src: ProgramSource<'_>) -> Result<Self, ShaderError> {
        let module = naga::front::wgsl::parse_str(src.wgsl).map_err(|e| ShaderError::Compile {
            label: src.label.to_owned(),
            diagnostic: e.emit_to_string(src.wgsl),
        })?;

        Validator::new(ValidationFlags::all(), Capabilities::default())
            .validate(&module)
            .map_err(|e| ShaderError::Compile {
                label: src.label.to_owned(),
                diagnostic: e.emit_to_string(src.wgsl),
            })?;

        let link = |reason: String| ShaderError::Link {
            label: src.label.to_owned(),
            reason,
        };

        let vertex = find_entry(&module, src.vertex_entry, ShaderStage::Vertex)
            .ok_or_else(|| link(format!("missing vertex entry point `{}`", src.vertex_entry)))?;
        let fragment = find_entry(&module, src.fragment_entry, ShaderStage::Fragment)
            .ok_or_else(|| link(format!("missing fragment entry point `{}`", src.fragment_entry)))?;

        // Inter-stage interface: every fragment input needs a vertex output
        // at the same location and of the same type.
        let mut outputs = BTreeMap::new();
        if let Some(result) = &vertex.function.result {
            collect_locations(&module, result.ty, result.binding.as_ref(), None, &mut |_, loc, ty| {
                outputs.insert(loc, ty.clone());
            });
        }
        let mut inputs = BTreeMap::new();
        for arg in &fragment.function.arguments {
            collect_locations(&module, arg.ty, arg.binding.as_ref(), arg.name.as_deref(), &mut |name, loc, ty| {
                inputs.insert(loc, (name.unwrap_or("<unnamed>").to_owned(), ty.clone()));
            });
        }
        for (loc, (name, ty)) in &inputs {
            match outputs.get(loc) {
                None => {
                    return Err(link(format!(
                        "fragment input `{name}` at @location({loc}) has no matching vertex output"
                    )));
                }
                Some(out_ty) if out_ty != ty => {
                    return Err(link(format!(
                        "fragment input `{name}` at @location({loc}) does not match the vertex output type"
                    )));
                }
                Some(_) => {}
            }
        }

        let mut locations = HashMap::new();
        for arg in &vertex.function.arguments {
            collect_locations(&module, arg.ty, arg.binding.as_ref(), arg.name.as_deref(), &mut |name, loc, _| {
                if let Some(name) = name {
                    locations.insert(name.to_owned(), Location::Attribute(loc));
                }
            });
        }
        for (_, var) in module.global_variables.iter() {
            if let (Some(name), Some(rb)) = (&var.name, &var.binding) {
                locations.insert(
                    name.clone(),
                    Location::Uniform { group: rb.group, binding: rb.binding },
                );
            }
        }

        for name in src.attributes {
            if !matches!(locations.get(*name), Some(Location::Attribute(_))) {
                return Err(link(format!("vertex attribute `{name}` is not consumed by `{}`", src.vertex_entry)));
            }
        }
        for name in src.uniforms {
            if !matches!(locations.get(*name), Some(Location::Uniform { .. })) {
                return Err(link(format!("uniform `{name}` is not declared")));
            }
        }

        log::debug!(
            "shader `{}` compiled ({} locations resolved)",
            src.label,
            locations.len()
        );

        Ok(Self {
            label: Arc::from(src.label),
            wgsl: Arc::from(src.wgsl),
            vertex_entry: Arc::from(src.vertex_entry),
            fragment_entry: Arc::from(src.fragment_entry),
            locations,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn wgsl(&self) -> &str {
        &self.wgsl
    }

    pub fn vertex_entry(&self) -> &str {
        &self.vertex_entry
    }

    pub fn fragment_entry(&self) -> &str {
        &self.fragment_entry
    }

    pub fn location(&self, name: &str) -> Option<Location> {
        self.locations.get(name).copied()
    }

    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        match self.location(name)? {
            Location::Attribute(loc) => Some(loc),
            Location::Uniform { .. } => None,
        }
    }

    pub fn uniform_binding(&self, name: &str) -> Option<(u32, u32)> {
        match self.location(name)? {
            Location::Uniform { group, binding } => Some((group, binding)),
            Location::Attribute(_) => None,
        }
    }

    /// Uploads the validated source to the device.
    pub fn create_module(&self, device: &wgpu::Device) -> wgpu::ShaderModule {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&self.label),
            source: wgpu::ShaderSource::Wgsl(self.wgsl.to_string().into()),
        })
    }
}

fn find_entry<'m>(module: &'m Module, name: &str, stage: ShaderStage) -> Option<&'m naga::EntryPoint> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.name == name && ep.stage == stage)
}

/// Visits every `@location` reachable from an argument or result, looking
/// through one level of struct members.
fn collect_locations(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    name: Option<&str>,
    visit: &mut dyn FnMut(Option<&str>, u32, &TypeInner),
) {
    match binding {
        Some(Binding::Location { location, .. }) => {
            visit(name, *location, &module.types[ty].inner);
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    if let Some(Binding::Location { location, .. }) = &member.binding {
                        visit(member.name.as_deref(), *location, &module.types[member.ty].inner);
                    }
                }
            }
        }
    }
}
