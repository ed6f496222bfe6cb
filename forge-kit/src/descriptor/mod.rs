//! Project descriptor compilation
//!
//! A [`ProjectDescriptor`] is the multi-target project a build plan
//! describes: one application target per platform, watch app and runtime
//! extension pairs, embedded extensions, packages and schemes. It is
//! computed fresh on every compile and rendered to XcodeGen YAML.

pub mod bundle;
pub mod compiler;
pub mod extension;
pub mod io;
pub mod model;
pub mod property;
pub mod render;
pub mod storekit;

pub use compiler::{DescriptorCompiler, DeviceFamilyRow, device_family_row};
pub use io::{scaffold_sources, write_atomic, write_project};
pub use model::{
    Dependency, PackageRef, ProjectDescriptor, ProjectOptions, Scheme, SourceRoot, Target,
    TargetType,
};
pub use property::{PropertyMap, PropertyValue, merge_properties};
pub use render::render_yaml;
pub use storekit::render_storekit;
