//! Build plans: schema, tolerant decoding and validation

pub mod schema;
pub mod validate;

pub use schema::{
    BuildPlan, ExtensionSpec, FileSpec, ModelProperty, ModelSpec, MonetizationPlan, PackageSpec,
    PermissionSpec, ProductSpec,
};
pub use validate::{PlanReport, sanitize_app_name, validate_plan};
