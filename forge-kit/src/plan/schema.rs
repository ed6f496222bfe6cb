//! Build plan schema and tolerant decoding.
//!
//! [`BuildPlan`] is the canonical, typed form. Planner output goes through
//! [`BuildPlan::from_json`], which decodes a loosely-typed wire shape and
//! coerces it: camelCase aliases, scalar-or-list fields, unknown platforms
//! and absent optional sections are all accepted.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::error::{ForgeError, Result};
use crate::intent::strip_code_fence;
use crate::types::{DeviceFamily, ExtensionKind, Platform, WatchShape};

/// A file the planner expects to be materialized
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileSpec {
    /// Path relative to the project root or to the platform source directory
    pub path: String,

    /// Declaration the file must contain
    #[serde(
        default,
        alias = "typeName",
        alias = "type",
        skip_serializing_if = "Option::is_none"
    )]
    pub type_name: Option<String>,

    #[serde(default)]
    pub purpose: String,

    #[serde(default, deserialize_with = "string_or_list")]
    pub components: Vec<String>,

    #[serde(default, alias = "dataAccess", skip_serializing_if = "Option::is_none")]
    pub data_access: Option<String>,

    #[serde(
        default,
        alias = "dependsOn",
        alias = "dependencies",
        deserialize_with = "string_or_list"
    )]
    pub depends_on: Vec<String>,
}

impl FileSpec {
    /// Planned declaration, ignoring blank values
    pub fn expected_type(&self) -> Option<&str> {
        self.type_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelProperty {
    pub name: String,
    #[serde(rename = "type", alias = "typeName", default)]
    pub type_name: String,
    #[serde(default)]
    pub optional: bool,
}

/// Persistent model entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    /// Storage classification (e.g. "swiftdata", "userdefaults", "memory")
    #[serde(default)]
    pub storage: String,
    #[serde(default)]
    pub properties: Vec<ModelProperty>,
}

/// Privacy usage description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionSpec {
    /// Info.plist key, e.g. `NSCameraUsageDescription`
    pub key: String,
    #[serde(default, alias = "reason")]
    pub description: String,
}

/// Embedded extension request.
///
/// `kind` stays a raw string: an empty kind is tolerated and only an
/// unrecognized non-empty kind is rejected during validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionSpec {
    #[serde(default, alias = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub purpose: String,

    /// Build setting overrides
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub settings: BTreeMap<String, serde_json::Value>,

    #[serde(
        default,
        alias = "infoPlist",
        alias = "info",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub info_plist: BTreeMap<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub entitlements: BTreeMap<String, serde_json::Value>,
}

impl ExtensionSpec {
    pub fn kind(&self) -> Option<ExtensionKind> {
        ExtensionKind::from_hint(&self.kind)
    }

    /// Explicit target name, ignoring blank values
    pub fn explicit_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Approved third-party Swift package
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageSpec {
    pub name: String,
    pub url: String,
    /// Minimum version (`from:` requirement)
    #[serde(default, alias = "from", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Products linked into app targets; defaults to the package name
    #[serde(default, deserialize_with = "string_or_list")]
    pub products: Vec<String>,
    #[serde(default)]
    pub reason: String,
}

impl PackageSpec {
    pub fn linked_products(&self) -> Vec<&str> {
        if self.products.is_empty() {
            vec![self.name.as_str()]
        } else {
            self.products.iter().map(String::as_str).collect()
        }
    }
}

/// In-app purchase product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductSpec {
    #[serde(alias = "identifier", alias = "productId", alias = "product_id")]
    pub id: String,
    /// consumable, non_consumable, auto_renewable or non_renewing
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub price: Option<String>,
    /// ISO-8601-ish period for subscriptions ("P1M", "monthly", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, alias = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonetizationPlan {
    #[serde(default)]
    pub products: Vec<ProductSpec>,
    /// Entitlement name unlocked by subscriptions; also the subscription group name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entitlement: Option<String>,
    #[serde(default, alias = "freeCredits")]
    pub free_credits: u32,
}

/// Fully elaborated plan for one application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildPlan {
    pub platform: Platform,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<Platform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_family: Option<DeviceFamily>,
    #[serde(
        default,
        rename = "watch_project_shape",
        skip_serializing_if = "Option::is_none"
    )]
    pub watch_shape: Option<WatchShape>,
    #[serde(default)]
    pub files: Vec<FileSpec>,
    #[serde(default)]
    pub models: Vec<ModelSpec>,
    #[serde(default)]
    pub permissions: Vec<PermissionSpec>,
    #[serde(default)]
    pub extensions: Vec<ExtensionSpec>,
    #[serde(default)]
    pub localizations: Vec<String>,
    #[serde(default)]
    pub rule_keys: Vec<String>,
    #[serde(default)]
    pub build_order: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<PackageSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monetization: Option<MonetizationPlan>,
}

impl Default for BuildPlan {
    fn default() -> Self {
        Self {
            platform: Platform::Ios,
            platforms: Vec::new(),
            device_family: None,
            watch_shape: None,
            files: Vec::new(),
            models: Vec::new(),
            permissions: Vec::new(),
            extensions: Vec::new(),
            localizations: Vec::new(),
            rule_keys: Vec::new(),
            build_order: Vec::new(),
            design: None,
            packages: Vec::new(),
            monetization: None,
        }
    }
}

/// Wire shape accepted from the planner
#[derive(Debug, Default, Deserialize)]
struct RawPlan {
    #[serde(default)]
    platform: Option<serde_json::Value>,
    #[serde(default)]
    platforms: Option<serde_json::Value>,
    #[serde(default, alias = "deviceFamily")]
    device_family: Option<String>,
    #[serde(
        default,
        alias = "watchProjectShape",
        alias = "watch_shape",
        alias = "watchShape"
    )]
    watch_project_shape: Option<String>,
    #[serde(default)]
    files: Vec<FileSpec>,
    #[serde(default)]
    models: Vec<ModelSpec>,
    #[serde(default)]
    permissions: Vec<PermissionSpec>,
    #[serde(default)]
    extensions: Vec<ExtensionSpec>,
    #[serde(default, deserialize_with = "string_or_list")]
    localizations: Vec<String>,
    #[serde(default, alias = "ruleKeys", alias = "capabilities", deserialize_with = "string_or_list")]
    rule_keys: Vec<String>,
    #[serde(default, alias = "buildOrder", deserialize_with = "string_or_list")]
    build_order: Vec<String>,
    #[serde(default, alias = "designTokens", alias = "design_tokens")]
    design: Option<serde_json::Value>,
    #[serde(default)]
    packages: Vec<PackageSpec>,
    #[serde(default)]
    monetization: Option<MonetizationPlan>,
}

impl BuildPlan {
    /// Decode planner output.
    ///
    /// Syntax errors and structurally wrong sections are
    /// [`ForgeError::MalformedPlan`]; a watch shape outside the allowed
    /// literals is [`ForgeError::InvalidWatchShape`]. Unknown platforms and
    /// device families fall back to defaults with a warning.
    pub fn from_json(raw: &str) -> Result<Self> {
        let body = strip_code_fence(raw);
        let value: serde_json::Value =
            serde_json::from_str(body).map_err(|e| ForgeError::MalformedPlan {
                reason: e.to_string(),
            })?;
        if !value.is_object() {
            return Err(ForgeError::MalformedPlan {
                reason: "expected a JSON object".to_string(),
            });
        }
        let raw: RawPlan =
            serde_json::from_value(value).map_err(|e| ForgeError::MalformedPlan {
                reason: e.to_string(),
            })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawPlan) -> Result<Self> {
        let platforms = raw
            .platforms
            .as_ref()
            .map(crate::intent::coerce_platforms)
            .unwrap_or_default();
        let primary = raw.platform.as_ref().and_then(|value| {
            let platform = crate::intent::coerce_platform(value);
            if platform.is_none() && !value.is_null() {
                tracing::warn!(value = %value, "Unrecognized plan platform, defaulting to iOS");
            }
            platform
        });
        let platform = platforms
            .first()
            .copied()
            .or(primary)
            .unwrap_or(Platform::Ios);

        let device_family = match raw.device_family.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => DeviceFamily::from_hint(value).or_else(|| {
                tracing::warn!(value, "Unrecognized device family, defaulting to iphone");
                None
            }),
            _ => None,
        };

        let watch_shape = match raw.watch_project_shape.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => Some(WatchShape::from_hint(value).ok_or_else(
                || ForgeError::InvalidWatchShape {
                    value: value.to_string(),
                    allowed: WatchShape::allowed(),
                },
            )?),
            _ => None,
        };

        Ok(Self {
            platform,
            platforms,
            device_family,
            watch_shape,
            files: raw.files,
            models: raw.models,
            permissions: raw.permissions,
            extensions: raw.extensions,
            localizations: raw.localizations,
            rule_keys: raw.rule_keys,
            build_order: raw.build_order,
            design: raw.design,
            packages: raw.packages,
            monetization: raw.monetization,
        })
    }

    /// Every platform of the plan, primary first
    pub fn platform_set(&self) -> Vec<Platform> {
        if self.platforms.is_empty() {
            return vec![self.platform];
        }
        let mut set = vec![self.platform];
        for platform in &self.platforms {
            if !set.contains(platform) {
                set.push(*platform);
            }
        }
        set
    }

    pub fn is_multi_platform(&self) -> bool {
        self.platform_set().len() > 1
    }

    /// Effective watch project shape, `None` when the plan has no watchOS target.
    ///
    /// A plan that lists both iOS and watchOS is always paired.
    pub fn watch_pairing(&self) -> Option<WatchShape> {
        let set = self.platform_set();
        if !set.contains(&Platform::Watchos) {
            return None;
        }
        if set.contains(&Platform::Ios) {
            return Some(WatchShape::Paired);
        }
        Some(self.watch_shape.unwrap_or(WatchShape::Standalone))
    }

    /// Device family of the iOS app, defaulting to iPhone
    pub fn effective_device_family(&self) -> DeviceFamily {
        self.device_family.unwrap_or(DeviceFamily::Iphone)
    }

    /// Raw extension kinds, in plan order
    pub fn extension_kinds(&self) -> Vec<&str> {
        self.extensions.iter().map(|e| e.kind.as_str()).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lenient field decoders
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Accept `"a"`, `["a", "b"]` or `null`; blank entries are dropped.
fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(item)) => vec![item],
        Some(OneOrMany::Many(items)) => items,
    };
    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        match Option::<StringOrNumber>::deserialize(deserializer)? {
            None => None,
            Some(StringOrNumber::String(s)) if s.trim().is_empty() => None,
            Some(StringOrNumber::String(s)) => Some(s.trim().to_string()),
            Some(StringOrNumber::Number(n)) => Some(n.to_string()),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn components_accept_string_or_list() {
        let plan = BuildPlan::from_json(
            r#"{
                "platform": "ios",
                "files": [
                    {"path": "A.swift", "typeName": "A", "components": "List, Button", "dependsOn": "B.swift"},
                    {"path": "B.swift", "components": ["Text", " "], "depends_on": null}
                ]
            }"#,
        )
        .expect("plan should decode");
        assert_eq!(plan.files[0].components, vec!["List, Button"]);
        assert_eq!(plan.files[0].depends_on, vec!["B.swift"]);
        assert_eq!(plan.files[0].expected_type(), Some("A"));
        assert_eq!(plan.files[1].components, vec!["Text"]);
        assert!(plan.files[1].depends_on.is_empty());
    }

    #[test]
    fn unknown_platform_defaults_to_ios() {
        let plan = BuildPlan::from_json(r#"{"platform": "android"}"#).expect("plan");
        assert_eq!(plan.platform, Platform::Ios);
        let plan = BuildPlan::from_json("{}").expect("plan");
        assert_eq!(plan.platform, Platform::Ios);
    }

    #[test]
    fn platform_list_is_authoritative() {
        let plan =
            BuildPlan::from_json(r#"{"platform": "ios", "platforms": ["beos", "tvos", "ios"]}"#)
                .expect("plan");
        assert_eq!(plan.platform, Platform::Tvos);
        assert_eq!(plan.platform_set(), vec![Platform::Tvos, Platform::Ios]);
        assert!(plan.is_multi_platform());
    }

    #[test]
    fn invalid_watch_shape_is_semantic_error() {
        let err = BuildPlan::from_json(r#"{"platform": "watchos", "watch_project_shape": "wrist"}"#)
            .expect_err("shape must be rejected");
        match err {
            ForgeError::InvalidWatchShape { value, allowed } => {
                assert_eq!(value, "wrist");
                assert_eq!(allowed, vec!["watch_only", "paired_ios"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn watch_pairing_rules() {
        let mut plan = BuildPlan {
            platform: Platform::Watchos,
            ..Default::default()
        };
        assert_eq!(plan.watch_pairing(), Some(WatchShape::Standalone));

        plan.watch_shape = Some(WatchShape::Paired);
        assert_eq!(plan.watch_pairing(), Some(WatchShape::Paired));

        plan.watch_shape = None;
        plan.platforms = vec![Platform::Watchos, Platform::Ios];
        assert_eq!(plan.watch_pairing(), Some(WatchShape::Paired));

        plan.platform = Platform::Tvos;
        plan.platforms.clear();
        assert_eq!(plan.watch_pairing(), None);
    }

    #[test]
    fn syntax_and_shape_errors_are_malformed() {
        for raw in ["{", "[]", r#"{"files": 3}"#] {
            let err = BuildPlan::from_json(raw).expect_err("malformed");
            assert!(matches!(err, ForgeError::MalformedPlan { .. }), "{raw}: {err}");
        }
    }

    #[test]
    fn monetization_prices_accept_numbers() {
        let plan = BuildPlan::from_json(
            r#"{"monetization": {"products": [
                {"productId": "pro.monthly", "type": "auto_renewable", "price": 4.99, "duration": "P1M"},
                {"id": "coins", "type": "consumable", "price": "0.99"}
            ], "entitlement": "pro", "freeCredits": 3}}"#,
        )
        .expect("plan");
        let monetization = plan.monetization.expect("monetization");
        assert_eq!(monetization.products[0].price.as_deref(), Some("4.99"));
        assert_eq!(monetization.products[1].price.as_deref(), Some("0.99"));
        assert_eq!(monetization.free_credits, 3);
    }
}
