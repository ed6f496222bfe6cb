//! Built-in properties per extension kind.

use super::model::TargetType;
use super::property::{PropertyMap, PropertyValue, append_unique, set_path};
use crate::types::ExtensionKind;

pub const APP_GROUPS_KEY: &str = "com.apple.security.application-groups";

const EXTENSION_POINT: &[&str] = &["NSExtension", "NSExtensionPointIdentifier"];
const PRINCIPAL_CLASS: &[&str] = &["NSExtension", "NSExtensionPrincipalClass"];

/// Defaults contributed by one extension to itself and to its host
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionDefaults {
    pub target_type: TargetType,
    pub info: PropertyMap,
    pub entitlements: PropertyMap,
    pub host_info: PropertyMap,
    pub host_entitlements: PropertyMap,
}

/// Bundle identifier token for a kind
pub fn kind_token(kind: ExtensionKind) -> &'static str {
    match kind {
        ExtensionKind::Widget => "widget",
        ExtensionKind::LiveActivity => "liveactivity",
        ExtensionKind::Share => "share",
        ExtensionKind::NotificationService => "notificationservice",
        ExtensionKind::Safari => "safari",
        ExtensionKind::AppClip => "clip",
    }
}

/// App group shared between a host and its extensions
pub fn app_group_id(host_bundle_id: &str) -> String {
    format!("group.{host_bundle_id}")
}

/// Defaults for an extension of `kind` (unknown or empty kinds get a plain
/// app extension without properties).
pub fn extension_defaults(
    kind: Option<ExtensionKind>,
    host_bundle_id: &str,
    bundle_id: &str,
) -> ExtensionDefaults {
    let mut defaults = ExtensionDefaults {
        target_type: TargetType::AppExtension,
        info: PropertyMap::new(),
        entitlements: PropertyMap::new(),
        host_info: PropertyMap::new(),
        host_entitlements: PropertyMap::new(),
    };

    let Some(kind) = kind else {
        return defaults;
    };

    match kind {
        ExtensionKind::Widget => {
            set_path(&mut defaults.info, EXTENSION_POINT, "com.apple.widgetkit-extension".into());
        }
        ExtensionKind::LiveActivity => {
            set_path(&mut defaults.info, EXTENSION_POINT, "com.apple.widgetkit-extension".into());
            defaults
                .host_info
                .insert("NSSupportsLiveActivities".into(), true.into());
        }
        ExtensionKind::Share => {
            set_path(&mut defaults.info, EXTENSION_POINT, "com.apple.share-services".into());
            set_path(
                &mut defaults.info,
                PRINCIPAL_CLASS,
                "$(PRODUCT_MODULE_NAME).ShareViewController".into(),
            );
            let mut rule = PropertyMap::new();
            rule.insert("NSExtensionActivationSupportsText".into(), true.into());
            rule.insert(
                "NSExtensionActivationSupportsWebURLWithMaxCount".into(),
                PropertyValue::Integer(1),
            );
            rule.insert(
                "NSExtensionActivationSupportsImageWithMaxCount".into(),
                PropertyValue::Integer(1),
            );
            set_path(
                &mut defaults.info,
                &["NSExtension", "NSExtensionAttributes", "NSExtensionActivationRule"],
                rule.into(),
            );
        }
        ExtensionKind::NotificationService => {
            set_path(
                &mut defaults.info,
                EXTENSION_POINT,
                "com.apple.usernotifications.service".into(),
            );
            set_path(
                &mut defaults.info,
                PRINCIPAL_CLASS,
                "$(PRODUCT_MODULE_NAME).NotificationService".into(),
            );
        }
        ExtensionKind::Safari => {
            set_path(&mut defaults.info, EXTENSION_POINT, "com.apple.Safari.web-extension".into());
            set_path(
                &mut defaults.info,
                PRINCIPAL_CLASS,
                "$(PRODUCT_MODULE_NAME).SafariWebExtensionHandler".into(),
            );
        }
        ExtensionKind::AppClip => {
            defaults.target_type = TargetType::AppClip;
            let mut clip = PropertyMap::new();
            clip.insert("NSAppClipRequestEphemeralUserNotification".into(), false.into());
            clip.insert("NSAppClipRequestLocationConfirmation".into(), false.into());
            defaults.info.insert("NSAppClip".into(), clip.into());
            append_unique(
                &mut defaults.entitlements,
                "com.apple.developer.parent-application-identifiers",
                &format!("$(AppIdentifierPrefix){host_bundle_id}"),
            );
            append_unique(
                &mut defaults.host_entitlements,
                "com.apple.developer.associated-appclip-app-identifiers",
                &format!("$(AppIdentifierPrefix){bundle_id}"),
            );
        }
    }

    if kind.needs_app_group() {
        let group = app_group_id(host_bundle_id);
        append_unique(&mut defaults.entitlements, APP_GROUPS_KEY, &group);
        append_unique(&mut defaults.host_entitlements, APP_GROUPS_KEY, &group);
    }

    defaults
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn widget_needs_extension_point_and_group() {
        let defaults = extension_defaults(
            Some(ExtensionKind::Widget),
            "com.a.notes",
            "com.a.notes.widget",
        );
        let ext = defaults.info["NSExtension"].as_map().expect("NSExtension");
        assert_eq!(
            ext["NSExtensionPointIdentifier"],
            PropertyValue::from("com.apple.widgetkit-extension")
        );
        assert_eq!(
            defaults.entitlements[APP_GROUPS_KEY],
            PropertyValue::from(vec!["group.com.a.notes"])
        );
        assert_eq!(defaults.host_entitlements, defaults.entitlements);
    }

    #[test]
    fn app_clip_links_both_directions() {
        let defaults = extension_defaults(
            Some(ExtensionKind::AppClip),
            "com.a.shop",
            "com.a.shop.clip",
        );
        assert_eq!(defaults.target_type, TargetType::AppClip);
        assert!(
            defaults
                .host_entitlements
                .contains_key("com.apple.developer.associated-appclip-app-identifiers")
        );
        assert!(!defaults.entitlements.contains_key(APP_GROUPS_KEY));
    }

    #[test]
    fn unknown_kind_is_plain_extension() {
        let defaults = extension_defaults(None, "com.a.b", "com.a.b.x");
        assert_eq!(defaults.target_type, TargetType::AppExtension);
        assert!(defaults.info.is_empty());
        assert!(defaults.host_entitlements.is_empty());
    }
}
