//! Built-in entitlement and info defaults per rule key.

use crate::descriptor::property::{PropertyMap, PropertyValue, set_path};

/// Properties a rule key contributes to an application target
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapabilityDefaults {
    pub entitlements: PropertyMap,
    pub info: PropertyMap,
}

fn fold_key(key: &str) -> String {
    key.trim()
        .chars()
        .map(|c| if c == '_' || c == ' ' { '-' } else { c })
        .flat_map(char::to_lowercase)
        .collect()
}

/// Defaults for a rule key on an application with `bundle_id`.
///
/// Returns `None` for keys that need no project-level configuration
/// (most keys only influence generated code).
pub fn capability_defaults(key: &str, bundle_id: &str) -> Option<CapabilityDefaults> {
    let mut defaults = CapabilityDefaults::default();
    let ent = &mut defaults.entitlements;

    match fold_key(key).as_str() {
        "push-notifications" | "notifications" | "push" | "remote-notifications" => {
            ent.insert("aps-environment".into(), "development".into());
        }
        "icloud" | "cloudkit" => {
            ent.insert(
                "com.apple.developer.icloud-services".into(),
                vec!["CloudKit"].into(),
            );
            ent.insert(
                "com.apple.developer.icloud-container-identifiers".into(),
                vec![format!("iCloud.{bundle_id}")].into(),
            );
        }
        "healthkit" | "health" => {
            ent.insert("com.apple.developer.healthkit".into(), true.into());
            ent.insert(
                "com.apple.developer.healthkit.access".into(),
                PropertyValue::List(Vec::new()),
            );
        }
        "sign-in-with-apple" | "apple-sign-in" | "siwa" => {
            ent.insert(
                "com.apple.developer.applesignin".into(),
                vec!["Default"].into(),
            );
        }
        "apple-pay" => {
            ent.insert(
                "com.apple.developer.in-app-payments".into(),
                vec![format!("merchant.{bundle_id}")].into(),
            );
        }
        "siri" => {
            ent.insert("com.apple.developer.siri".into(), true.into());
        }
        "game-center" | "gamekit" => {
            ent.insert("com.apple.developer.game-center".into(), true.into());
        }
        "nfc" => {
            ent.insert(
                "com.apple.developer.nfc.readersession.formats".into(),
                vec!["TAG"].into(),
            );
        }
        "background-audio" | "audio-background" => {
            set_path(&mut defaults.info, &["UIBackgroundModes"], vec!["audio"].into());
        }
        _ => return None,
    }

    Some(defaults)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icloud_container_derives_from_bundle_id() {
        let defaults = capability_defaults("iCloud", "com.acme.notes").expect("icloud defaults");
        assert_eq!(
            defaults.entitlements["com.apple.developer.icloud-container-identifiers"],
            PropertyValue::from(vec!["iCloud.com.acme.notes"])
        );
    }

    #[test]
    fn aliases_fold_separators() {
        assert!(capability_defaults("Sign_In_With_Apple", "a.b").is_some());
        assert!(capability_defaults("push notifications", "a.b").is_some());
    }

    #[test]
    fn background_audio_sets_info_only() {
        let defaults = capability_defaults("background-audio", "a.b").expect("defaults");
        assert!(defaults.entitlements.is_empty());
        assert!(defaults.info.contains_key("UIBackgroundModes"));
    }

    #[test]
    fn code_only_keys_have_no_defaults() {
        assert_eq!(capability_defaults("charts", "a.b"), None);
        assert_eq!(capability_defaults("haptics", "a.b"), None);
    }
}
