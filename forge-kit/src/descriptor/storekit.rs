//! StoreKit testing configuration for planned in-app purchases.
//!
//! Output is a `.storekit` JSON document. Internal identifiers are derived
//! from product positions so the same plan always renders the same bytes.

use serde::Serialize;

use crate::error::{ForgeError, Result};
use crate::plan::{MonetizationPlan, ProductSpec};
use crate::types::fold_hint;

pub const STOREKIT_FILE_NAME: &str = "Configuration.storekit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductKind {
    Consumable,
    NonConsumable,
    AutoRenewable,
    NonRenewing,
}

impl ProductKind {
    /// Classify a planner product type. Unknown types are subscriptions when
    /// a duration is present, otherwise non-consumables.
    pub fn classify(product: &ProductSpec) -> Self {
        match fold_hint(&product.kind).as_str() {
            "consumable" | "credits" | "credit" => Self::Consumable,
            "nonconsumable" | "lifetime" | "onetime" | "unlock" => Self::NonConsumable,
            "autorenewable" | "autorenewing" | "subscription" | "recurring" => Self::AutoRenewable,
            "nonrenewing" | "nonrenewable" => Self::NonRenewing,
            _ if product.duration.is_some() => Self::AutoRenewable,
            _ => Self::NonConsumable,
        }
    }

    fn storekit_type(&self) -> &'static str {
        match self {
            Self::Consumable => "Consumable",
            Self::NonConsumable => "NonConsumable",
            Self::AutoRenewable => "RecurringSubscription",
            Self::NonRenewing => "NonRenewingSubscription",
        }
    }
}

/// Normalize a subscription period to ISO-8601 (`P1W`, `P1M`, `P1Y`, ...)
pub fn subscription_period(duration: Option<&str>) -> String {
    let Some(raw) = duration.map(str::trim).filter(|d| !d.is_empty()) else {
        return "P1M".to_string();
    };
    let upper = raw.to_ascii_uppercase();
    if upper.starts_with('P') && upper[1..].starts_with(|c: char| c.is_ascii_digit()) {
        return upper;
    }
    match fold_hint(raw).as_str() {
        "weekly" | "week" | "1week" => "P1W",
        "monthly" | "month" | "1month" => "P1M",
        "2months" | "bimonthly" => "P2M",
        "quarterly" | "3months" => "P3M",
        "6months" | "semiannual" | "halfyear" => "P6M",
        "yearly" | "annual" | "annually" | "year" | "1year" => "P1Y",
        _ => "P1M",
    }
    .to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Localization {
    description: String,
    display_name: String,
    locale: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Product {
    display_price: String,
    family_shareable: bool,
    #[serde(rename = "internalID")]
    internal_id: String,
    localizations: Vec<Localization>,
    #[serde(rename = "productID")]
    product_id: String,
    reference_name: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Subscription {
    #[serde(flatten)]
    product: Product,
    group_number: u32,
    recurring_subscription_period: String,
    #[serde(rename = "subscriptionGroupID")]
    subscription_group_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionGroup {
    id: String,
    localizations: Vec<Localization>,
    name: String,
    subscriptions: Vec<Subscription>,
}

#[derive(Debug, Serialize)]
struct Version {
    major: u32,
    minor: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoreKitDocument {
    identifier: String,
    non_renewing_subscriptions: Vec<Product>,
    products: Vec<Product>,
    settings: serde_json::Map<String, serde_json::Value>,
    subscription_groups: Vec<SubscriptionGroup>,
    version: Version,
}

fn internal_id(index: usize) -> String {
    format!("{:08}", index + 1)
}

fn product(index: usize, spec: &ProductSpec, kind: ProductKind) -> Product {
    let name = spec
        .display_name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| spec.id.clone());
    Product {
        display_price: spec.price.clone().unwrap_or_else(|| "0.99".to_string()),
        family_shareable: false,
        internal_id: internal_id(index),
        localizations: vec![Localization {
            description: name.clone(),
            display_name: name.clone(),
            locale: "en_US",
        }],
        product_id: spec.id.clone(),
        reference_name: name,
        kind: kind.storekit_type(),
    }
}

/// Whether the plan has anything to put in a StoreKit configuration
pub fn has_products(monetization: Option<&MonetizationPlan>) -> bool {
    monetization.is_some_and(|m| m.products.iter().any(|p| !p.id.trim().is_empty()))
}

/// Render the StoreKit configuration for `app_name`.
///
/// Auto-renewable products share one subscription group named after the
/// plan's entitlement (or `<app> Pro`).
pub fn render_storekit(app_name: &str, monetization: &MonetizationPlan) -> Result<String> {
    let group_name = monetization
        .entitlement
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| format!("{app_name} Pro"));
    let group_id = internal_id(10_000);

    let mut products = Vec::new();
    let mut non_renewing = Vec::new();
    let mut subscriptions = Vec::new();

    for (index, spec) in monetization
        .products
        .iter()
        .filter(|p| !p.id.trim().is_empty())
        .enumerate()
    {
        let kind = ProductKind::classify(spec);
        let item = product(index, spec, kind);
        match kind {
            ProductKind::Consumable | ProductKind::NonConsumable => products.push(item),
            ProductKind::NonRenewing => non_renewing.push(item),
            ProductKind::AutoRenewable => {
                let group_number = u32::try_from(subscriptions.len() + 1).unwrap_or(u32::MAX);
                subscriptions.push(Subscription {
                    product: item,
                    group_number,
                    recurring_subscription_period: subscription_period(spec.duration.as_deref()),
                    subscription_group_id: group_id.clone(),
                });
            }
        }
    }

    let subscription_groups = if subscriptions.is_empty() {
        Vec::new()
    } else {
        vec![SubscriptionGroup {
            id: group_id,
            localizations: Vec::new(),
            name: group_name,
            subscriptions,
        }]
    };

    let document = StoreKitDocument {
        identifier: format!("{app_name}StoreKit"),
        non_renewing_subscriptions: non_renewing,
        products,
        settings: serde_json::Map::new(),
        subscription_groups,
        version: Version { major: 3, minor: 0 },
    };

    serde_json::to_string_pretty(&document).map_err(|source| ForgeError::JsonSerialize { source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: &str, kind: &str, duration: Option<&str>) -> ProductSpec {
        ProductSpec {
            id: id.to_string(),
            kind: kind.to_string(),
            price: Some("4.99".to_string()),
            duration: duration.map(str::to_string),
            display_name: None,
        }
    }

    #[test]
    fn classifies_products() {
        assert_eq!(
            ProductKind::classify(&spec("a", "consumable", None)),
            ProductKind::Consumable
        );
        assert_eq!(
            ProductKind::classify(&spec("a", "auto-renewable", None)),
            ProductKind::AutoRenewable
        );
        assert_eq!(
            ProductKind::classify(&spec("a", "mystery", Some("monthly"))),
            ProductKind::AutoRenewable
        );
        assert_eq!(
            ProductKind::classify(&spec("a", "", None)),
            ProductKind::NonConsumable
        );
    }

    #[test]
    fn periods_normalize() {
        assert_eq!(subscription_period(Some("yearly")), "P1Y");
        assert_eq!(subscription_period(Some("p1w")), "P1W");
        assert_eq!(subscription_period(None), "P1M");
    }

    #[test]
    fn groups_subscriptions_under_entitlement() {
        let plan = MonetizationPlan {
            products: vec![
                spec("pro.monthly", "auto_renewable", Some("P1M")),
                spec("pro.yearly", "auto_renewable", Some("yearly")),
                spec("coins", "consumable", None),
            ],
            entitlement: Some("pro".to_string()),
            free_credits: 0,
        };
        let rendered = render_storekit("Notes", &plan).expect("storekit renders");
        let value: serde_json::Value = serde_json::from_str(&rendered).expect("valid json");
        assert_eq!(value["subscriptionGroups"][0]["name"], "pro");
        assert_eq!(
            value["subscriptionGroups"][0]["subscriptions"][1]["recurringSubscriptionPeriod"],
            "P1Y"
        );
        assert_eq!(value["products"][0]["productID"], "coins");
        assert_eq!(rendered, render_storekit("Notes", &plan).expect("stable"));
    }
}
