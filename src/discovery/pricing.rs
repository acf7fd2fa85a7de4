// Rules-table price estimation. Classification (what kind of business is
// this?) is kept separate from pricing policy (what does that kind charge
// for this category?); an ambiguous classification yields Unknown rather
// than a fabricated number.

use crate::models::PriceEstimate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusinessClass {
    Supplier,
    Installer,
    Unknown,
}

const SUPPLIER_TAGS: &[&str] = &[
    "home_goods_store",
    "hardware_store",
    "home_improvement_store",
    "furniture_store",
    "flooring_store",
    "garage_door_supplier",
    "solar_energy_equipment_supplier",
];

const INSTALLER_TAGS: &[&str] = &[
    "general_contractor",
    "plumber",
    "electrician",
    "roofing_contractor",
    "glazier",
    "painter",
    "landscaping",
    "landscaping_service",
    "construction_company",
    "kitchen_remodeler",
    "bathroom_remodeler",
    "solar_energy_company",
];

/// Tag-based classification. A listing matching both sides (a showroom that
/// also installs) is a low-confidence match and stays Unknown.
pub fn classify(tags: &[String]) -> BusinessClass {
    let tags_lower: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
    let supplier = tags_lower
        .iter()
        .any(|t| SUPPLIER_TAGS.contains(&t.as_str()));
    let installer = tags_lower
        .iter()
        .any(|t| INSTALLER_TAGS.contains(&t.as_str()));

    match (supplier, installer) {
        (true, false) => BusinessClass::Supplier,
        (false, true) => BusinessClass::Installer,
        _ => BusinessClass::Unknown,
    }
}

// (category key, class, low, high) in GBP for a typical job.
const PRICE_RULES: &[(&str, BusinessClass, u32, u32)] = &[
    ("kitchen", BusinessClass::Supplier, 3000, 12000),
    ("kitchen", BusinessClass::Installer, 4500, 16000),
    ("bathroom", BusinessClass::Supplier, 2000, 7000),
    ("bathroom", BusinessClass::Installer, 3500, 10000),
    ("window", BusinessClass::Supplier, 400, 1200),
    ("window", BusinessClass::Installer, 2500, 9000),
    ("boiler", BusinessClass::Supplier, 900, 2500),
    ("boiler", BusinessClass::Installer, 1800, 4000),
    ("flooring", BusinessClass::Supplier, 600, 2500),
    ("flooring", BusinessClass::Installer, 900, 3500),
    ("driveway", BusinessClass::Installer, 3000, 9000),
    ("garage door", BusinessClass::Supplier, 600, 1800),
    ("garage door", BusinessClass::Installer, 900, 2800),
    ("loft", BusinessClass::Installer, 20000, 45000),
    ("solar", BusinessClass::Supplier, 2500, 6000),
    ("solar", BusinessClass::Installer, 5000, 11000),
    ("artificial grass", BusinessClass::Supplier, 400, 1500),
    ("artificial grass", BusinessClass::Installer, 1200, 4000),
];

pub fn estimate(category: &str, class: BusinessClass) -> PriceEstimate {
    if class == BusinessClass::Unknown {
        return PriceEstimate::Unknown;
    }

    let cat = category.trim().to_lowercase();
    for (key, rule_class, low, high) in PRICE_RULES {
        if *rule_class == class && cat.contains(key) {
            return PriceEstimate::Range {
                low: *low,
                high: *high,
            };
        }
    }

    PriceEstimate::Unknown
}
