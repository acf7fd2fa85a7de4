// Relevance filtering for raw directory results. Free-text search on a
// category name returns plenty of false positives (a pharmacy chain matching
// a "mouth guard" search), so listings are screened against explicit
// category-tag allow/deny lists, plus a deny list of big-box retail names
// applied to equipment-style queries.

const ALLOWED_TAGS: &[&str] = &[
    "home_goods_store",
    "hardware_store",
    "home_improvement_store",
    "furniture_store",
    "flooring_store",
    "garage_door_supplier",
    "general_contractor",
    "plumber",
    "electrician",
    "roofing_contractor",
    "glazier",
    "painter",
    "landscaping",
    "landscaping_service",
    "solar_energy_company",
    "solar_energy_equipment_supplier",
    "construction_company",
    "kitchen_remodeler",
    "bathroom_remodeler",
];

const DENIED_TAGS: &[&str] = &[
    "pharmacy",
    "drugstore",
    "supermarket",
    "grocery_or_supermarket",
    "convenience_store",
    "department_store",
    "gas_station",
    "restaurant",
    "cafe",
    "bar",
    "lodging",
    "clothing_store",
];

const BIG_BOX_NAMES: &[&str] = &[
    "boots",
    "superdrug",
    "tesco",
    "asda",
    "sainsbury",
    "morrisons",
    "aldi",
    "lidl",
    "argos",
    "amazon",
    "poundland",
    "wilko",
];

const SERVICE_WORDS: &[&str] = &[
    "installation",
    "installer",
    "fitting",
    "fitter",
    "conversion",
    "repair",
    "engineer",
];

/// A query for a product (no service word in the category) pulls in generic
/// retail; those get the big-box name screen on top of the tag lists.
pub fn is_equipment_query(category: &str) -> bool {
    let cat = category.to_lowercase();
    !SERVICE_WORDS.iter().any(|w| cat.contains(w))
}

pub fn is_relevant(name: &str, tags: &[String], category: &str) -> bool {
    let tags_lower: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();

    if tags_lower
        .iter()
        .any(|t| DENIED_TAGS.contains(&t.as_str()))
    {
        return false;
    }

    // A tagged listing must carry at least one tag we recognise as trade or
    // home-improvement retail. Untagged listings (curated suppliers) pass.
    if !tags_lower.is_empty()
        && !tags_lower
            .iter()
            .any(|t| ALLOWED_TAGS.contains(&t.as_str()))
    {
        return false;
    }

    if is_equipment_query(category) {
        let name_lower = name.to_lowercase();
        if BIG_BOX_NAMES.iter().any(|b| name_lower.contains(b)) {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn pharmacy_is_filtered_from_equipment_search() {
        assert!(!is_relevant(
            "Boots",
            &tags(&["pharmacy", "health"]),
            "mouth guard"
        ));
    }

    #[test]
    fn big_box_retail_is_filtered_for_equipment_queries() {
        assert!(!is_relevant("Argos Manchester", &tags(&[]), "mouth guard"));
        // but not for service queries, where the name collision is harmless
        assert!(is_relevant(
            "Argon Boiler Installation",
            &tags(&["general_contractor"]),
            "boiler installation"
        ));
    }

    #[test]
    fn trade_tags_pass() {
        assert!(is_relevant(
            "Leeds Kitchen Fitters",
            &tags(&["general_contractor", "point_of_interest"]),
            "kitchen"
        ));
        assert!(is_relevant(
            "City Plumbing Supplies",
            &tags(&["hardware_store"]),
            "boiler"
        ));
    }

    #[test]
    fn tagged_listing_without_any_allowed_tag_is_dropped() {
        assert!(!is_relevant(
            "Glow Beauty Salon",
            &tags(&["beauty_salon", "point_of_interest"]),
            "kitchen"
        ));
    }

    #[test]
    fn untagged_listing_passes_tag_screen() {
        assert!(is_relevant("Howdens", &[], "kitchen"));
    }
}
