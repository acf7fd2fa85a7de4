// Category -> search-term expansion. A plain category like "kitchen" has to
// surface both product suppliers and installation trades, so each known
// category maps to a small fixed set of directory search terms. The mapping
// is deterministic: same category in, same terms out.

static TERM_EXPANSIONS: &[(&str, &[&str])] = &[
    (
        "kitchen",
        &["kitchen units", "kitchen installation", "kitchen fitters"],
    ),
    (
        "bathroom",
        &["bathroom suites", "bathroom installation", "bathroom fitters"],
    ),
    (
        "window",
        &["double glazing", "window installation", "window fitters"],
    ),
    (
        "boiler",
        &["boiler supply", "boiler installation", "heating engineers"],
    ),
    (
        "flooring",
        &["flooring showroom", "flooring installation", "floor fitters"],
    ),
    (
        "driveway",
        &["driveway paving", "driveway installation", "driveway contractors"],
    ),
    (
        "garage door",
        &["garage doors", "garage door installation", "garage door repairs"],
    ),
    (
        "loft",
        &["loft conversion", "loft conversion specialists", "loft insulation"],
    ),
    (
        "solar",
        &["solar panels", "solar panel installation", "solar installers"],
    ),
    (
        "artificial grass",
        &["artificial grass", "artificial grass installation", "landscaping"],
    ),
];

const SERVICE_SUFFIXES: &[&str] = &[
    "installation",
    "installers",
    "installer",
    "fitters",
    "fitter",
    "fitting",
];

pub fn expand_search_terms(category: &str) -> Vec<String> {
    let cat = category.trim().to_lowercase();

    for (key, terms) in TERM_EXPANSIONS {
        if cat.contains(key) {
            return terms.iter().map(|t| t.to_string()).collect();
        }
    }

    // Unknown category that already names a service: keep it and add the
    // bare product so suppliers surface too.
    for suffix in SERVICE_SUFFIXES {
        if let Some(base) = cat.strip_suffix(suffix) {
            let base = base.trim();
            if !base.is_empty() {
                return vec![cat.clone(), base.to_string()];
            }
        }
    }

    // Bare product noun: add the service variants.
    vec![
        cat.clone(),
        format!("{} installation", cat),
        format!("{} fitting", cat),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_category_uses_static_mapping() {
        let terms = expand_search_terms("Kitchen");
        assert_eq!(
            terms,
            vec!["kitchen units", "kitchen installation", "kitchen fitters"]
        );
        // substring match: "fitted kitchens" hits the same entry
        assert_eq!(expand_search_terms("fitted kitchens"), terms);
    }

    #[test]
    fn bare_product_gains_service_variants() {
        assert_eq!(
            expand_search_terms("mouth guard"),
            vec![
                "mouth guard",
                "mouth guard installation",
                "mouth guard fitting"
            ]
        );
    }

    #[test]
    fn service_phrasing_is_stripped_to_base_product() {
        assert_eq!(
            expand_search_terms("awning installation"),
            vec!["awning installation", "awning"]
        );
        assert_eq!(
            expand_search_terms("blind fitters"),
            vec!["blind fitters", "blind"]
        );
    }

    #[test]
    fn expansion_is_deterministic() {
        assert_eq!(expand_search_terms("boiler"), expand_search_terms("boiler"));
    }
}
