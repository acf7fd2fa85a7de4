// Curated national chain suppliers, merged into every discovery result so a
// (category, location) pair still yields usable contacts when live directory
// search comes back sparse.

pub struct NationalSupplier {
    pub category_key: &'static str,
    pub name: &'static str,
    pub website: &'static str,
    pub phone: &'static str,
}

static NATIONAL_SUPPLIERS: &[NationalSupplier] = &[
    NationalSupplier {
        category_key: "kitchen",
        name: "Howdens",
        website: "https://www.howdens.com",
        phone: "0800 652 2453",
    },
    NationalSupplier {
        category_key: "kitchen",
        name: "Wren Kitchens",
        website: "https://www.wrenkitchens.com",
        phone: "0800 121 4060",
    },
    NationalSupplier {
        category_key: "kitchen",
        name: "Magnet",
        website: "https://www.magnet.co.uk",
        phone: "01325 744 344",
    },
    NationalSupplier {
        category_key: "bathroom",
        name: "Victorian Plumbing",
        website: "https://www.victorianplumbing.co.uk",
        phone: "0345 862 2878",
    },
    NationalSupplier {
        category_key: "bathroom",
        name: "Bathroom Village",
        website: "https://www.bathroomvillage.com",
        phone: "0800 046 1465",
    },
    NationalSupplier {
        category_key: "window",
        name: "Anglian Home Improvements",
        website: "https://www.anglianhome.co.uk",
        phone: "0800 028 5584",
    },
    NationalSupplier {
        category_key: "window",
        name: "Safestyle",
        website: "https://www.safestyle-windows.co.uk",
        phone: "0808 163 8095",
    },
    NationalSupplier {
        category_key: "boiler",
        name: "BOXT",
        website: "https://www.boxt.co.uk",
        phone: "0800 193 7777",
    },
    NationalSupplier {
        category_key: "boiler",
        name: "British Gas",
        website: "https://www.britishgas.co.uk",
        phone: "0333 202 9802",
    },
    NationalSupplier {
        category_key: "flooring",
        name: "Carpetright",
        website: "https://www.carpetright.co.uk",
        phone: "0330 333 3444",
    },
    NationalSupplier {
        category_key: "flooring",
        name: "Tapi Carpets",
        website: "https://www.tapi.co.uk",
        phone: "0330 094 5602",
    },
    NationalSupplier {
        category_key: "garage door",
        name: "Garolla",
        website: "https://www.garolla.co.uk",
        phone: "0800 468 1982",
    },
    NationalSupplier {
        category_key: "solar",
        name: "Project Solar UK",
        website: "https://www.projectsolaruk.com",
        phone: "0800 112 3110",
    },
    NationalSupplier {
        category_key: "artificial grass",
        name: "Easigrass",
        website: "https://www.easigrass.com",
        phone: "0800 096 8447",
    },
];

pub fn national_suppliers_for(category: &str) -> Vec<&'static NationalSupplier> {
    let cat = category.trim().to_lowercase();
    NATIONAL_SUPPLIERS
        .iter()
        .filter(|s| cat.contains(s.category_key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_match_on_category() {
        let names: Vec<_> = national_suppliers_for("fitted kitchens")
            .iter()
            .map(|s| s.name)
            .collect();
        assert!(names.contains(&"Howdens"));
        assert!(names.contains(&"Wren Kitchens"));
    }

    #[test]
    fn unknown_category_has_no_national_entries() {
        assert!(national_suppliers_for("mouth guard").is_empty());
    }
}
