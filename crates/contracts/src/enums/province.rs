/// Provinces offered by the filter bar. Filters store the plain name.
pub struct Province;

const PROVINCES: &[&str] = &[
    "Agadir-Ida-Ou-Tanane",
    "Casablanca",
    "Fès",
    "Kénitra",
    "Marrakech",
    "Meknès",
    "Oujda-Angad",
    "Rabat",
    "Salé",
    "Tanger-Assilah",
    "Tétouan",
];

impl Province {
    pub fn all() -> &'static [&'static str] {
        PROVINCES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_lookup() {
        assert!(Province::all().contains(&"Rabat"));
        assert!(Province::all().windows(2).all(|w| w[0] < w[1]));
    }
}
