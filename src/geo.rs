// Approximate country centroids for the map charts, as (longitude, latitude)

const CENTROIDS: &[(&str, f64, f64)] = &[
    ("Argentina", -64.0, -34.0),
    ("Australia", 134.0, -25.0),
    ("Austria", 14.5, 47.5),
    ("Belgium", 4.5, 50.8),
    ("Brazil", -51.9, -14.2),
    ("Canada", -106.3, 56.1),
    ("Chile", -71.5, -35.7),
    ("China", 104.2, 35.9),
    ("Colombia", -74.3, 4.6),
    ("Croatia", 15.2, 45.1),
    ("Czech Republic", 15.5, 49.8),
    ("Denmark", 9.5, 56.3),
    ("Egypt", 30.8, 26.8),
    ("France", 2.2, 46.2),
    ("Germany", 10.5, 51.2),
    ("Greece", 21.8, 39.1),
    ("Hong Kong", 114.2, 22.3),
    ("India", 78.9, 20.6),
    ("Indonesia", 113.9, -0.8),
    ("Ireland", -8.2, 53.4),
    ("Israel", 34.9, 31.0),
    ("Italy", 12.6, 41.9),
    ("Japan", 138.3, 36.2),
    ("Mexico", -102.6, 23.6),
    ("Morocco", -7.1, 31.8),
    ("Netherlands", 5.3, 52.1),
    ("New Zealand", 174.9, -40.9),
    ("Norway", 8.5, 60.5),
    ("Peru", -75.0, -9.2),
    ("Poland", 19.1, 51.9),
    ("Portugal", -8.2, 39.4),
    ("Singapore", 103.8, 1.35),
    ("South Africa", 22.9, -30.6),
    ("South Korea", 127.8, 35.9),
    ("Spain", -3.7, 40.5),
    ("Sweden", 18.6, 60.1),
    ("Switzerland", 8.2, 46.8),
    ("Thailand", 100.9, 15.9),
    ("Turkey", 35.2, 39.0),
    ("United Arab Emirates", 53.8, 23.4),
    ("United Kingdom", -3.4, 55.4),
    ("United States", -95.7, 37.1),
    ("Vietnam", 108.3, 14.1),
];

/// Longitude/latitude of a country's approximate centre, matched
/// case-insensitively on its English name
pub fn country_centroid(name: &str) -> Option<(f64, f64)> {
    let name = name.trim();
    CENTROIDS
        .iter()
        .find(|(country, _, _)| country.eq_ignore_ascii_case(name))
        .map(|&(_, lon, lat)| (lon, lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_country() {
        assert_eq!(country_centroid("Portugal"), Some((-8.2, 39.4)));
        assert_eq!(country_centroid("  hong kong "), Some((114.2, 22.3)));
    }

    #[test]
    fn test_unknown_country() {
        assert_eq!(country_centroid("Atlantis"), None);
    }

    #[test]
    fn test_centroids_are_in_range() {
        for (name, lon, lat) in CENTROIDS {
            assert!((-180.0..=180.0).contains(lon), "{} longitude", name);
            assert!((-90.0..=90.0).contains(lat), "{} latitude", name);
        }
    }
}
