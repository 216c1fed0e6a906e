use shared::{Coordinate, Location};

/// Built-in search catalogue for the pilot region.
const CATALOGUE: [(&str, f64, f64); 10] = [
    ("Kigali Convention Centre", 30.0588, -1.9536),
    ("Kigali International Airport", 30.1319, -1.9686),
    ("Nyungwe Forest National Park", 29.2566, -2.5166),
    ("Lake Kivu", 29.2261, -2.0494),
    ("Volcanoes National Park", 29.6488, -1.4862),
    ("Akagera National Park", 30.7281, -1.9047),
    ("Butare", 29.7394, -2.6077),
    ("Gisenyi", 29.2573, -1.7021),
    ("Ruhengeri", 29.6366, -1.4996),
    ("Kibungo", 30.5427, -2.1597),
];

pub fn catalogue() -> Vec<Location> {
    CATALOGUE.iter().map(location).collect()
}

/// Case-insensitive substring search; a blank query suggests nothing.
pub fn search(query: &str) -> Vec<Location> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    CATALOGUE
        .iter()
        .filter(|(name, _, _)| name.to_lowercase().contains(&needle))
        .map(location)
        .collect()
}

fn location(&(name, lon, lat): &(&str, f64, f64)) -> Location {
    Location {
        name: name.to_string(),
        coord: Coordinate::new(lon, lat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_is_case_insensitive_substring() {
        let hits = search("kigali");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].name, "Kigali Convention Centre");

        assert_eq!(search("AIRPORT").len(), 1);
    }

    #[test]
    fn blank_query_suggests_nothing() {
        assert!(search("").is_empty());
        assert!(search("   ").is_empty());
    }

    #[test]
    fn unknown_query_suggests_nothing() {
        assert!(search("timbuktu").is_empty());
    }

    #[test]
    fn every_catalogue_entry_is_a_valid_coordinate() {
        for entry in catalogue() {
            assert!(entry.coord.is_valid(), "{} out of bounds", entry.name);
        }
    }
}
