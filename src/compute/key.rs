//! City key derivation.
//!
//! A key is `<name-fragment>-<region-code>` and identifies a city across
//! every index. The region code is taken verbatim from the source record, so
//! two datasets that spell a department differently ("2A" vs "2a") produce
//! different keys and the city never becomes valid.

/// Compose a city key from a normalized name fragment and a region code.
///
/// ```rust
/// use cityindex::compute::key::derive_key;
///
/// assert_eq!(derive_key("paris", "75"), "paris-75");
/// ```
pub fn derive_key(name_fragment: &str, region_code: &str) -> String {
    let mut key = String::with_capacity(name_fragment.len() + region_code.len() + 1);
    key.push_str(name_fragment);
    key.push('-');
    key.push_str(region_code);
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::normalize::{normalize_geo_name, normalize_population_name};

    #[test]
    fn test_derive_key() {
        assert_eq!(
            derive_key("boulogne-billancourt", "92"),
            "boulogne-billancourt-92"
        );
    }

    #[test]
    fn test_region_code_is_verbatim() {
        assert_eq!(derive_key("ajaccio", "2A"), "ajaccio-2A");
        assert_ne!(derive_key("ajaccio", "2A"), derive_key("ajaccio", "2a"));
    }

    #[test]
    fn test_datasets_converge_on_key() {
        let from_coords = derive_key(&normalize_geo_name("st denis"), "93");
        let from_pops = derive_key(&normalize_population_name("Saint-Denis"), "93");
        assert_eq!(from_coords, from_pops);
    }
}
