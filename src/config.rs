//! Configuration for the city catalog.
//!
//! Every field has a default, so an empty JSON object (`{}`) is a valid
//! configuration.
use serde::de::Error;

/// Catalog configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Radius used when a query carries no usable radius
    #[serde(default = "Config::default_radius_km")]
    pub default_radius_km: f64,

    /// Cap on the number of cities returned by a query or a search
    #[serde(default = "Config::default_max_results")]
    pub max_results: usize,

    /// Number of prefix index members fetched per scan round-trip
    #[serde(default = "Config::default_scan_batch_size")]
    pub scan_batch_size: usize,

    /// Number of valid keys expanded per prefix index write during indexing
    #[serde(default = "Config::default_index_batch_size")]
    pub index_batch_size: usize,

    /// Shortest input (in characters) a prefix search will act on
    #[serde(default = "Config::default_min_search_len")]
    pub min_search_len: usize,

    /// Marker appended to complete keys in the prefix index
    #[serde(default = "Config::default_terminal_sigil")]
    pub terminal_sigil: char,

    #[serde(default)]
    pub keys: IndexKeys,
}

/// Names of the store keys holding each index.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexKeys {
    /// Geo set: city key -> point
    #[serde(default = "IndexKeys::default_coords")]
    pub coords: String,

    /// Sorted set: city key -> population
    #[serde(default = "IndexKeys::default_pops")]
    pub pops: String,

    /// Sorted set of prefixes and terminal members, all scored 0
    #[serde(default = "IndexKeys::default_cities")]
    pub cities: String,

    /// Namespace for temporary and request-scoped keys
    #[serde(default = "IndexKeys::default_scratch")]
    pub scratch: String,
}

impl IndexKeys {
    fn default_coords() -> String {
        "coords".to_string()
    }

    fn default_pops() -> String {
        "pops".to_string()
    }

    fn default_cities() -> String {
        "cities".to_string()
    }

    fn default_scratch() -> String {
        "tmp".to_string()
    }

    /// Key of a temporary set in the scratch namespace.
    pub fn scratch_key(&self, name: &str) -> String {
        format!("{}:{}", self.scratch, name)
    }
}

impl Default for IndexKeys {
    fn default() -> Self {
        Self {
            coords: Self::default_coords(),
            pops: Self::default_pops(),
            cities: Self::default_cities(),
            scratch: Self::default_scratch(),
        }
    }
}

impl Config {
    const fn default_radius_km() -> f64 {
        50.0
    }

    const fn default_max_results() -> usize {
        200
    }

    const fn default_scan_batch_size() -> usize {
        50
    }

    const fn default_index_batch_size() -> usize {
        100
    }

    const fn default_min_search_len() -> usize {
        3
    }

    const fn default_terminal_sigil() -> char {
        '*'
    }

    pub fn with_default_radius_km(mut self, radius_km: f64) -> Self {
        self.default_radius_km = radius_km;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        assert!(max_results > 0, "Max results must be greater than zero");
        self.max_results = max_results;
        self
    }

    pub fn with_scan_batch_size(mut self, batch_size: usize) -> Self {
        assert!(batch_size > 0, "Scan batch size must be greater than zero");
        self.scan_batch_size = batch_size;
        self
    }

    pub fn with_index_batch_size(mut self, batch_size: usize) -> Self {
        assert!(batch_size > 0, "Index batch size must be greater than zero");
        self.index_batch_size = batch_size;
        self
    }

    pub fn with_min_search_len(mut self, len: usize) -> Self {
        self.min_search_len = len;
        self
    }

    pub fn with_terminal_sigil(mut self, sigil: char) -> Self {
        self.terminal_sigil = sigil;
        self
    }

    pub fn with_keys(mut self, keys: IndexKeys) -> Self {
        self.keys = keys;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.default_radius_km.is_finite() || self.default_radius_km <= 0.0 {
            return Err(format!(
                "Default radius must be a positive number of kilometers, got {}",
                self.default_radius_km
            ));
        }

        if self.max_results == 0 {
            return Err("Max results must be greater than zero".to_string());
        }

        if self.scan_batch_size == 0 {
            return Err("Scan batch size must be greater than zero".to_string());
        }

        if self.index_batch_size == 0 {
            return Err("Index batch size must be greater than zero".to_string());
        }

        let sigil = self.terminal_sigil;
        if sigil.is_alphanumeric() || sigil == '-' || sigil.is_whitespace() {
            return Err(format!(
                "Terminal sigil '{}' can appear inside city keys",
                sigil
            ));
        }

        let names = [
            &self.keys.coords,
            &self.keys.pops,
            &self.keys.cities,
            &self.keys.scratch,
        ];
        if names.iter().any(|name| name.is_empty()) {
            return Err("Index key names must not be empty".to_string());
        }
        for (i, a) in names.iter().enumerate() {
            if names[i + 1..].contains(a) {
                return Err(format!("Index key name '{}' is used twice", a));
            }
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_radius_km: Self::default_radius_km(),
            max_results: Self::default_max_results(),
            scan_batch_size: Self::default_scan_batch_size(),
            index_batch_size: Self::default_index_batch_size(),
            min_search_len: Self::default_min_search_len(),
            terminal_sigil: Self::default_terminal_sigil(),
            keys: IndexKeys::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_radius_km, 50.0);
        assert_eq!(config.max_results, 200);
        assert_eq!(config.scan_batch_size, 50);
        assert_eq!(config.min_search_len, 3);
        assert_eq!(config.terminal_sigil, '*');
        assert_eq!(config.keys.coords, "coords");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default()
            .with_max_results(20)
            .with_scan_batch_size(8)
            .with_terminal_sigil('$');

        let json = config.to_json().unwrap();
        let deserialized = Config::from_json(&json).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_config_empty_json_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        assert!(Config::from_json(r#"{"radius": 10}"#).is_err());
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().with_terminal_sigil('a').validate().is_err());
        assert!(Config::default().with_terminal_sigil('-').validate().is_err());
        assert!(
            Config::default()
                .with_default_radius_km(f64::NAN)
                .validate()
                .is_err()
        );

        let keys = IndexKeys {
            pops: "coords".to_string(),
            ..IndexKeys::default()
        };
        assert!(Config::default().with_keys(keys).validate().is_err());
    }

    #[test]
    fn test_scratch_key() {
        let keys = IndexKeys::default();
        assert_eq!(keys.scratch_key("cities"), "tmp:cities");
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_config_toml() {
        let config = Config::from_toml("max_results = 10\n[keys]\ncities = \"ac\"\n").unwrap();
        assert_eq!(config.max_results, 10);
        assert_eq!(config.keys.cities, "ac");
        assert_eq!(config.keys.coords, "coords");
    }
}
