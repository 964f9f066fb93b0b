use serde::{Deserialize, Serialize};

/// Colour used for companies without a configured brand colour.
pub const DEFAULT_COMPANY_COLOR: &str = "#333333";

/// A company whose search feed is polled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

impl Company {
    pub fn new(name: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            color: Some(color.to_string()),
        }
    }

    pub fn color(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_COMPANY_COLOR)
    }
}

/// Configuration for the news aggregator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    /// Companies to poll, in priority order for link deduplication
    pub companies: Vec<Company>,

    /// Maximum articles kept per company (default: 6)
    pub max_per_company: usize,

    /// Summaries longer than this many characters are truncated (default: 300)
    pub summary_limit: usize,

    /// Concurrent feed requests (default: 4)
    pub workers: usize,

    /// RSS search endpoint
    pub feed_base_url: String,

    /// Appended to the company name to form the search query
    pub query_suffix: String,

    /// Extra query parameters sent with every search
    pub locale_params: Vec<(String, String)>,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            companies: vec![
                Company::new("Pfizer", "#0093D0"),
                Company::new("Novartis", "#EC0016"),
                Company::new("Sanofi", "#7B2D8B"),
                Company::new("Takeda", "#E4002B"),
                Company::new("Merck", "#009B77"),
                Company::new("Bayer", "#10A0E3"),
                Company::new("AbbVie", "#071D49"),
                Company::new("Bristol Myers Squibb", "#003865"),
                Company::new("Johnson & Johnson", "#CC0000"),
                Company::new("Roche", "#0066CC"),
                Company::new("Eli Lilly", "#D52B1E"),
                Company::new("AstraZeneca", "#830051"),
                Company::new("Amgen", "#002A5C"),
            ],
            max_per_company: 6,
            summary_limit: 300,
            workers: 4,
            feed_base_url: "https://news.google.com/rss/search".to_string(),
            query_suffix: "pharmaceutical drug".to_string(),
            locale_params: vec![
                ("hl".to_string(), "en-US".to_string()),
                ("gl".to_string(), "US".to_string()),
                ("ceid".to_string(), "US:en".to_string()),
            ],
        }
    }
}

impl NewsConfig {
    pub fn company(&self, name: &str) -> Option<&Company> {
        self.companies.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = NewsConfig::default();
        assert_eq!(config.companies.len(), 13);
        assert_eq!(config.max_per_company, 6);
        assert_eq!(config.summary_limit, 300);
        assert_eq!(config.company("Pfizer").unwrap().color(), "#0093D0");
        assert!(config.company("Moderna").is_none());
    }

    #[test]
    fn test_company_without_color_uses_default() {
        let company: Company = toml::from_str(r#"name = "Moderna""#).unwrap();
        assert_eq!(company.color(), DEFAULT_COMPANY_COLOR);
    }
}
