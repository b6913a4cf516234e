//! Static query catalog and theme lexicon.
//!
//! Both are pure data: categories, queries, and themes are lookup tables, so
//! adding one is a configuration change, not a code change. The built-in
//! defaults cover the standing ESG-in-real-estate monitoring brief and can be
//! overridden wholesale from the TOML config.

use serde::{Deserialize, Serialize};

use crate::types::Query;

// ---------------------------------------------------------------------------
// Query catalog
// ---------------------------------------------------------------------------

/// One catalog category with its ordered query list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCategory {
    /// Category name (e.g. `news`).
    pub name: String,
    /// Search queries, in declaration order.
    pub queries: Vec<String>,
}

/// The full category → queries table. Iteration order is declaration order,
/// which keeps collection runs deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryCatalog {
    pub categories: Vec<CatalogCategory>,
}

impl QueryCatalog {
    /// Flatten the catalog into tagged queries, category order first,
    /// query order within each category.
    pub fn queries(&self) -> Vec<Query> {
        self.categories
            .iter()
            .flat_map(|cat| {
                cat.queries
                    .iter()
                    .map(|q| Query::new(cat.name.clone(), q.clone()))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(|c| c.queries.is_empty())
    }

    /// Total number of queries across all categories.
    pub fn query_count(&self) -> usize {
        self.categories.iter().map(|c| c.queries.len()).sum()
    }
}

impl Default for QueryCatalog {
    fn default() -> Self {
        default_catalog()
    }
}

fn category(name: &str, queries: &[&str]) -> CatalogCategory {
    CatalogCategory {
        name: name.into(),
        queries: queries.iter().map(|q| (*q).to_string()).collect(),
    }
}

/// Built-in search catalog for the weekly monitoring brief.
pub fn default_catalog() -> QueryCatalog {
    QueryCatalog {
        categories: vec![
            category(
                "news",
                &[
                    "ESG real estate news",
                    "sustainable buildings news",
                    "net zero buildings real estate",
                    "green real estate investment",
                    "real estate carbon emissions",
                    "building decarbonization news",
                ],
            ),
            category(
                "regulatory",
                &[
                    "EU taxonomy real estate",
                    "CSRD real estate reporting",
                    "UK MEES regulations",
                    "SEC climate disclosure buildings",
                    "EPBD building directive",
                ],
            ),
            category(
                "research",
                &[
                    "GRESB real estate results",
                    "green building performance study",
                    "ESG property valuation research",
                    "green premium real estate study",
                ],
            ),
            category(
                "market",
                &[
                    "green bond real estate",
                    "sustainable REIT",
                    "PropTech sustainability",
                    "BREEAM LEED certification news",
                ],
            ),
        ],
    }
}

// ---------------------------------------------------------------------------
// Theme lexicon
// ---------------------------------------------------------------------------

/// One theme key with the keywords that signal it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeEntry {
    pub key: String,
    pub keywords: Vec<String>,
}

/// The fixed theme vocabulary used for classification and trend tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeLexicon {
    /// Theme entries, in declaration order.
    #[serde(default = "default_theme_entries")]
    pub entries: Vec<ThemeEntry>,

    /// Theme assigned when a classification falls outside the configured
    /// key set and no keyword matches either.
    #[serde(default = "default_fallback_theme")]
    pub fallback_theme: String,
}

impl ThemeLexicon {
    /// Whether `key` is one of the configured theme keys.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Configured theme keys, in declaration order.
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.key.as_str()).collect()
    }

    pub fn fallback(&self) -> &str {
        &self.fallback_theme
    }
}

impl Default for ThemeLexicon {
    fn default() -> Self {
        Self {
            entries: default_theme_entries(),
            fallback_theme: default_fallback_theme(),
        }
    }
}

fn default_fallback_theme() -> String {
    "social_governance".into()
}

fn theme(key: &str, keywords: &[&str]) -> ThemeEntry {
    ThemeEntry {
        key: key.into(),
        keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
    }
}

/// Built-in theme vocabulary.
fn default_theme_entries() -> Vec<ThemeEntry> {
    vec![
        theme(
            "carbon_emissions",
            &[
                "carbon",
                "emissions",
                "GHG",
                "greenhouse gas",
                "embodied carbon",
                "operational carbon",
                "net zero",
                "decarbonization",
                "decarbonisation",
            ],
        ),
        theme(
            "energy_efficiency",
            &[
                "energy efficiency",
                "energy performance",
                "EPC",
                "MEES",
                "heat pump",
                "insulation",
                "retrofit",
                "renewable energy",
                "solar",
            ],
        ),
        theme(
            "climate_risk",
            &[
                "climate risk",
                "physical risk",
                "transition risk",
                "stranded assets",
                "CRREM",
                "flood risk",
                "climate adaptation",
                "resilience",
            ],
        ),
        theme(
            "regulation_compliance",
            &[
                "regulation",
                "compliance",
                "taxonomy",
                "SFDR",
                "CSRD",
                "TCFD",
                "ISSB",
                "disclosure",
                "legislation",
            ],
        ),
        theme(
            "green_finance",
            &[
                "green bond",
                "sustainable finance",
                "ESG investing",
                "impact investing",
                "green loan",
                "sustainability-linked",
                "green premium",
                "brown discount",
            ],
        ),
        theme(
            "certification_ratings",
            &[
                "BREEAM",
                "LEED",
                "NABERS",
                "GRESB",
                "certification",
                "rating",
                "benchmark",
            ],
        ),
        theme(
            "proptech_innovation",
            &[
                "PropTech",
                "smart building",
                "IoT",
                "sensors",
                "digital twin",
                "building management",
                "automation",
            ],
        ),
        theme(
            "social_governance",
            &[
                "social impact",
                "tenant wellbeing",
                "community",
                "governance",
                "diversity",
                "stakeholder",
                "just transition",
            ],
        ),
    ]
}
