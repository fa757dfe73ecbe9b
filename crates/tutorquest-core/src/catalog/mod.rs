use serde::{Deserialize, Serialize};

/// Every subtopic carries exactly this many learning points.
pub const LEARNING_POINTS_PER_SUBTOPIC: usize = 4;

/// A subtopic and its ordered learning points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtopic {
    pub key: String,
    pub title: String,
    pub learning_points: [String; LEARNING_POINTS_PER_SUBTOPIC],
}

/// Top-level curriculum unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub key: String,
    pub title: String,
    pub description: String,
    pub starter_prompt: String,
    pub subtopics: Vec<Subtopic>,
}

/// Position of a subtopic in flattened catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubtopicRef<'a> {
    pub concept: &'a Concept,
    pub subtopic: &'a Subtopic,
}

/// Static concept → subtopic → learning-point tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub concepts: Vec<Concept>,
}

/// Errors from catalog loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog parse error: {0}")]
    ParseError(String),
    #[error("catalog has no concepts")]
    Empty,
    #[error("concept '{0}' has no subtopics")]
    EmptyConcept(String),
    #[error("duplicate key in catalog: {0}")]
    DuplicateKey(String),
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog =
            serde_json::from_str(json).map_err(|e| CatalogError::ParseError(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Reject catalogs the progress tracker cannot represent.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.concepts.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = std::collections::HashSet::new();
        for concept in &self.concepts {
            if concept.subtopics.is_empty() {
                return Err(CatalogError::EmptyConcept(concept.key.clone()));
            }
            if !seen.insert(concept.key.as_str()) {
                return Err(CatalogError::DuplicateKey(concept.key.clone()));
            }
            for sub in &concept.subtopics {
                if !seen.insert(sub.key.as_str()) {
                    return Err(CatalogError::DuplicateKey(sub.key.clone()));
                }
            }
        }
        Ok(())
    }

    pub fn concept(&self, key: &str) -> Option<&Concept> {
        self.concepts.iter().find(|c| c.key == key)
    }

    pub fn first_concept(&self) -> Option<&Concept> {
        self.concepts.first()
    }

    pub fn first_subtopic(&self) -> Option<SubtopicRef<'_>> {
        self.iter_subtopics().next()
    }

    /// All subtopics in catalog order, across concepts.
    pub fn iter_subtopics(&self) -> impl Iterator<Item = SubtopicRef<'_>> {
        self.concepts.iter().flat_map(|concept| {
            concept
                .subtopics
                .iter()
                .map(move |subtopic| SubtopicRef { concept, subtopic })
        })
    }

    pub fn subtopic(&self, key: &str) -> Option<SubtopicRef<'_>> {
        self.iter_subtopics().find(|s| s.subtopic.key == key)
    }

    /// The subtopic following `key` in catalog order, crossing concept boundaries.
    pub fn next_subtopic(&self, key: &str) -> Option<SubtopicRef<'_>> {
        let mut iter = self.iter_subtopics();
        iter.by_ref().find(|s| s.subtopic.key == key)?;
        iter.next()
    }

    /// The curriculum the tutor ships with: world history, networks of exchange (c. 1200–1450).
    pub fn builtin() -> Self {
        fn sub(key: &str, title: &str, points: [&str; LEARNING_POINTS_PER_SUBTOPIC]) -> Subtopic {
            Subtopic {
                key: key.to_string(),
                title: title.to_string(),
                learning_points: points.map(|p| p.to_string()),
            }
        }

        Self {
            concepts: vec![Concept {
                key: "networks_of_exchange".to_string(),
                title: "Networks of Exchange".to_string(),
                description: "How trade routes across Eurasia and Africa moved goods, people, \
                              ideas, and disease between 1200 and 1450."
                    .to_string(),
                starter_prompt: "Let's explore how long-distance trade connected the world \
                                 between 1200 and 1450. Where would you like to start?"
                    .to_string(),
                subtopics: vec![
                    sub(
                        "silk_roads",
                        "The Silk Roads",
                        [
                            "Luxury goods such as silk and porcelain travelled overland across Eurasia",
                            "Caravanserai and trading cities supported merchants along the routes",
                            "Paper money and banking innovations expanded commercial credit",
                            "Demand for luxury goods increased production in Chinese and Persian workshops",
                        ],
                    ),
                    sub(
                        "mongol_empire",
                        "The Mongol Empire and the Making of the Modern World",
                        [
                            "Mongol conquests created the largest contiguous land empire",
                            "Mongol rule protected trade routes and encouraged merchant travel",
                            "Technology and knowledge transferred between Persia, China, and Europe",
                            "The empire fragmented into khanates after succession disputes",
                        ],
                    ),
                    sub(
                        "indian_ocean",
                        "Exchange in the Indian Ocean",
                        [
                            "Monsoon winds shaped seasonal sailing schedules across the ocean",
                            "Improved shipbuilding and navigation technology such as the compass and lateen sail",
                            "Diasporic merchant communities settled in coastal trading cities",
                            "Swahili city-states and Malacca grew wealthy by controlling trade",
                        ],
                    ),
                    sub(
                        "trans_saharan",
                        "Trans-Saharan Trade Routes",
                        [
                            "Camel saddles and caravans made desert crossings practical",
                            "Gold from West Africa was exchanged for salt from the Sahara",
                            "Mali grew powerful by taxing trade through its territory",
                            "Mansa Musa's pilgrimage displayed Mali's wealth to the Islamic world",
                        ],
                    ),
                    sub(
                        "cultural_consequences",
                        "Cultural Consequences of Connectivity",
                        [
                            "Buddhism, Islam, and Christianity spread along trade networks",
                            "Travellers such as Ibn Battuta and Marco Polo recorded distant societies",
                            "Scientific and literary works were translated between cultures",
                            "Trading cities grew into diverse cultural and intellectual centres",
                        ],
                    ),
                    sub(
                        "environmental_consequences",
                        "Environmental Consequences of Connectivity",
                        [
                            "New crops such as bananas and champa rice spread to new regions",
                            "Champa rice supported population growth in southern China",
                            "The bubonic plague travelled along trade routes",
                            "Plague epidemics caused massive population decline in Afro-Eurasia",
                        ],
                    ),
                    sub(
                        "comparison_of_exchange",
                        "Comparison of Economic Exchange",
                        [
                            "Silk Roads and Indian Ocean trade differed in geography and transport",
                            "States drew revenue from taxing merchants and controlling routes",
                            "Trade networks expanded in scale because of state protection",
                            "Commercial growth fostered new cities and merchant classes",
                        ],
                    ),
                ],
            }],
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
