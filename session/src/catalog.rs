/// The ordered list of sections a complete business plan is expected to
/// have. Used only to suggest what to write next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionCatalog {
    titles: Vec<String>,
}

pub const BUSINESS_PLAN_SECTIONS: &[&str] = &[
    "Executive Summary",
    "Problem",
    "Solution",
    "Target Market",
    "Competition",
    "Business Model",
    "Go-To-Market",
    "Operations",
    "Team",
    "Financial Plan",
    "Milestones",
    "Risks",
];

impl Default for SectionCatalog {
    fn default() -> Self {
        SectionCatalog::new(BUSINESS_PLAN_SECTIONS.iter().copied())
    }
}

impl SectionCatalog {
    pub fn new<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SectionCatalog {
            titles: titles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// First catalog title not among `present`.
    pub fn next_suggested<'a>(&'a self, present: &[String]) -> Option<&'a str> {
        self.missing(present).into_iter().next()
    }

    /// Catalog titles not among `present`, in catalog order.
    pub fn missing<'a>(&'a self, present: &[String]) -> Vec<&'a str> {
        self.titles
            .iter()
            .filter(|title| !present.contains(title))
            .map(String::as_str)
            .collect()
    }
}
