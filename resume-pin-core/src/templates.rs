use serde::Serialize;

/// Template assumed when a deployment does not name one.
pub const DEFAULT_TEMPLATE_ID: &str = "hacker-black";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const TEMPLATES: &[Template] = &[
    Template {
        id: "hacker-black",
        name: "Hacker Black",
        description: "Dark theme with green highlights",
    },
    Template {
        id: "terminal-white",
        name: "Terminal White",
        description: "Terminal interface style",
    },
    Template {
        id: "code-gray",
        name: "Code Gray",
        description: "Neutral tones, code style",
    },
    Template {
        id: "github-blue",
        name: "GitHub Blue",
        description: "GitHub-inspired look",
    },
    Template {
        id: "minimal-green",
        name: "Minimal Green",
        description: "Fresh and clean design",
    },
    Template {
        id: "business-orange",
        name: "Business Orange",
        description: "Professional business feel",
    },
    Template {
        id: "gradient-purple",
        name: "Gradient Purple",
        description: "Modern gradient effects",
    },
    Template {
        id: "neon-red",
        name: "Neon Red",
        description: "Neon tech aesthetic",
    },
];

pub fn catalog() -> &'static [Template] {
    TEMPLATES
}

pub fn find(id: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_is_in_catalog() {
        assert!(find(DEFAULT_TEMPLATE_ID).is_some());
        assert_eq!(catalog().len(), 8);
        assert!(find("comic-sans").is_none());
    }
}
