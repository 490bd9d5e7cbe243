//! Static organisation data used as prompt grounding. Read-only.

use serde::Serialize;
use tracing::warn;

pub const ORGANIZATION_SHORT_NAME: &str = "HERE AND NOW AI";
pub const ASSISTANT_NAME: &str = "Caramel";
pub const ASSISTANT_AVATAR_URL: &str =
    "https://raw.githubusercontent.com/hereandnowai/images/refs/heads/main/logos/caramel.jpeg";

/// A role in the simplified role matrix.
#[derive(Debug, Clone, Serialize)]
pub struct RoleTemplate {
    pub title: &'static str,
    pub department: &'static str,
    pub description: &'static str,
    pub skills: &'static [&'static str],
}

pub const ROLE_CATALOG: &[RoleTemplate] = &[
    RoleTemplate {
        title: "AI Research Scientist",
        department: "R&D",
        description: "Conducts cutting-edge research in AI, develops new algorithms, and publishes findings.",
        skills: &[
            "Machine Learning",
            "Python",
            "Deep Learning",
            "NLP",
            "TensorFlow/PyTorch",
            "Research Acumen",
        ],
    },
    RoleTemplate {
        title: "Software Engineer - AI Platforms",
        department: "Engineering",
        description: "Builds and maintains scalable platforms for deploying AI models and applications.",
        skills: &[
            "Python",
            "Kubernetes",
            "Docker",
            "Cloud Platforms (AWS/GCP/Azure)",
            "API Development",
            "System Design",
        ],
    },
    RoleTemplate {
        title: "AI Product Manager",
        department: "Product",
        description: "Defines AI product strategy, gathers requirements, and works with engineering to deliver AI-powered solutions.",
        skills: &[
            "Product Strategy",
            "Agile Methodologies",
            "User Research",
            "AI Ethics",
            "Market Analysis",
            "Communication",
        ],
    },
    RoleTemplate {
        title: "Data Scientist - Analytics",
        department: "Analytics",
        description: "Analyzes complex datasets to extract insights, build predictive models, and inform business decisions.",
        skills: &[
            "Statistical Analysis",
            "R/Python",
            "SQL",
            "Data Visualization",
            "Machine Learning Algorithms",
            "Business Acumen",
        ],
    },
    RoleTemplate {
        title: "AI Ethics Officer",
        department: "Legal & Compliance",
        description: "Ensures responsible development and deployment of AI technologies, focusing on fairness, transparency, and accountability.",
        skills: &[
            "AI Ethics Frameworks",
            "Regulatory Compliance",
            "Risk Assessment",
            "Policy Development",
            "Philosophy of AI",
            "Communication",
        ],
    },
];

/// Pretty-printed catalog for embedding in prompts.
pub fn roles_json() -> String {
    serde_json::to_string_pretty(ROLE_CATALOG).unwrap_or_else(|e| {
        warn!("Failed to serialize role catalog: {e}");
        "[]".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_json_contains_every_title() {
        let json = roles_json();
        for role in ROLE_CATALOG {
            assert!(json.contains(role.title), "missing {}", role.title);
        }
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), ROLE_CATALOG.len());
        assert_eq!(parsed[0]["skills"][0], "Machine Learning");
    }
}
