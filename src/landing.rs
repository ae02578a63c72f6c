// 🏠 Landing View - static informational content

use serde::Serialize;

pub const BRAND: &str = "Tamil Nadu Electricity Board";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Hero {
    pub headline: &'static str,
    pub tagline: &'static str,
}

/// One generation source card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenerationSource {
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SavingTip {
    pub title: &'static str,
    pub tip: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LandingContent {
    pub brand: &'static str,
    pub hero: Hero,
    pub sources: &'static [GenerationSource],
    pub tips: &'static [SavingTip],
}

pub const HERO: Hero = Hero {
    headline: "Powering Tamil Nadu's Future",
    tagline: "Delivering reliable and sustainable electricity to millions of homes and businesses across Tamil Nadu.",
};

pub const GENERATION_SOURCES: [GenerationSource; 3] = [
    GenerationSource {
        title: "Solar Power",
        description: "Harnessing the power of the sun with over 2GW of solar capacity.",
    },
    GenerationSource {
        title: "Wind Energy",
        description: "Leading wind energy producer with extensive wind farms.",
    },
    GenerationSource {
        title: "Hydro Power",
        description: "Clean and renewable hydroelectric power generation.",
    },
];

pub const SAVING_TIPS: [SavingTip; 4] = [
    SavingTip {
        title: "Use LED Bulbs",
        tip: "Switch to LED bulbs to save up to 80% on lighting energy consumption.",
    },
    SavingTip {
        title: "Smart Power Strips",
        tip: "Use smart power strips to eliminate phantom energy consumption.",
    },
    SavingTip {
        title: "Natural Ventilation",
        tip: "Use natural ventilation when possible to reduce AC usage.",
    },
    SavingTip {
        title: "Peak Hours",
        tip: "Avoid using heavy appliances during peak hours (6-9 PM).",
    },
];

pub fn content() -> LandingContent {
    LandingContent {
        brand: BRAND,
        hero: HERO,
        sources: &GENERATION_SOURCES,
        tips: &SAVING_TIPS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_carries_brand_and_hero() {
        let landing = content();
        assert_eq!(landing.brand, "Tamil Nadu Electricity Board");
        assert_eq!(landing.hero.headline, "Powering Tamil Nadu's Future");
        assert!(!landing.hero.tagline.is_empty());
    }

    #[test]
    fn test_sources_and_tips() {
        let landing = content();
        let sources: Vec<&str> = landing.sources.iter().map(|s| s.title).collect();
        assert_eq!(sources, vec!["Solar Power", "Wind Energy", "Hydro Power"]);

        assert_eq!(landing.tips.len(), 4);
        assert_eq!(landing.tips[0].title, "Use LED Bulbs");
        assert!(landing.tips[3].tip.contains("6-9 PM"));
    }

    #[test]
    fn test_content_serializes() {
        let json = serde_json::to_value(content()).unwrap();
        assert_eq!(json["hero"]["headline"], "Powering Tamil Nadu's Future");
        assert_eq!(json["sources"][1]["title"], "Wind Energy");
        assert_eq!(json["tips"].as_array().unwrap().len(), 4);
    }
}
