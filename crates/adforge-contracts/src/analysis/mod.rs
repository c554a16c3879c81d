mod contract;
mod merge;

pub use contract::{
    check_content_contracts, EXPECTED_HOOKS, EXPECTED_IDEAS, EXPECTED_VARIATIONS,
};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The five funnel categories partitioning ad copy.
///
/// Order here is display order; it carries no other meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudienceStage {
    Cold,
    Warm,
    Hot,
    Retargeting,
    Retention,
}

impl AudienceStage {
    pub const ALL: [AudienceStage; 5] = [
        AudienceStage::Cold,
        AudienceStage::Warm,
        AudienceStage::Hot,
        AudienceStage::Retargeting,
        AudienceStage::Retention,
    ];

    /// Key used for this stage in the model's response payload.
    pub fn response_key(&self) -> &'static str {
        match self {
            AudienceStage::Cold => "cold_audience",
            AudienceStage::Warm => "warm_audience",
            AudienceStage::Hot => "hot_audience",
            AudienceStage::Retargeting => "retargeting",
            AudienceStage::Retention => "retention",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AudienceStage::Cold => "cold",
            AudienceStage::Warm => "warm",
            AudienceStage::Hot => "hot",
            AudienceStage::Retargeting => "retargeting",
            AudienceStage::Retention => "retention",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AudienceStage::Cold => "Cold Audience",
            AudienceStage::Warm => "Warm Audience",
            AudienceStage::Hot => "Hot Audience",
            AudienceStage::Retargeting => "Retargeting",
            AudienceStage::Retention => "Retention",
        }
    }
}

impl fmt::Display for AudienceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudienceStage {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cold" | "cold_audience" => Ok(AudienceStage::Cold),
            "warm" | "warm_audience" => Ok(AudienceStage::Warm),
            "hot" | "hot_audience" => Ok(AudienceStage::Hot),
            "retargeting" => Ok(AudienceStage::Retargeting),
            "retention" => Ok(AudienceStage::Retention),
            other => Err(format!("unknown audience stage '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMarketFit {
    pub core_problem: String,
    pub urgency_level: String,
    pub demand_type: String,
    pub cultural_relevance: String,
    pub seasonality: String,
    pub market_fit_score: f64,
    pub price_sensitivity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdSaturation {
    pub facebook_instagram: f64,
    pub google_ads: f64,
    pub marketplaces: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionAnalysis {
    pub estimated_active_sellers: String,
    pub avg_daily_sales_per_seller: String,
    pub price_range_bdt: String,
    pub competition_type: String,
    pub ad_saturation: AdSaturation,
    pub entry_difficulty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerAvatar {
    pub avatar_name: String,
    pub age_range: String,
    pub gender: String,
    pub location: String,
    pub income_level: String,
    pub pain_points: Vec<String>,
    pub hidden_fears: Vec<String>,
    pub desired_transformation: String,
    pub buying_objections: Vec<String>,
    pub purchase_triggers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdVariation {
    pub headline: String,
    pub hook: String,
    pub body: String,
    pub cta: String,
}

/// One themed unit of ad content belonging to a single stage.
///
/// `id` is unique within its stage only. `generated_image_url` never comes
/// from the wire; it is populated through
/// [`ProductAnalysis::with_generated_image`] and overwritten on re-generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPiece {
    pub id: String,
    pub title: String,
    pub hooks: Vec<String>,
    pub ideas: Vec<String>,
    pub variations: Vec<AdVariation>,
    pub connection_psychology: String,
    pub recommended_format: String,
    #[serde(default)]
    pub generated_image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdCopyBoard {
    pub cold_audience: Vec<ContentPiece>,
    pub warm_audience: Vec<ContentPiece>,
    pub hot_audience: Vec<ContentPiece>,
    pub retargeting: Vec<ContentPiece>,
    pub retention: Vec<ContentPiece>,
}

impl AdCopyBoard {
    pub fn stage(&self, stage: AudienceStage) -> &[ContentPiece] {
        match stage {
            AudienceStage::Cold => &self.cold_audience,
            AudienceStage::Warm => &self.warm_audience,
            AudienceStage::Hot => &self.hot_audience,
            AudienceStage::Retargeting => &self.retargeting,
            AudienceStage::Retention => &self.retention,
        }
    }

    pub fn stage_mut(&mut self, stage: AudienceStage) -> &mut Vec<ContentPiece> {
        match stage {
            AudienceStage::Cold => &mut self.cold_audience,
            AudienceStage::Warm => &mut self.warm_audience,
            AudienceStage::Hot => &mut self.hot_audience,
            AudienceStage::Retargeting => &mut self.retargeting,
            AudienceStage::Retention => &mut self.retention,
        }
    }

    pub fn total_pieces(&self) -> usize {
        AudienceStage::ALL
            .iter()
            .map(|stage| self.stage(*stage).len())
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelLogic {
    pub cold_to_warm: String,
    pub warm_to_hot: String,
    pub retention_strategy: String,
    pub recommended_sequence_days: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "YES")]
    Yes,
    #[serde(rename = "NO")]
    No,
    #[serde(rename = "TEST")]
    Test,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Yes => "YES",
            Verdict::No => "NO",
            Verdict::Test => "TEST",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalDecision {
    pub verdict: Verdict,
    pub decision_reasoning: String,
    pub optimization_requirements: Vec<String>,
    pub starting_budget_bdt: f64,
    pub major_risks: Vec<String>,
}

/// Root aggregate for one product search.
///
/// All six sections are required; a payload missing any one is rejected
/// wholesale at deserialization, never partially accepted. A new search
/// replaces the whole tree; the only post-creation mutation is the image
/// patch in [`ProductAnalysis::with_generated_image`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAnalysis {
    pub product_market_fit: ProductMarketFit,
    pub competition_analysis: CompetitionAnalysis,
    pub customer_avatars: Vec<CustomerAvatar>,
    pub ad_copies: AdCopyBoard,
    pub retargeting_funnel_logic: FunnelLogic,
    pub final_decision: FinalDecision,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testutil::sample_analysis;

    #[test]
    fn stage_round_trips_through_str() {
        for stage in AudienceStage::ALL {
            assert_eq!(stage.as_str().parse::<AudienceStage>(), Ok(stage));
            assert_eq!(stage.response_key().parse::<AudienceStage>(), Ok(stage));
        }
        assert!("lukewarm".parse::<AudienceStage>().is_err());
    }

    #[test]
    fn verdict_serializes_as_uppercase() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_value(Verdict::Yes)?, json!("YES"));
        assert_eq!(serde_json::to_value(Verdict::Test)?, json!("TEST"));
        assert_eq!(serde_json::from_value::<Verdict>(json!("NO"))?, Verdict::No);
        assert!(serde_json::from_value::<Verdict>(json!("Maybe")).is_err());
        Ok(())
    }

    #[test]
    fn analysis_round_trips_and_preserves_piece_order() -> anyhow::Result<()> {
        let analysis = sample_analysis();
        let raw = serde_json::to_string(&analysis)?;
        let parsed: ProductAnalysis = serde_json::from_str(&raw)?;
        assert_eq!(parsed, analysis);

        let ids: Vec<&str> = parsed
            .ad_copies
            .stage(AudienceStage::Cold)
            .iter()
            .map(|piece| piece.id.as_str())
            .collect();
        assert_eq!(ids, vec!["cold-1", "cold-2"]);
        Ok(())
    }

    #[test]
    fn missing_section_rejects_whole_payload() -> anyhow::Result<()> {
        let mut value = serde_json::to_value(sample_analysis())?;
        if let Some(root) = value.as_object_mut() {
            root.remove("final_decision");
        }
        assert!(serde_json::from_value::<ProductAnalysis>(value).is_err());
        Ok(())
    }

    #[test]
    fn generated_image_url_defaults_to_absent() -> anyhow::Result<()> {
        let piece: ContentPiece = serde_json::from_value(json!({
            "id": "cold-1",
            "title": "Morning ritual",
            "hooks": ["h1", "h2", "h3", "h4", "h5"],
            "ideas": ["i1", "i2", "i3", "i4", "i5"],
            "variations": [
                {"headline": "A", "hook": "B", "body": "C", "cta": "D"},
                {"headline": "E", "hook": "F", "body": "G", "cta": "H"}
            ],
            "connection_psychology": "trust",
            "recommended_format": "reel"
        }))?;
        assert_eq!(piece.generated_image_url, None);
        Ok(())
    }
}
