use crate::analysis::{
    AdCopyBoard, AdSaturation, AdVariation, CompetitionAnalysis, ContentPiece, CustomerAvatar,
    FinalDecision, FunnelLogic, ProductAnalysis, ProductMarketFit, Verdict,
};

pub(crate) fn sample_variation(tag: &str) -> AdVariation {
    AdVariation {
        headline: format!("{tag} headline"),
        hook: format!("{tag} hook"),
        body: format!("{tag} body"),
        cta: format!("{tag} cta"),
    }
}

pub(crate) fn sample_piece(id: &str) -> ContentPiece {
    ContentPiece {
        id: id.to_string(),
        title: format!("{id} title"),
        hooks: (1..=5).map(|n| format!("{id} hook {n}")).collect(),
        ideas: (1..=5).map(|n| format!("{id} idea {n}")).collect(),
        variations: vec![
            sample_variation(&format!("{id} v1")),
            sample_variation(&format!("{id} v2")),
        ],
        connection_psychology: "trust and reliability".to_string(),
        recommended_format: "short vertical video".to_string(),
        generated_image_url: None,
    }
}

pub(crate) fn sample_analysis() -> ProductAnalysis {
    ProductAnalysis {
        product_market_fit: ProductMarketFit {
            core_problem: "unreliable supply of everyday staples".to_string(),
            urgency_level: "High".to_string(),
            demand_type: "Necessity".to_string(),
            cultural_relevance: "daily household staple".to_string(),
            seasonality: "year-round".to_string(),
            market_fit_score: 8.0,
            price_sensitivity: "Medium".to_string(),
        },
        competition_analysis: CompetitionAnalysis {
            estimated_active_sellers: "Medium".to_string(),
            avg_daily_sales_per_seller: "Low".to_string(),
            price_range_bdt: "450-900".to_string(),
            competition_type: "Commodity-led".to_string(),
            ad_saturation: AdSaturation {
                facebook_instagram: 6.0,
                google_ads: 3.0,
                marketplaces: 7.0,
            },
            entry_difficulty: "Moderate".to_string(),
        },
        customer_avatars: vec![CustomerAvatar {
            avatar_name: "Busy urban parent".to_string(),
            age_range: "28-40".to_string(),
            gender: "Any".to_string(),
            location: "Urban".to_string(),
            income_level: "Middle".to_string(),
            pain_points: vec!["no time to compare sellers".to_string()],
            hidden_fears: vec!["adulterated products".to_string()],
            desired_transformation: "a brand they can reorder without thinking".to_string(),
            buying_objections: vec!["price above bazaar rate".to_string()],
            purchase_triggers: vec!["cash on delivery".to_string()],
        }],
        ad_copies: AdCopyBoard {
            cold_audience: vec![sample_piece("cold-1"), sample_piece("cold-2")],
            warm_audience: vec![sample_piece("warm-1")],
            hot_audience: vec![sample_piece("hot-1")],
            retargeting: vec![sample_piece("rt-1")],
            retention: vec![sample_piece("keep-1")],
        },
        retargeting_funnel_logic: FunnelLogic {
            cold_to_warm: "retarget video viewers with proof content".to_string(),
            warm_to_hot: "offer a first-order discount".to_string(),
            retention_strategy: "monthly refill reminder".to_string(),
            recommended_sequence_days: vec!["3".to_string(), "7".to_string(), "14".to_string()],
        },
        final_decision: FinalDecision {
            verdict: Verdict::Test,
            decision_reasoning: "viable but crowded; validate with a small budget".to_string(),
            optimization_requirements: vec!["landing page in Bengali".to_string()],
            starting_budget_bdt: 15000.0,
            major_risks: vec!["commodity price swings".to_string()],
        },
    }
}
