//! Response-shape declarations for the analysis call.
//!
//! The schema is pure data in the Gemini REST dialect (`OBJECT` / `STRING` /
//! `NUMBER` / `ARRAY` type tags). It is built once per process and attached
//! unchanged to every analysis request; image generation carries no schema.

use serde_json::{json, Value};

fn ad_variation_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "headline": { "type": "STRING", "description": "Short attention-grabbing headline in Bengali." },
            "hook": { "type": "STRING", "description": "First 1-2 sentences to stop the scroll in Bengali." },
            "body": { "type": "STRING", "description": "The main persuasive copy in Bengali." },
            "cta": { "type": "STRING", "description": "Direct call to action in Bengali." },
        },
        "required": ["headline", "hook", "body", "cta"],
    })
}

fn content_piece_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "id": { "type": "STRING" },
            "title": { "type": "STRING" },
            "hooks": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "5 extremely engaging Bengali hooks.",
            },
            "ideas": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "5 unique Bengali content ideas.",
            },
            "variations": {
                "type": "ARRAY",
                "items": ad_variation_schema(),
                "description": "2 ready-to-publish ad variations.",
            },
            "connection_psychology": { "type": "STRING" },
            "recommended_format": { "type": "STRING" },
        },
        "required": [
            "id",
            "title",
            "hooks",
            "ideas",
            "variations",
            "connection_psychology",
            "recommended_format",
        ],
    })
}

fn customer_avatar_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "avatar_name": { "type": "STRING" },
            "age_range": { "type": "STRING" },
            "gender": { "type": "STRING" },
            "location": { "type": "STRING" },
            "income_level": { "type": "STRING" },
            "pain_points": { "type": "ARRAY", "items": { "type": "STRING" } },
            "hidden_fears": { "type": "ARRAY", "items": { "type": "STRING" } },
            "desired_transformation": { "type": "STRING" },
            "buying_objections": { "type": "ARRAY", "items": { "type": "STRING" } },
            "purchase_triggers": { "type": "ARRAY", "items": { "type": "STRING" } },
        },
        "required": [
            "avatar_name",
            "age_range",
            "gender",
            "location",
            "income_level",
            "pain_points",
            "hidden_fears",
            "desired_transformation",
            "buying_objections",
            "purchase_triggers",
        ],
    })
}

/// Full response schema for the analysis call. Every field is required; a
/// conforming payload deserializes into `analysis::ProductAnalysis` directly.
pub fn analysis_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "product_market_fit": {
                "type": "OBJECT",
                "properties": {
                    "core_problem": { "type": "STRING" },
                    "urgency_level": { "type": "STRING" },
                    "demand_type": { "type": "STRING" },
                    "cultural_relevance": { "type": "STRING" },
                    "seasonality": { "type": "STRING" },
                    "market_fit_score": { "type": "NUMBER" },
                    "price_sensitivity": { "type": "STRING" },
                },
                "required": [
                    "core_problem",
                    "urgency_level",
                    "demand_type",
                    "cultural_relevance",
                    "seasonality",
                    "market_fit_score",
                    "price_sensitivity",
                ],
            },
            "competition_analysis": {
                "type": "OBJECT",
                "properties": {
                    "estimated_active_sellers": { "type": "STRING" },
                    "avg_daily_sales_per_seller": { "type": "STRING" },
                    "price_range_bdt": { "type": "STRING" },
                    "competition_type": { "type": "STRING" },
                    "ad_saturation": {
                        "type": "OBJECT",
                        "properties": {
                            "facebook_instagram": { "type": "NUMBER" },
                            "google_ads": { "type": "NUMBER" },
                            "marketplaces": { "type": "NUMBER" },
                        },
                        "required": ["facebook_instagram", "google_ads", "marketplaces"],
                    },
                    "entry_difficulty": { "type": "STRING" },
                },
                "required": [
                    "estimated_active_sellers",
                    "avg_daily_sales_per_seller",
                    "price_range_bdt",
                    "competition_type",
                    "ad_saturation",
                    "entry_difficulty",
                ],
            },
            "customer_avatars": {
                "type": "ARRAY",
                "items": customer_avatar_schema(),
            },
            "ad_copies": {
                "type": "OBJECT",
                "properties": {
                    "cold_audience": { "type": "ARRAY", "items": content_piece_schema() },
                    "warm_audience": { "type": "ARRAY", "items": content_piece_schema() },
                    "hot_audience": { "type": "ARRAY", "items": content_piece_schema() },
                    "retargeting": { "type": "ARRAY", "items": content_piece_schema() },
                    "retention": { "type": "ARRAY", "items": content_piece_schema() },
                },
                "required": [
                    "cold_audience",
                    "warm_audience",
                    "hot_audience",
                    "retargeting",
                    "retention",
                ],
            },
            "retargeting_funnel_logic": {
                "type": "OBJECT",
                "properties": {
                    "cold_to_warm": { "type": "STRING" },
                    "warm_to_hot": { "type": "STRING" },
                    "retention_strategy": { "type": "STRING" },
                    "recommended_sequence_days": { "type": "ARRAY", "items": { "type": "STRING" } },
                },
                "required": [
                    "cold_to_warm",
                    "warm_to_hot",
                    "retention_strategy",
                    "recommended_sequence_days",
                ],
            },
            "final_decision": {
                "type": "OBJECT",
                "properties": {
                    "verdict": { "type": "STRING", "enum": ["YES", "NO", "TEST"] },
                    "decision_reasoning": { "type": "STRING" },
                    "optimization_requirements": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "starting_budget_bdt": { "type": "NUMBER" },
                    "major_risks": { "type": "ARRAY", "items": { "type": "STRING" } },
                },
                "required": [
                    "verdict",
                    "decision_reasoning",
                    "optimization_requirements",
                    "starting_budget_bdt",
                    "major_risks",
                ],
            },
        },
        "required": [
            "product_market_fit",
            "competition_analysis",
            "customer_avatars",
            "ad_copies",
            "retargeting_funnel_logic",
            "final_decision",
        ],
    })
}
