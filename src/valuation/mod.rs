pub mod depreciation;
pub mod recommendation;

pub use depreciation::{DepreciationOutput, ValuationEngine, ValuationInput};
pub use recommendation::{
    CostTotals, RateRecommendation, RateRecommendationEngine, RecommendationInput, RevenueProjection,
};
