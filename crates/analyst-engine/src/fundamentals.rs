//! Threshold buckets over fundamental ratios

use analyst_core::{
    FinancialHealth, FundamentalAssessment, FundamentalMetrics, GrowthAssessment, GrowthBucket,
    LeverageBucket, MarginBucket, PbBucket, PeBucket, Profitability, RiskBucket, RoeBucket,
    Valuation,
};

/// Qualitative assessment of `metrics`
///
/// Each judgment is computed independently. A metric missing from the input
/// leaves both its value and its bucket unset.
pub fn assess(metrics: &FundamentalMetrics) -> FundamentalAssessment {
    let profit_margin_pct = metrics.profit_margin.map(as_pct);
    let roe_pct = metrics.roe.map(as_pct);
    let revenue_growth_pct = metrics.revenue_growth.map(as_pct);

    FundamentalAssessment {
        valuation: Valuation {
            pe_ratio: metrics.pe_ratio,
            pe_assessment: metrics.pe_ratio.map(pe_bucket),
            price_to_book: metrics.price_to_book,
            pb_assessment: metrics.price_to_book.and_then(pb_bucket),
        },
        profitability: Profitability {
            profit_margin_pct,
            margin_assessment: profit_margin_pct.map(margin_bucket),
            roe_pct,
            roe_assessment: roe_pct.map(roe_bucket),
        },
        growth: GrowthAssessment {
            revenue_growth_pct,
            growth_assessment: revenue_growth_pct.map(growth_bucket),
            earnings_growth_pct: metrics.earnings_growth.map(as_pct),
        },
        financial_health: FinancialHealth {
            debt_to_equity: metrics.debt_to_equity,
            leverage_assessment: metrics.debt_to_equity.map(leverage_bucket),
            beta: metrics.beta,
            risk_assessment: metrics.beta.map(risk_bucket),
        },
        sector: metrics.sector.clone(),
        industry: metrics.industry.clone(),
    }
}

fn as_pct(ratio: f64) -> f64 {
    ratio * 100.0
}

pub fn pe_bucket(pe: f64) -> PeBucket {
    if pe < 15.0 {
        PeBucket::Undervalued
    } else if pe > 25.0 {
        PeBucket::Overvalued
    } else {
        PeBucket::Reasonable
    }
}

/// No label between 1x and 3x book
pub fn pb_bucket(pb: f64) -> Option<PbBucket> {
    if pb < 1.0 {
        Some(PbBucket::BelowBook)
    } else if pb > 3.0 {
        Some(PbBucket::Premium)
    } else {
        None
    }
}

pub fn margin_bucket(margin_pct: f64) -> MarginBucket {
    if margin_pct > 20.0 {
        MarginBucket::Strong
    } else if margin_pct > 10.0 {
        MarginBucket::Good
    } else {
        MarginBucket::Low
    }
}

pub fn roe_bucket(roe_pct: f64) -> RoeBucket {
    if roe_pct > 15.0 {
        RoeBucket::Strong
    } else if roe_pct > 10.0 {
        RoeBucket::Decent
    } else {
        RoeBucket::Low
    }
}

pub fn growth_bucket(growth_pct: f64) -> GrowthBucket {
    if growth_pct > 15.0 {
        GrowthBucket::Strong
    } else if growth_pct > 5.0 {
        GrowthBucket::Moderate
    } else {
        GrowthBucket::Slow
    }
}

pub fn leverage_bucket(debt_to_equity: f64) -> LeverageBucket {
    if debt_to_equity < 0.3 {
        LeverageBucket::Conservative
    } else if debt_to_equity < 0.6 {
        LeverageBucket::Moderate
    } else {
        LeverageBucket::High
    }
}

pub fn risk_bucket(beta: f64) -> RiskBucket {
    if beta > 1.5 {
        RiskBucket::HighVolatility
    } else if beta < 0.5 {
        RiskBucket::LowVolatility
    } else {
        RiskBucket::Moderate
    }
}
