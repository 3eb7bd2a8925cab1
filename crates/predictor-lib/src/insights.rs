//! Rule-based market insights
//!
//! Assembles seasonal, market, and variety observations from the request
//! alone; no model invocation is involved.

use serde::{Deserialize, Serialize};

/// Insight bundle for one city/variety/month combination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketInsights {
    pub insights: Vec<String>,
    pub risk_alerts: Vec<String>,
    pub trend_summary: String,
}

const MAJOR_MARKETS: &[&str] = &["Bangalore", "Delhi", "Mumbai"];

/// Build the insight bundle for `city`/`variety` in `month`
pub fn market_insights(city: &str, variety: &str, month: u32) -> MarketInsights {
    let mut insights = Vec::new();
    let mut risk_alerts = Vec::new();

    match month {
        12 | 1 | 2 => {
            insights.push(format!(
                "Winter season typically shows higher prices for {variety} in {city} \
                 due to reduced supply and increased demand."
            ));
        }
        6..=9 => {
            insights.push(format!(
                "Monsoon season may impact {variety} arrivals in {city}. \
                 Expect price volatility due to weather conditions."
            ));
            risk_alerts.push(
                "Weather Alert: Heavy rainfall may affect transportation and supply chain."
                    .to_string(),
            );
        }
        _ => {}
    }

    if MAJOR_MARKETS.contains(&city) {
        insights.push(format!(
            "{city} is a major consumption market with consistent demand throughout the year."
        ));
    }

    if variety == "Guntur" {
        insights.push(
            "Guntur variety is highly sought after for its pungency and color, \
             commanding premium prices in export markets."
                .to_string(),
        );
    }

    let trend_summary = format!(
        "Based on historical patterns, {variety} prices in {city} are expected to \
         remain stable with seasonal variations. Monitor arrivals and weather \
         conditions for price movements."
    );

    MarketInsights {
        insights,
        risk_alerts,
        trend_summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winter_major_market_guntur_collects_all_three_insights() {
        let bundle = market_insights("Bangalore", "Guntur", 1);
        assert_eq!(bundle.insights.len(), 3);
        assert!(bundle.insights[0].contains("Winter season"));
        assert!(bundle.insights[1].contains("major consumption market"));
        assert!(bundle.insights[2].contains("pungency"));
        assert!(bundle.risk_alerts.is_empty());
    }

    #[test]
    fn monsoon_raises_weather_alert() {
        let bundle = market_insights("Guntur", "Teja", 7);
        assert_eq!(bundle.risk_alerts.len(), 1);
        assert!(bundle.risk_alerts[0].starts_with("Weather Alert"));
        assert!(bundle.insights[0].contains("Monsoon season"));
    }

    #[test]
    fn off_season_minor_market_still_has_trend_summary() {
        let bundle = market_insights("Chennai", "Sannam", 4);
        assert!(bundle.insights.is_empty());
        assert!(bundle.risk_alerts.is_empty());
        assert!(bundle.trend_summary.contains("Sannam prices in Chennai"));
    }
}
