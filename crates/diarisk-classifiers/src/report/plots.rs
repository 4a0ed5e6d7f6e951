use plotly::common::Mode;
use plotly::layout::{Axis, BarMode, Layout, Margin};
use plotly::{Bar, Plot, Scatter, Trace};
use serde::Serialize;
use serde_json::{json, Value};

use crate::history::HistoryEntry;
use crate::inference::{LOW_RISK_BELOW, MEDIUM_RISK_BELOW};
use crate::trainer::CandidateReport;

/// Grouped bar chart of the held-out metrics of every candidate.
pub fn plot_candidate_metrics(candidates: &[CandidateReport], title: &str) -> Plot {
    let names: Vec<String> = candidates.iter().map(|c| c.name().to_string()).collect();
    let series: [(&str, fn(&CandidateReport) -> f64); 5] = [
        ("Accuracy", |c| c.evaluation.accuracy),
        ("Precision", |c| c.evaluation.precision),
        ("Recall", |c| c.evaluation.recall),
        ("F1", |c| c.evaluation.f1_score),
        ("CV accuracy", |c| c.evaluation.cv_score),
    ];

    let mut plot = Plot::new();
    for (metric, value) in series {
        let values: Vec<f64> = candidates.iter().map(value).collect();
        plot.add_trace(Bar::new(names.clone(), values).name(metric));
    }
    plot.set_layout(
        Layout::new()
            .title(title)
            .bar_mode(BarMode::Group)
            .x_axis(Axis::new().title("Model"))
            .y_axis(Axis::new().title("Score").range(vec![0.0, 1.0])),
    );
    plot
}

/// Probability trend of one subject's assessments, with the tier cut-offs
/// drawn as dashed reference lines.
pub fn plot_risk_trend(entries: &[HistoryEntry], title: &str) -> Plot {
    let dates: Vec<String> = entries
        .iter()
        .map(|e| e.timestamp.format("%Y-%m-%d %H:%M:%S").to_string())
        .collect();
    let probabilities: Vec<f64> = entries.iter().map(|e| e.probability * 100.0).collect();

    let mut plot = Plot::new();
    plot.add_trace(
        Scatter::new(dates.clone(), probabilities)
            .mode(Mode::LinesMarkers)
            .name("Risk probability"),
    );

    if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
        for (cutoff, name) in [(LOW_RISK_BELOW, "Medium risk"), (MEDIUM_RISK_BELOW, "High risk")] {
            plot.add_trace(
                Scatter::new(vec![first.clone(), last.clone()], vec![cutoff * 100.0; 2])
                    .mode(Mode::Lines)
                    .name(name)
                    .line(plotly::common::Line::new().dash(plotly::common::DashType::Dash)),
            );
        }
    }

    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("Date"))
            .y_axis(Axis::new().title("Probability (%)").range(vec![0.0, 100.0])),
    );
    plot
}

/// plotly.js `indicator` trace. The plotly crate has no typed builder for it,
/// so the gauge description is kept as plain JSON.
#[derive(Debug, Clone, Serialize)]
struct Indicator {
    #[serde(rename = "type")]
    trace_type: &'static str,
    mode: &'static str,
    value: f64,
    title: Value,
    number: Value,
    delta: Value,
    gauge: Value,
}

impl Trace for Indicator {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Gauge of one assessment's probability in percent, banded by risk tier.
pub fn plot_probability_gauge(probability: f64, title: &str) -> Plot {
    let low = LOW_RISK_BELOW * 100.0;
    let medium = MEDIUM_RISK_BELOW * 100.0;
    let gauge = Indicator {
        trace_type: "indicator",
        mode: "gauge+number+delta",
        value: probability.clamp(0.0, 1.0) * 100.0,
        title: json!({ "text": title, "font": { "size": 24 } }),
        number: json!({ "suffix": "%", "valueformat": ".1f" }),
        delta: json!({ "reference": 50 }),
        gauge: json!({
            "axis": { "range": [0, 100], "tickwidth": 1, "tickcolor": "darkblue" },
            "bar": { "color": "darkblue" },
            "bgcolor": "white",
            "borderwidth": 2,
            "bordercolor": "gray",
            "steps": [
                { "range": [0.0, low], "color": "#e8f5e9" },
                { "range": [low, medium], "color": "#fff3e0" },
                { "range": [medium, 100.0], "color": "#ffebee" }
            ],
            "threshold": {
                "line": { "color": "red", "width": 4 },
                "thickness": 0.75,
                "value": 90
            }
        }),
    };

    let mut plot = Plot::new();
    plot.add_trace(Box::new(gauge));
    plot.set_layout(
        Layout::new()
            .height(300)
            .margin(Margin::new().left(20).right(20).top(50).bottom(20)),
    );
    plot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauge_is_an_indicator_in_percent() {
        let plot = plot_probability_gauge(0.42, "Risk Score");
        let json: Value = serde_json::from_str(&plot.to_json()).unwrap();
        let trace = &json["data"][0];
        assert_eq!(trace["type"], "indicator");
        assert_eq!(trace["value"].as_f64(), Some(42.0));
        assert_eq!(trace["title"]["text"], "Risk Score");
        let steps = trace["gauge"]["steps"].as_array().unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[1]["range"][0].as_f64(), Some(30.0));
        assert_eq!(steps[2]["range"][0].as_f64(), Some(60.0));
    }

    #[test]
    fn gauge_value_is_clamped() {
        let plot = plot_probability_gauge(1.5, "Risk Score");
        let json: Value = serde_json::from_str(&plot.to_json()).unwrap();
        assert_eq!(json["data"][0]["value"].as_f64(), Some(100.0));
    }
}
