//! Self-contained HTML reports with embedded plotly charts.
pub mod plots;

use std::path::Path;

use anyhow::{Context, Result};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotly::Plot;

use crate::history::HistoryEntry;
use crate::trainer::TrainingOutcome;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

/// A titled block of HTML content and plots.
pub struct ReportSection {
    title: String,
    content: Vec<Markup>,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        ReportSection {
            title: title.to_string(),
            content: Vec::new(),
        }
    }

    pub fn add_content(&mut self, content: Markup) {
        self.content.push(content);
    }

    pub fn add_plot(&mut self, plot: Plot) {
        self.content.push(html! {
            div class="plot" { (PreEscaped(plot.to_inline_html(None))) }
        });
    }
}

pub struct Report {
    title: String,
    subtitle: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(title: &str, subtitle: &str) -> Self {
        Report {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn render(&self) -> Markup {
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_CDN) {}
                    style {
                        "body { font-family: sans-serif; margin: 2em; }
                        table { border-collapse: collapse; }
                        td, th { border: 1px solid #ccc; padding: 4px 8px; text-align: right; }
                        .selected { font-weight: bold; background-color: #eef6ee; }"
                    }
                }
                body {
                    h1 { (self.title) }
                    p { (self.subtitle) }
                    @for section in &self.sections {
                        section {
                            h2 { (section.title) }
                            @for block in &section.content {
                                (block)
                            }
                        }
                    }
                }
            }
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(&path, self.render().into_string())
            .with_context(|| format!("Failed to write report: {}", path.as_ref().display()))?;
        log::info!("Report written to {}", path.as_ref().display());
        Ok(())
    }
}

/// Candidate comparison chart, metrics table and selected-model summary.
pub fn training_report(outcome: &TrainingOutcome) -> Report {
    let mut report = Report::new(
        "Diabetes Risk Model Training",
        &format!(
            "Bundle {}: {} training and {} test records",
            outcome.bundle.bundle_id, outcome.n_train, outcome.n_test
        ),
    );

    let mut comparison = ReportSection::new("Candidate Models");
    comparison.add_plot(plots::plot_candidate_metrics(
        &outcome.candidates,
        "Held-out Metrics by Model",
    ));
    comparison.add_content(html! {
        table {
            tr {
                th { "Model" } th { "Accuracy" } th { "Precision" } th { "Recall" }
                th { "F1" } th { "CV accuracy" } th { "Selectable" }
            }
            @for (i, c) in outcome.candidates.iter().enumerate() {
                tr class=[(i == outcome.selected).then_some("selected")] {
                    td { (c.name()) }
                    td { (format!("{:.4}", c.evaluation.accuracy)) }
                    td { (format!("{:.4}", c.evaluation.precision)) }
                    td { (format!("{:.4}", c.evaluation.recall)) }
                    td { (format!("{:.4}", c.evaluation.f1_score)) }
                    td { (format!("{:.4}", c.evaluation.cv_score)) }
                    td { (if c.eligible { "yes" } else { "no" }) }
                }
            }
        }
    });
    report.add_section(comparison);

    let metrics = &outcome.bundle.metrics;
    let mut selected = ReportSection::new("Selected Model");
    selected.add_content(html! {
        p { "Selected " strong { (metrics.model_name) } " by highest test F1 score." }
        pre { (serde_json::to_string_pretty(metrics).unwrap_or_default()) }
    });
    report.add_section(selected);
    report
}

/// Probability trend and table of one subject's assessments.
pub fn history_report(subject: &str, entries: &[HistoryEntry]) -> Report {
    let mut report = Report::new(
        "Diabetes Risk History",
        &format!("{} assessment(s) for {}", entries.len(), subject),
    );

    if let Some(latest) = entries.last() {
        let mut gauge = ReportSection::new("Latest Assessment");
        gauge.add_plot(plots::plot_probability_gauge(latest.probability, "Risk Score"));
        gauge.add_content(html! {
            p {
                (latest.tier.label()) " on "
                (latest.timestamp.format("%Y-%m-%d %H:%M").to_string())
            }
        });
        report.add_section(gauge);
    }

    let mut trend = ReportSection::new("Risk Trend");
    if entries.is_empty() {
        trend.add_content(html! { p { "No assessments recorded yet." } });
    } else {
        trend.add_plot(plots::plot_risk_trend(entries, "Risk Probability Over Time"));
        trend.add_content(html! {
            table {
                tr { th { "Date" } th { "Risk Level" } th { "Probability %" } th { "Glucose" } th { "BMI" } }
                @for e in entries {
                    tr {
                        td { (e.timestamp.format("%Y-%m-%d %H:%M").to_string()) }
                        td { (e.tier.label()) }
                        td { (format!("{:.1}", e.probability * 100.0)) }
                        td { (format!("{}", e.record.glucose)) }
                        td { (format!("{}", e.record.bmi)) }
                    }
                }
            }
        });
    }
    report.add_section(trend);
    report
}
