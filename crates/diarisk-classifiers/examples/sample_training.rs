use anyhow::Result;
use maud::html;

use diarisk_classifiers::config::TrainingConfig;
use diarisk_classifiers::io::sample_dataset;
use diarisk_classifiers::report::{training_report, ReportSection};
use diarisk_classifiers::trainer::run_training;
use diarisk_classifiers::{BundleStore, PatientRecord, RiskPredictor};

fn main() -> Result<()> {
    env_logger::init();

    let dataset = sample_dataset()?;
    println!("Loaded {} records ({} diabetic)", dataset.len(), dataset.positives());

    let config = TrainingConfig::default();
    let outcome = run_training(&dataset, &config)?;

    for c in &outcome.candidates {
        println!(
            "{:<20} F1 {:.3}  accuracy {:.3}  CV {:.3}",
            c.name(),
            c.evaluation.f1_score,
            c.evaluation.accuracy,
            c.evaluation.cv_score
        );
    }

    // Create the training report
    let mut report = training_report(&outcome);
    let mut notes = ReportSection::new("Notes");
    notes.add_content(html! {
        "Trained on the 99-record sample embedded in the library."
    });
    report.add_section(notes);

    let out_dir = std::env::temp_dir().join("diarisk-sample-model");
    BundleStore::new(&out_dir).save(&outcome.bundle)?;
    report.save_to_file(out_dir.join("training_report.html"))?;

    let predictor = RiskPredictor::from_store(&out_dir)?;
    let record = PatientRecord::from_values([6.0, 148.0, 72.0, 35.0, 0.0, 33.6, 0.627, 50.0]);
    let assessment = predictor.predict(&record)?;
    println!(
        "{}: {:.1}% ({})",
        predictor.model_name(),
        assessment.probability * 100.0,
        assessment.tier
    );
    for rec in &assessment.recommendations {
        println!("  - {}", rec);
    }

    println!("Model and report saved to {}", out_dir.display());
    Ok(())
}
