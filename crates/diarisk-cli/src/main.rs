use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use diarisk_cli::history::{clear_history, format_history, run_history};
use diarisk_cli::predict::{
    format_assessment, load_records_json, record_from_arguments, run_predict, PredictOptions,
    FEATURE_ARGS,
};
use diarisk_cli::train::{config_from_arguments, format_summary, run_train};

const DEFAULT_HISTORY: &str = "history.json";

fn feature_arg(id: &'static str, long: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(long)
        .help(help)
        .value_parser(clap::value_parser!(f64))
        .allow_negative_numbers(true)
        .conflicts_with("input")
}

fn build_cli() -> Command {
    let feature_help: [&'static str; 8] = [
        "Number of pregnancies (0-20)",
        "Plasma glucose, mg/dL (0-300; 0 = not measured)",
        "Diastolic blood pressure, mm Hg (0-200; 0 = not measured)",
        "Triceps skin fold thickness, mm (0-100; 0 = not measured)",
        "2-hour serum insulin, mu U/ml (0-900; 0 = not measured)",
        "Body mass index (0-110; 0 = not measured)",
        "Diabetes pedigree function (0-3)",
        "Age in years (1-120)",
    ];

    let mut predict = Command::new("predict")
        .about("Predict diabetes risk with a trained model")
        .arg(
            Arg::new("model_dir")
                .short('m')
                .long("model")
                .help("Directory holding the trained model bundle")
                .default_value("model")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .help("JSON file with one record or an array of records")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("subject")
                .short('s')
                .long("subject")
                .help("Record the assessment in this subject's history")
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(history_arg())
        .arg(
            Arg::new("report")
                .short('r')
                .long("report")
                .help("Export the assessment(s) to this CSV file")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print assessments as JSON")
                .action(ArgAction::SetTrue),
        );
    for ((id, long, _), help) in FEATURE_ARGS.into_iter().zip(feature_help) {
        predict = predict.arg(feature_arg(id, long, help));
    }

    Command::new("diarisk")
        .version(clap::crate_version!())
        .about("\u{1FA7A} diarisk - Diabetes risk model training and prediction")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Train the candidate models and save the best one")
                .arg(
                    Arg::new("config")
                        .help("Path to training configuration file")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("data")
                        .short('d')
                        .long("data")
                        .help(
                            "Path to the dataset CSV. Overrides the data file specified in the \
                             configuration file; the embedded sample is used when neither is set.",
                        )
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_dir")
                        .short('o')
                        .long("output-dir")
                        .help("Directory the model bundle and report are written to")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("imputation")
                        .long("imputation")
                        .help("Records used for the imputation medians")
                        .value_parser(["full_dataset", "training_partition"]),
                )
                .arg(
                    Arg::new("cv_folds")
                        .long("cv-folds")
                        .help("Cross-validation folds (default: 5 for 200+ training rows, else 3)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("no_report")
                        .long("no-report")
                        .help("Disable HTML report generation.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(predict)
        .subcommand(
            Command::new("history")
                .about("Show or export a subject's prediction history")
                .arg(
                    Arg::new("subject")
                        .help("Subject identifier")
                        .required(true)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(history_arg())
                .arg(
                    Arg::new("csv")
                        .long("csv")
                        .help("Export the history to this CSV file")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("html")
                        .long("html")
                        .help("Write an HTML trend report to this file")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("clear")
                        .long("clear")
                        .help("Delete the subject's history")
                        .action(ArgAction::SetTrue)
                        .conflicts_with_all(["csv", "html"]),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
}

fn history_arg() -> Arg {
    Arg::new("history")
        .long("history")
        .help("Prediction history file")
        .default_value(DEFAULT_HISTORY)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("DIARISK_LOG", "error,diarisk=info"))
        .init();

    let matches = build_cli().get_matches();

    let result = match matches.subcommand() {
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("predict", sub_m)) => handle_predict(sub_m),
        Some(("history", sub_m)) => handle_history(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    };
    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config = config_from_arguments(matches)?;
    if matches.get_one::<PathBuf>("config").is_none() {
        let default_json = serde_json::to_string_pretty(&config).unwrap_or_default();
        log::info!("[diarisk::train] Effective config:\n{}", default_json);
    }
    let outcome = run_train(&config)?;
    print!("{}", format_summary(&outcome));
    println!("Model saved to {}", config.output_dir.display());
    Ok(())
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let records = match matches.get_one::<PathBuf>("input") {
        Some(path) => load_records_json(path)?,
        None => vec![record_from_arguments(matches)?],
    };
    let options = PredictOptions {
        subject: matches.get_one::<String>("subject").cloned(),
        history: matches
            .get_one::<PathBuf>("history")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY)),
        report_csv: matches.get_one::<PathBuf>("report").cloned(),
    };
    let model_dir = matches
        .get_one::<PathBuf>("model_dir")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("model"));

    let (_, assessments) = run_predict(&model_dir, &records, &options)?;
    if matches.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&assessments)?);
    } else {
        for (record, assessment) in records.iter().zip(&assessments) {
            print!("{}", format_assessment(record, assessment));
        }
    }
    Ok(())
}

fn handle_history(matches: &ArgMatches) -> Result<()> {
    let subject = matches
        .get_one::<String>("subject")
        .map(String::as_str)
        .unwrap_or_default();
    let history = matches
        .get_one::<PathBuf>("history")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY));

    if matches.get_flag("clear") {
        let removed = clear_history(&history, subject)?;
        println!("Removed {} assessment(s) for '{}'", removed, subject);
        return Ok(());
    }

    let csv = matches.get_one::<PathBuf>("csv");
    let html = matches.get_one::<PathBuf>("html");
    let entries = run_history(
        &history,
        subject,
        csv.map(PathBuf::as_path),
        html.map(PathBuf::as_path),
    )?;
    print!("{}", format_history(subject, &entries));
    Ok(())
}
