pub mod dataset_csv;
pub mod report_csv;

pub use dataset_csv::{read_dataset, read_dataset_csv, sample_dataset};
pub use report_csv::{write_assessments_csv, write_assessments_csv_file};
