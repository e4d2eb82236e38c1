pub mod jahresmessung_csv_file;

pub use jahresmessung_csv_file::JahresmessungCsvFileSource;
