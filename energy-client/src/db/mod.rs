pub mod jahresmessung_queries;
pub mod report_queries;
