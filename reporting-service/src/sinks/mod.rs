pub mod sqlite_jahresmessung;

pub use sqlite_jahresmessung::SqliteJahresmessungSink;
