pub mod offering_reader;
pub mod report_writer;
