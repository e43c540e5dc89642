pub mod data_streams;
