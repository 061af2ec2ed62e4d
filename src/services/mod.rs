pub mod aggregator;
pub mod csv_parser;
pub mod flow_graph;
