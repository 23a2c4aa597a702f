pub mod config;
pub mod correlator;
pub mod events;
pub mod models;
pub mod monitor;
pub mod normalizer;
pub mod report_worker;
pub mod rpc;
pub mod seen;
pub mod supervisor;
pub mod token;
pub mod watchlist;
