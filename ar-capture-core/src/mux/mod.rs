pub mod synchronizer;
