pub mod time;
pub mod task;
pub mod arrival;
pub mod demand;
pub mod taskset;
pub mod fixed_point;
pub mod fixed_priority;
pub mod chain;
pub mod simulator;
pub mod e2e;
pub mod perturb;
pub mod source;
pub mod config;
pub mod batch;
