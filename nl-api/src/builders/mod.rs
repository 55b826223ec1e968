pub mod noise_learning;
pub mod swap_policy;
