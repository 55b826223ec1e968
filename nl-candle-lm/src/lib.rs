pub mod optimizer;
pub mod sequential;
