// Business domains
pub mod companies;
