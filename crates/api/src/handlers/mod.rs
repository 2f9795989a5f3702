pub mod agent;
pub mod article;
