pub mod extract;
pub mod report;
pub mod score;
