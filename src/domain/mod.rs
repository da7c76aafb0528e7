pub mod candidate_page;
pub mod contact;
pub mod executive;
pub mod organization;
pub mod report;
pub mod summary;
