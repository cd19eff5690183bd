pub mod response;
pub mod result;
pub mod survey;
