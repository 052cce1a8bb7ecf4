// Account-side endpoints: the resume text used to personalize letters, and usage.

pub mod handlers;
pub mod store;
