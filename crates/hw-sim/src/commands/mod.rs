pub mod bounds;
pub mod centers;
pub mod inspect;
pub mod render;
pub mod resume;
pub mod run;
