pub mod generator;
pub mod indexed;
pub mod ordered;
pub mod perturb;
pub mod search;
