//! Post-processing of model replies: everything between "the endpoint returned text" and
//! "the lesson got the value it asked for".

pub mod extract;
pub mod json;
