pub mod drughoto;

pub mod error;
