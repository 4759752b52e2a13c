mod model;

pub use model::Project;
