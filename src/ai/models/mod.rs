pub mod generative_model;
