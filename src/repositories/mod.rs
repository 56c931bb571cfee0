pub mod answer_repository;
pub mod in_memory;
pub mod progress_repository;

pub use answer_repository::{AnswerRepository, MongoAnswerRepository};
pub use in_memory::{InMemoryAnswerRepository, InMemoryProgressRepository};
pub use progress_repository::{MongoProgressRepository, ProgressRepository};
