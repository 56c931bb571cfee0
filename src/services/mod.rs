pub mod module_list;
pub mod quiz_session;
pub mod quiz_source;

pub use module_list::{classify_fetch_error, FetchErrorCategory, ModuleListService, ModuleListState};
pub use quiz_session::{QuizSession, SessionSettings};
pub use quiz_source::{HttpQuizSource, QuizSource};
