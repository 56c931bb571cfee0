pub mod answer_encoding;
pub mod answer_record;
pub mod module;
pub mod module_progress;
pub mod question;
pub mod quiz_result;
pub mod session_state;
pub use answer_record::AnswerRecord;
pub use module::{Module, ModuleStatus, ModuleWithProgress};
pub use module_progress::ModuleProgress;
pub use question::Question;
pub use quiz_result::{Feedback, QuizResult};
pub use session_state::{AnswerOutcome, Navigation, SessionState};
