//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod audio;
pub mod ids;
pub mod lang;
pub mod pagination;
pub mod problem;
pub mod study;
pub mod user;
pub mod validation;
pub mod version;
pub mod workbook;

pub use audio::Audio;
pub use ids::{AppUserId, AudioId, OrganizationId, ProblemId, WorkbookId};
pub use lang::Lang2;
pub use pagination::{Paginated, Pagination, PaginationParams};
pub use problem::{
    validate_number, EnglishPhraseProperties, EnglishSentenceProperties, EnglishWordProperties,
    NewProblem, PartOfSpeech, Problem, ProblemFields, ProblemProperties, ProblemType, ProblemUpdate,
};
pub use study::{
    CompletionRate, Recordbook, RecordbookEntry, StudyAnswer, StudyRecord, StudyType, MAX_LEVEL,
};
pub use user::{validate_login_id, AppUser, UserRole};
pub use validation::ValidationError;
pub use version::Version;
pub use workbook::{NewWorkbook, QuestionText, Workbook, WorkbookFields, WorkbookName, WorkbookUpdate};
