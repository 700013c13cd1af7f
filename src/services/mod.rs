pub mod assignment_paginator;
pub mod course_service;
pub mod llm_service;
pub mod pdf_assembler;
pub mod question_extractor;
pub mod question_service;
pub mod resource_navigator;
pub mod selection;

#[cfg(test)]
pub(crate) mod test_support;

pub use assignment_paginator::{AssignmentPaginator, ListingTokenSource};
pub use course_service::CourseService;
pub use llm_service::{AnswerSolver, LlmService};
pub use pdf_assembler::{AssemblyReport, PdfAssembler};
pub use question_extractor::{normalize_answers, normalize_title};
pub use question_service::QuestionService;
pub use resource_navigator::ResourceNavigator;
pub use selection::{OperatorConsole, ScriptedConsole, Selection, StdConsole};
