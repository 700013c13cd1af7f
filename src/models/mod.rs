pub mod assignment;
pub mod course;
pub mod question;
pub mod resource;

pub use assignment::Assignment;
pub use course::Course;
pub use question::{AiAnswer, AnswerType, ChoiceAnswer, Question, QuestionBody};
pub use resource::{PageImageMap, PreviewDocument, Resource, ResourceKind};
