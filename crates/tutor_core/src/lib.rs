pub mod access;
pub mod data_uri;
pub mod dispatcher;
pub mod domain;
pub mod materials;
pub mod ports;
pub mod prompt;
pub mod schema;
pub mod validation;

#[cfg(test)]
mod testing;

pub use data_uri::DataUri;
pub use dispatcher::{DocumentAnalyzer, TutorDispatcher};
pub use domain::{
    AnswerEvaluation, AnswerEvaluationRequest, ChatTurn, KeywordDefinition, NewUser,
    Role, Sender, SimpleAnswer, StudyMaterialBundle, TokenPurpose, TutorRequest, TutorResponse,
    UserCredentials, UserRecord,
};
pub use materials::{AnswerEvaluator, StudyMaterialGenerator};
pub use ports::{
    DatabaseService, GenerationReply, GenerationRequest, GenerationService, MailService,
    OutputContract, PortError, PortResult, ToolDeclaration,
};
