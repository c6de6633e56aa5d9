//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-request signed-in user.

use crate::config::Config;
use std::sync::Arc;
use tutor_core::domain::UserRecord;
use tutor_core::ports::{DatabaseService, GenerationService, MailService};
use tutor_core::validation::SignupPolicy;
use tutor_core::{AnswerEvaluator, DocumentAnalyzer, StudyMaterialGenerator, TutorDispatcher};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub mailer: Arc<dyn MailService>,
    pub config: Arc<Config>,
    pub signup_policy: SignupPolicy,
    pub dispatcher: TutorDispatcher,
    pub analyzer: DocumentAnalyzer,
    pub materials: StudyMaterialGenerator,
    pub evaluator: AnswerEvaluator,
}

impl AppState {
    /// Wires the tutor services to one generation backend.
    pub fn new(
        config: Arc<Config>,
        db: Arc<dyn DatabaseService>,
        mailer: Arc<dyn MailService>,
        generator: Arc<dyn GenerationService>,
    ) -> Self {
        Self {
            signup_policy: SignupPolicy::new(config.allowed_email_domains.clone()),
            dispatcher: TutorDispatcher::new(generator.clone()),
            analyzer: DocumentAnalyzer::new(generator.clone()),
            materials: StudyMaterialGenerator::new(generator.clone()),
            evaluator: AnswerEvaluator::new(generator),
            db,
            mailer,
            config,
        }
    }
}

//=========================================================================================
// CurrentUser (Specific to One Request)
//=========================================================================================

/// The signed-in user, freshly loaded by `require_auth` and stored in request extensions.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub UserRecord);
