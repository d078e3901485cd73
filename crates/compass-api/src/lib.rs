//! JSON REST API for the compass quiz.
//!
//! Exposes an axum [`Router`] backed by any store implementing
//! [`Repository`] for every entity. Auth, TLS, and transport concerns are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(compass_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod query;
pub mod resource;
pub mod results;
pub mod sources;
pub mod views;

use std::sync::Arc;

use axum::{Router, routing::get};
use compass_core::{
  answer::Answer, party::Party, question::Question, result::QuizResult,
  source::Source, store::Repository,
};

pub use error::ApiError;

/// A store that persists every compass entity.
pub trait CompassStore:
  Repository<Source>
  + Repository<Question>
  + Repository<Party>
  + Repository<Answer>
  + Repository<QuizResult>
  + 'static
{
}

impl<S> CompassStore for S where
  S: Repository<Source>
    + Repository<Question>
    + Repository<Party>
    + Repository<Answer>
    + Repository<QuizResult>
    + 'static
{
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S: CompassStore>(store: Arc<S>) -> Router<()> {
  use resource::{create, get_one, list, remove, update};

  Router::new()
    // Sources
    .route("/sources", get(sources::list::<S>).post(create::<Source, S>))
    .route(
      "/sources/{id}",
      get(sources::get_one::<S>)
        .put(update::<Source, S>)
        .patch(update::<Source, S>)
        .delete(remove::<Source, S>),
    )
    // Questions
    .route("/questions", get(list::<Question, S>).post(create::<Question, S>))
    .route(
      "/questions/{id}",
      get(get_one::<Question, S>)
        .put(update::<Question, S>)
        .patch(update::<Question, S>)
        .delete(remove::<Question, S>),
    )
    // Parties
    .route("/parties", get(list::<Party, S>).post(create::<Party, S>))
    .route(
      "/parties/{id}",
      get(get_one::<Party, S>)
        .put(update::<Party, S>)
        .patch(update::<Party, S>)
        .delete(remove::<Party, S>),
    )
    // Answers
    .route("/answers", get(list::<Answer, S>).post(create::<Answer, S>))
    .route(
      "/answers/{question_id}/{party_id}",
      get(get_one::<Answer, S>)
        .put(update::<Answer, S>)
        .patch(update::<Answer, S>)
        .delete(remove::<Answer, S>),
    )
    // Results
    .route("/results", get(list::<QuizResult, S>).post(results::submit::<S>))
    .route(
      "/results/{id}",
      get(get_one::<QuizResult, S>)
        .put(update::<QuizResult, S>)
        .patch(update::<QuizResult, S>)
        .delete(remove::<QuizResult, S>),
    )
    .with_state(store)
}
