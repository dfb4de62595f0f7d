//! End-to-end controller tests against the mock collaborators.
//!
//! These drive a full quiz (generate, answer, save) the way the `play`
//! command does, without touching the network or disk.

use std::sync::Arc;

use quizkit_core::controller::{QuizController, ResponseOutcome, SaveOutcome};
use quizkit_core::error::GenerationError;
use quizkit_core::model::{Phase, SaveStatus, ScoreSubmission};
use quizkit_core::traits::QuizGenerator;
use quizkit_providers::mock::{MockGenerator, MockScoreStore};

const QUIZ: &str = "Q1. What is the capital of France?\na) London\nb) Paris\nc) Rome\nAnswer: b\n\nQ2. What is 2 + 2?\na) 3\nb) 4\nAnswer: b\n";

fn setup(text: &str) -> (Arc<MockGenerator>, Arc<MockScoreStore>, QuizController) {
    let generator = Arc::new(MockGenerator::with_fixed_response(text));
    let store = Arc::new(MockScoreStore::new());
    let controller = QuizController::new(generator.clone(), store.clone());
    (generator, store, controller)
}

#[tokio::test]
async fn full_quiz_is_saved_exactly_once() {
    let (generator, store, mut controller) = setup(QUIZ);

    let outcome = controller.generate("Geography", 5).await.unwrap();
    assert_eq!(outcome, ResponseOutcome::Applied);
    assert_eq!(generator.call_count(), 1);

    assert!(controller.select(0, "b) Paris"));
    assert_eq!(controller.reveal(0), Some(true));
    assert!(controller.select(1, "a) 3"));
    assert_eq!(controller.reveal(1), Some(false));

    let session = controller.session().unwrap();
    assert_eq!(session.score(), 1);
    assert_eq!(session.answered_count(), 2);
    assert!(session.states().iter().all(|s| s.phase == Phase::Revealed));

    let expected = ScoreSubmission {
        topic: "Geography".into(),
        score: 1,
        total: 2,
    };
    assert_eq!(
        controller.try_save_score().await,
        SaveOutcome::Saved(expected.clone())
    );
    assert_eq!(controller.try_save_score().await, SaveOutcome::AlreadySaved);
    assert_eq!(store.saved(), vec![expected]);
    assert_eq!(store.call_count(), 1);
}

#[tokio::test]
async fn failed_save_can_be_retried() {
    let (_generator, store, mut controller) = setup(QUIZ);
    store.fail_times(1);

    controller.generate("Geography", 5).await.unwrap();
    for (index, option) in [(0, "b) Paris"), (1, "b) 4")] {
        controller.select(index, option);
        controller.reveal(index);
    }

    assert!(matches!(
        controller.try_save_score().await,
        SaveOutcome::Failed(_)
    ));
    assert_eq!(
        controller.session().unwrap().save_status(),
        SaveStatus::NotSaved
    );

    assert!(matches!(
        controller.try_save_score().await,
        SaveOutcome::Saved(_)
    ));
    assert_eq!(store.saved().len(), 1);
    assert_eq!(store.call_count(), 2);
}

#[tokio::test]
async fn superseded_response_is_ignored() {
    let (generator, _store, mut controller) = setup(QUIZ);

    let first = controller.begin_request("Geography", 5).unwrap();
    let second = controller.begin_request("Arithmetic", 5).unwrap();

    let late = generator.generate(&first.request).await;
    assert_eq!(controller.apply_response(&first, late), ResponseOutcome::Stale);
    assert!(controller.is_loading());

    let fresh = generator.generate(&second.request).await;
    assert_eq!(
        controller.apply_response(&second, fresh),
        ResponseOutcome::Applied
    );
    assert_eq!(controller.session().unwrap().topic, "Arithmetic");
}

#[tokio::test]
async fn rate_limit_surfaces_busy_message() {
    let (generator, _store, mut controller) = setup(QUIZ);
    generator.fail_next(GenerationError::RateLimited {
        retry_after_ms: 5000,
    });

    let outcome = controller.generate("Geography", 5).await.unwrap();
    assert_eq!(
        outcome,
        ResponseOutcome::Failed("System is busy, please try again in a moment.".into())
    );
    assert!(controller.session().is_none());
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn fallback_session_is_never_saved() {
    let (_generator, store, mut controller) = setup("I could not write a quiz about that.");

    controller.generate("Geography", 5).await.unwrap();
    let session = controller.session().unwrap();
    assert!(session.is_fallback());
    assert_eq!(
        session.raw_text(),
        Some("I could not write a quiz about that.")
    );

    assert_eq!(controller.try_save_score().await, SaveOutcome::NotReady);
    assert_eq!(store.call_count(), 0);
}
