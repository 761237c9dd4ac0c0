//! Progressive lesson/quiz state machine.
//!
//! `CourseProgress` is the learner-wide part (which lessons are unlocked and
//! which quizzes were passed) and lives as long as the learner session.
//! `CourseView` is the per-visit part (active lesson, current quiz attempt)
//! and is thrown away whenever the learner leaves the course module.
//!
//! A correct answer does not unlock anything by itself: it yields
//! `QuizOutcome::Correct`, and the owner calls `CourseProgress::record_pass`
//! once the feedback delay has elapsed.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::{Lesson, Quiz};

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LessonState {
  Locked,
  /// Unlocked, has a quiz that still gates the next lesson.
  UnlockedPending,
  UnlockedCleared,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CourseProgress {
  unlocked_count: usize,
  passed: BTreeSet<usize>,
  total: usize,
}

impl CourseProgress {
  pub fn new(total: usize) -> Self {
    Self { unlocked_count: 1, passed: BTreeSet::new(), total }
  }

  pub fn unlocked_count(&self) -> usize {
    self.unlocked_count
  }

  pub fn total(&self) -> usize {
    self.total
  }

  pub fn is_unlocked(&self, index: usize) -> bool {
    index < self.unlocked_count && index < self.total
  }

  pub fn is_passed(&self, index: usize) -> bool {
    self.passed.contains(&index)
  }

  pub fn lesson_state(&self, lesson: &Lesson) -> LessonState {
    if !self.is_unlocked(lesson.index) {
      LessonState::Locked
    } else if lesson.quiz.is_some() && !self.is_passed(lesson.index) {
      LessonState::UnlockedPending
    } else {
      LessonState::UnlockedCleared
    }
  }

  /// Mark an unlocked lesson's quiz as passed and unlock one more lesson.
  /// Returns false (no change) if the lesson is locked or already passed.
  pub fn record_pass(&mut self, index: usize) -> bool {
    if !self.is_unlocked(index) || !self.passed.insert(index) {
      return false;
    }
    self.unlocked_count = (self.unlocked_count + 1).min(self.total.max(1));
    true
  }
}

/// Selection state of the quiz currently on screen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuizAttempt {
  pub selected: Option<usize>,
  pub submitted: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuizOutcome {
  Correct { lesson: usize, explanation: String },
  Incorrect { chosen: usize, correct_option_index: usize },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CourseView {
  active_lesson: usize,
  attempt: QuizAttempt,
}

impl CourseView {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn active_lesson(&self) -> usize {
    self.active_lesson
  }

  pub fn attempt(&self) -> &QuizAttempt {
    &self.attempt
  }

  /// The quiz shown for the active lesson, if it still gates progress.
  pub fn gating_quiz<'a>(&self, lessons: &'a [Lesson], progress: &CourseProgress) -> Option<&'a Quiz> {
    let lesson = lessons.get(self.active_lesson)?;
    match progress.lesson_state(lesson) {
      LessonState::UnlockedPending => lesson.quiz.as_ref(),
      _ => None,
    }
  }

  /// Navigate to a lesson. Locked or unknown lessons are a rejected no-op.
  /// Navigating (even to the same lesson) starts a fresh quiz attempt.
  pub fn select_lesson(&mut self, lessons: &[Lesson], progress: &CourseProgress, index: usize) -> bool {
    if index >= lessons.len() || !progress.is_unlocked(index) {
      return false;
    }
    self.active_lesson = index;
    self.attempt = QuizAttempt::default();
    true
  }

  /// Highlight an option before submitting.
  pub fn choose_option(&mut self, lessons: &[Lesson], progress: &CourseProgress, option: usize) -> bool {
    let Some(quiz) = self.gating_quiz(lessons, progress) else { return false };
    if self.attempt.submitted || option >= quiz.options.len() {
      return false;
    }
    self.attempt.selected = Some(option);
    true
  }

  /// Check an answer. `option` overrides the highlighted choice when given.
  /// Returns `None` (no state change) with nothing chosen, no gating quiz,
  /// an out-of-range option, or an attempt that was already checked.
  pub fn submit_answer(&mut self, lessons: &[Lesson], progress: &CourseProgress, option: Option<usize>) -> Option<QuizOutcome> {
    let quiz = self.gating_quiz(lessons, progress)?;
    if self.attempt.submitted {
      return None;
    }
    let chosen = option.or(self.attempt.selected)?;
    if chosen >= quiz.options.len() {
      return None;
    }
    self.attempt = QuizAttempt { selected: Some(chosen), submitted: true };
    if chosen == quiz.correct_option_index {
      Some(QuizOutcome::Correct { lesson: self.active_lesson, explanation: quiz.explanation.clone() })
    } else {
      Some(QuizOutcome::Incorrect { chosen, correct_option_index: quiz.correct_option_index })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::seeds::builtin_lessons;

  fn quiz(correct: usize) -> Quiz {
    Quiz {
      question: "q".into(),
      options: vec!["a".into(), "b".into(), "c".into()],
      correct_option_index: correct,
      explanation: "because".into(),
    }
  }

  fn lessons(quizzes: &[Option<usize>]) -> Vec<Lesson> {
    quizzes
      .iter()
      .enumerate()
      .map(|(index, q)| Lesson { index, title: format!("L{index}"), content: vec![], quiz: q.map(quiz) })
      .collect()
  }

  #[test]
  fn only_unlocked_lessons_are_selectable() {
    let ls = builtin_lessons();
    let mut progress = CourseProgress::new(ls.len());
    let mut view = CourseView::new();
    for _ in 0..3 {
      for i in 0..ls.len() + 2 {
        let before = view.clone();
        let ok = view.select_lesson(&ls, &progress, i);
        assert_eq!(ok, i < progress.unlocked_count() && i < ls.len(), "lesson {i}");
        if !ok {
          assert_eq!(view, before);
        }
      }
      progress.record_pass(progress.unlocked_count() - 1);
    }
  }

  #[test]
  fn scenario_pass_first_quiz_unlocks_second_lesson() {
    let ls = builtin_lessons();
    let mut progress = CourseProgress::new(ls.len());
    let mut view = CourseView::new();

    assert!(!view.select_lesson(&ls, &progress, 1));
    assert_eq!(view.active_lesson(), 0);

    let correct = ls[0].quiz.as_ref().unwrap().correct_option_index;
    let outcome = view.submit_answer(&ls, &progress, Some(correct));
    assert!(matches!(outcome, Some(QuizOutcome::Correct { lesson: 0, .. })));
    assert_eq!(progress.unlocked_count(), 1, "unlock waits for the delay");

    assert!(progress.record_pass(0));
    assert_eq!(progress.unlocked_count(), 2);
    assert!(view.select_lesson(&ls, &progress, 1));
  }

  #[test]
  fn incorrect_answer_never_unlocks_and_locks_attempt() {
    let ls = lessons(&[Some(1), Some(0)]);
    let progress = CourseProgress::new(ls.len());
    let mut view = CourseView::new();

    let outcome = view.submit_answer(&ls, &progress, Some(2));
    assert_eq!(outcome, Some(QuizOutcome::Incorrect { chosen: 2, correct_option_index: 1 }));
    assert_eq!(progress.unlocked_count(), 1);

    // Same visit: answering again is rejected, even with the right option.
    assert_eq!(view.submit_answer(&ls, &progress, Some(1)), None);
    assert!(!view.choose_option(&ls, &progress, 1));

    // Navigating back starts a fresh attempt.
    assert!(view.select_lesson(&ls, &progress, 0));
    assert_eq!(view.attempt(), &QuizAttempt::default());
    assert!(matches!(view.submit_answer(&ls, &progress, Some(1)), Some(QuizOutcome::Correct { .. })));
  }

  #[test]
  fn submit_without_choice_is_a_noop() {
    let ls = lessons(&[Some(0), None]);
    let progress = CourseProgress::new(ls.len());
    let mut view = CourseView::new();
    let before = view.clone();
    assert_eq!(view.submit_answer(&ls, &progress, None), None);
    assert_eq!(view, before);

    assert!(view.choose_option(&ls, &progress, 0));
    assert_eq!(view.attempt().selected, Some(0));
    assert!(matches!(view.submit_answer(&ls, &progress, None), Some(QuizOutcome::Correct { .. })));
  }

  #[test]
  fn out_of_range_option_is_rejected() {
    let ls = lessons(&[Some(0)]);
    let progress = CourseProgress::new(ls.len());
    let mut view = CourseView::new();
    assert!(!view.choose_option(&ls, &progress, 3));
    assert_eq!(view.submit_answer(&ls, &progress, Some(3)), None);
    assert!(!view.attempt().submitted);
  }

  #[test]
  fn pass_is_recorded_once_and_capped() {
    let ls = lessons(&[Some(0), Some(0)]);
    let mut progress = CourseProgress::new(ls.len());
    assert!(progress.record_pass(0));
    assert!(!progress.record_pass(0), "second pass of the same lesson");
    assert_eq!(progress.unlocked_count(), 2);
    assert!(progress.record_pass(1));
    assert_eq!(progress.unlocked_count(), 2, "capped at lesson count");
    assert!(!progress.record_pass(5));
  }

  #[test]
  fn cleared_lessons_hide_their_quiz() {
    let ls = lessons(&[Some(0), None, Some(2)]);
    let mut progress = CourseProgress::new(ls.len());
    let mut view = CourseView::new();
    assert_eq!(progress.lesson_state(&ls[0]), LessonState::UnlockedPending);
    assert!(view.gating_quiz(&ls, &progress).is_some());

    progress.record_pass(0);
    assert_eq!(progress.lesson_state(&ls[0]), LessonState::UnlockedCleared);
    assert_eq!(progress.lesson_state(&ls[1]), LessonState::UnlockedCleared);
    assert_eq!(progress.lesson_state(&ls[2]), LessonState::Locked);

    assert!(view.select_lesson(&ls, &progress, 0));
    assert!(view.gating_quiz(&ls, &progress).is_none());
    assert_eq!(view.submit_answer(&ls, &progress, Some(0)), None);

    // A quizless lesson never gates, so nothing moves past it.
    assert!(view.select_lesson(&ls, &progress, 1));
    assert_eq!(view.submit_answer(&ls, &progress, Some(0)), None);
  }

  #[test]
  fn progress_is_monotonic_over_a_full_run() {
    let ls = builtin_lessons();
    let mut progress = CourseProgress::new(ls.len());
    let mut last = progress.unlocked_count();
    for _ in 0..ls.len() * 2 {
      let mut view = CourseView::new();
      let gating = progress.unlocked_count() - 1;
      view.select_lesson(&ls, &progress, gating);
      if let Some(QuizOutcome::Correct { lesson, .. }) =
        view.submit_answer(&ls, &progress, ls[gating].quiz.as_ref().map(|q| q.correct_option_index))
      {
        progress.record_pass(lesson);
      }
      assert!(progress.unlocked_count() >= last);
      assert!(progress.unlocked_count() <= ls.len());
      last = progress.unlocked_count();
    }
    assert_eq!(progress.unlocked_count(), ls.len());
  }
}
