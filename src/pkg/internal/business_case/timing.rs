use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::pkg::internal::adaptors::{
    business_cases::spec::BusinessCaseEntry, responses::spec::ResponseEntry,
};

/// Completion later than this after the link was opened flags the application as delayed.
pub const DELAY_THRESHOLD: Duration = Duration::hours(24);

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub completed_at: DateTime<Utc>,
    pub response_time_minutes: Option<i32>,
    pub delayed: bool,
}

impl Completion {
    pub fn at(link_opened_at: Option<DateTime<Utc>>, completed_at: DateTime<Utc>) -> Self {
        match link_opened_at {
            Some(opened) => {
                let elapsed = completed_at - opened;
                Completion {
                    completed_at,
                    response_time_minutes: Some(i32::try_from(elapsed.num_minutes().max(0)).unwrap_or(i32::MAX)),
                    delayed: elapsed > DELAY_THRESHOLD,
                }
            }
            None => Completion {
                completed_at,
                response_time_minutes: None,
                delayed: false,
            },
        }
    }
}

/// Question ids with a stored video.
pub fn answered_ids(responses: &[ResponseEntry]) -> HashSet<Uuid> {
    responses
        .iter()
        .filter(|r| r.is_answered())
        .map(|r| r.business_case_id)
        .collect()
}

/// Index of the lowest-numbered question without an answer, `None` once all are answered.
pub fn resume_index(questions: &[BusinessCaseEntry], answered: &HashSet<Uuid>) -> Option<usize> {
    questions.iter().position(|q| !answered.contains(&q.id))
}

pub fn all_answered(questions: &[BusinessCaseEntry], answered: &HashSet<Uuid>) -> bool {
    !questions.is_empty() && questions.iter().all(|q| answered.contains(&q.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions(n: usize) -> Vec<BusinessCaseEntry> {
        let job_id = Uuid::new_v4();
        (0..n)
            .map(|i| BusinessCaseEntry {
                id: Uuid::new_v4(),
                job_id,
                question_number: i as i32 + 1,
                question_title: format!("q{i}"),
                question_description: String::new(),
                video_url: None,
                enable_text_response: false,
                created_at: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn test_delayed_after_25_hours() {
        let opened = Utc::now();
        let completion = Completion::at(Some(opened), opened + Duration::hours(25));
        assert!(completion.delayed);
        assert_eq!(completion.response_time_minutes, Some(25 * 60));
    }

    #[test]
    fn test_not_delayed_after_23_hours() {
        let opened = Utc::now();
        let completion = Completion::at(Some(opened), opened + Duration::hours(23));
        assert!(!completion.delayed);
        assert_eq!(completion.response_time_minutes, Some(23 * 60));
    }

    #[test]
    fn test_response_time_saturates() {
        let opened = Utc::now() - Duration::days(365 * 5000);
        let c = Completion::at(Some(opened), Utc::now());
        assert_eq!(c.response_time_minutes, Some(i32::MAX));
        assert!(c.delayed);
    }

    #[test]
    fn test_without_link_open_there_is_no_clock() {
        let completion = Completion::at(None, Utc::now());
        assert!(!completion.delayed);
        assert_eq!(completion.response_time_minutes, None);
    }

    #[test]
    fn test_resume_at_lowest_unanswered() {
        let qs = questions(4);
        let answered: HashSet<Uuid> = [qs[0].id, qs[2].id].into_iter().collect();
        assert_eq!(resume_index(&qs, &answered), Some(1));

        let answered: HashSet<Uuid> = [qs[1].id, qs[2].id, qs[3].id].into_iter().collect();
        assert_eq!(resume_index(&qs, &answered), Some(0));

        let answered: HashSet<Uuid> = qs.iter().map(|q| q.id).collect();
        assert_eq!(resume_index(&qs, &answered), None);
        assert!(all_answered(&qs, &answered));
    }

    #[test]
    fn test_gap_blocks_completion() {
        let qs = questions(3);
        let answered: HashSet<Uuid> = [qs[0].id, qs[2].id].into_iter().collect();
        assert!(!all_answered(&qs, &answered));
        assert!(!all_answered(&[], &HashSet::new()));
    }
}
