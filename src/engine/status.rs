use chrono::{DateTime, Utc};

use crate::model::common::{Poll, PollStatus};

/// Derive the status of `poll` at the instant `now`.
///
/// Both boundaries belong to the voting window: a poll is ongoing at exactly
/// its start time and at exactly its end time.
pub fn status_at(poll: &Poll, now: DateTime<Utc>) -> PollStatus {
    if now < poll.start_time {
        PollStatus::Upcoming
    } else if now <= poll.end_time {
        PollStatus::Ongoing
    } else {
        PollStatus::Ended
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn boundaries_are_ongoing() {
        let poll = Poll::example();
        let start = poll.start_time;
        let end = poll.end_time;
        let tick = Duration::milliseconds(1);

        assert_eq!(status_at(&poll, start - tick), PollStatus::Upcoming);
        assert_eq!(status_at(&poll, start), PollStatus::Ongoing);
        assert_eq!(status_at(&poll, start + Duration::hours(12)), PollStatus::Ongoing);
        assert_eq!(status_at(&poll, end), PollStatus::Ongoing);
        assert_eq!(status_at(&poll, end + tick), PollStatus::Ended);
    }

    #[test]
    fn status_of_new_year_poll() {
        let poll = Poll::example();

        assert_eq!(
            status_at(&poll, Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap()),
            PollStatus::Upcoming
        );
        assert_eq!(
            status_at(&poll, Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
            PollStatus::Ongoing
        );
        assert_eq!(
            status_at(&poll, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 1).unwrap()),
            PollStatus::Ended
        );
    }

    #[test]
    fn status_never_goes_backwards() {
        let poll = Poll::example();
        let mut previous = PollStatus::Upcoming;
        let mut now = Utc.with_ymd_and_hms(2023, 12, 31, 12, 0, 0).unwrap();
        while now < Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap() {
            let status = status_at(&poll, now);
            assert!(status >= previous);
            previous = status;
            now += Duration::minutes(17);
        }
        assert_eq!(previous, PollStatus::Ended);
    }

    #[test]
    fn instant_poll_is_ongoing_for_one_instant() {
        let instant = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let poll = Poll::example_between(instant, instant);
        assert_eq!(status_at(&poll, instant), PollStatus::Ongoing);
        assert_eq!(
            status_at(&poll, instant + Duration::milliseconds(1)),
            PollStatus::Ended
        );
    }
}
