//! Intent tags and confidence buckets.

use serde::{Deserialize, Serialize};

/// The classified purpose of a chat message.
///
/// Chosen once per request by the router; never revised afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    AssistantLookup,
    CourseInformation,
    ScheduleLookup,
    AssignmentLookup,
    GradeLookup,
    Greeting,
    AboutBot,
    AboutStudent,
    AboutCreator,
    Kidding,
    Unknown,
}

impl Intent {
    pub const ALL: [Intent; 11] = [
        Self::AssistantLookup,
        Self::CourseInformation,
        Self::ScheduleLookup,
        Self::AssignmentLookup,
        Self::GradeLookup,
        Self::Greeting,
        Self::AboutBot,
        Self::AboutStudent,
        Self::AboutCreator,
        Self::Kidding,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssistantLookup => "assistant_lookup",
            Self::CourseInformation => "course_information",
            Self::ScheduleLookup => "schedule_lookup",
            Self::AssignmentLookup => "assignment_lookup",
            Self::GradeLookup => "grade_lookup",
            Self::Greeting => "greeting",
            Self::AboutBot => "about_bot",
            Self::AboutStudent => "about_student",
            Self::AboutCreator => "about_creator",
            Self::Kidding => "kidding",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the reply phrase depends on a match-quality score.
    pub fn is_graded(&self) -> bool {
        matches!(self, Self::AssistantLookup | Self::ScheduleLookup)
    }

}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of a 0–100 match-quality score.
///
/// `[0, 30)` is NotSure, `[30, 60)` is Doubt, `[60, 100]` is Confident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBucket {
    NotSure,
    Doubt,
    Confident,
}

impl ConfidenceBucket {
    pub const ALL: [ConfidenceBucket; 3] = [Self::NotSure, Self::Doubt, Self::Confident];

    /// Lower bound (inclusive) of the Doubt bucket.
    pub const DOUBT_FLOOR: f64 = 30.0;
    /// Lower bound (inclusive) of the Confident bucket.
    pub const CONFIDENT_FLOOR: f64 = 60.0;

    /// Classify a score. Out-of-range scores are clamped to `[0, 100]`; NaN is NotSure.
    pub fn from_score(score: f64) -> Self {
        if score.is_nan() {
            return Self::NotSure;
        }
        let score = score.clamp(0.0, 100.0);
        if score >= Self::CONFIDENT_FLOOR {
            Self::Confident
        } else if score >= Self::DOUBT_FLOOR {
            Self::Doubt
        } else {
            Self::NotSure
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotSure => "notsure",
            Self::Doubt => "doubt",
            Self::Confident => "confident",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_boundaries() {
        assert_eq!(ConfidenceBucket::from_score(0.0), ConfidenceBucket::NotSure);
        assert_eq!(ConfidenceBucket::from_score(29.999), ConfidenceBucket::NotSure);
        assert_eq!(ConfidenceBucket::from_score(30.0), ConfidenceBucket::Doubt);
        assert_eq!(ConfidenceBucket::from_score(59.999), ConfidenceBucket::Doubt);
        assert_eq!(ConfidenceBucket::from_score(60.0), ConfidenceBucket::Confident);
        assert_eq!(ConfidenceBucket::from_score(100.0), ConfidenceBucket::Confident);
    }

    #[test]
    fn bucket_partition_is_total() {
        // Every hundredth of a point lands in exactly one bucket, in order.
        let mut last = ConfidenceBucket::NotSure;
        for step in 0..=10_000 {
            let bucket = ConfidenceBucket::from_score(step as f64 / 100.0);
            let rank = |b: ConfidenceBucket| ConfidenceBucket::ALL.iter().position(|x| *x == b);
            assert!(rank(bucket) >= rank(last), "buckets must not go backwards");
            last = bucket;
        }
        assert_eq!(last, ConfidenceBucket::Confident);
    }

    #[test]
    fn bucket_out_of_range() {
        assert_eq!(ConfidenceBucket::from_score(-5.0), ConfidenceBucket::NotSure);
        assert_eq!(ConfidenceBucket::from_score(250.0), ConfidenceBucket::Confident);
        assert_eq!(ConfidenceBucket::from_score(f64::NAN), ConfidenceBucket::NotSure);
    }

    #[test]
    fn graded_intents() {
        let graded: Vec<_> = Intent::ALL.iter().filter(|i| i.is_graded()).collect();
        assert_eq!(graded, vec![&Intent::AssistantLookup, &Intent::ScheduleLookup]);
    }

    #[test]
    fn display_matches_json_name() {
        for intent in Intent::ALL {
            let json = serde_json::to_value(intent).unwrap();
            assert_eq!(json, intent.to_string(), "{intent:?}");
        }
    }
}
