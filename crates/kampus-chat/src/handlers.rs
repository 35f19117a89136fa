//! One handler per record-backed intent.
//!
//! Each handler fetches the requester's course catalogue, extracts entities
//! against it, queries the collaborator with the resulting filters and maps
//! rows into payload items. Collaborator errors propagate unchanged.

use chrono::{DateTime, FixedOffset, Weekday};
use kampus_core::format::{clock_span, format_significant};
use kampus_core::{
    AssignmentCard, AssistantCard, AssistantRow, CourseCatalogue, ExtractedEntities, GradeCard,
    InformationCard, Intent, PayloadItem, RequesterId, ScheduleCard, TimeRange,
};
use kampus_nlu::{Extractor, Lexicon};
use kampus_store::{DomainQuery, StoreError};
use tracing::debug;

use crate::PayloadLinks;

/// Payload produced by a handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlerOutput {
    pub items: Vec<PayloadItem>,
    /// How well the rows fit the request, 0–100. Only graded lookups set it.
    pub confidence: Option<f64>,
}

impl HandlerOutput {
    fn plain(items: Vec<PayloadItem>) -> Self {
        Self {
            items,
            confidence: None,
        }
    }
}

/// Everything a handler needs for one request.
pub struct Request<'a, Q: ?Sized> {
    pub query: &'a Q,
    pub extractor: &'a Extractor,
    pub links: &'a PayloadLinks,
    pub requester: RequesterId,
    pub text: &'a str,
    pub now: DateTime<FixedOffset>,
}

impl<Q: DomainQuery + ?Sized> Request<'_, Q> {
    fn entities(&self) -> Result<ExtractedEntities, StoreError> {
        let catalogue = CourseCatalogue::from_names(self.query.course_names(self.requester)?);
        Ok(self.extractor.extract(self.text, &catalogue, self.now))
    }
}

/// Run the handler for `intent`. Intents without records yield an empty payload.
pub fn handle<Q: DomainQuery + ?Sized>(
    intent: Intent,
    req: &Request<'_, Q>,
) -> Result<HandlerOutput, StoreError> {
    match intent {
        Intent::AssistantLookup => assistants(req),
        Intent::CourseInformation => information(req),
        Intent::ScheduleLookup => schedules(req),
        Intent::AssignmentLookup => assignments(req),
        Intent::GradeLookup => grades(req),
        Intent::Greeting
        | Intent::AboutBot
        | Intent::AboutStudent
        | Intent::AboutCreator
        | Intent::Kidding
        | Intent::Unknown => Ok(HandlerOutput::default()),
    }
}

pub fn assistants<Q: DomainQuery + ?Sized>(
    req: &Request<'_, Q>,
) -> Result<HandlerOutput, StoreError> {
    let entities = req.entities()?;
    let days = entities.distinct_days();
    let filter = entities.course_filter();
    debug!(
        days = days.len(),
        pattern = filter.as_ref().map(|f| f.pattern()),
        "assistant lookup"
    );

    let rows = req
        .query
        .assistants_with_course(req.requester, filter.as_ref(), &days)?;
    let matched: Vec<(Weekday, &str)> = rows
        .iter()
        .map(|r| (r.day, r.course_name.as_str()))
        .collect();
    let confidence = match_confidence(&entities, &matched);

    let items = merge_assistants(&rows, req.links)
        .into_iter()
        .map(PayloadItem::Assistant)
        .collect();
    Ok(HandlerOutput {
        items,
        confidence: Some(confidence),
    })
}

/// One card per assistant identity, in order of first appearance, with the
/// distinct course names of all their rows.
pub fn merge_assistants(rows: &[AssistantRow], links: &PayloadLinks) -> Vec<AssistantCard> {
    let mut order: Vec<i64> = Vec::new();
    let mut cards: Vec<AssistantCard> = Vec::new();
    for row in rows {
        match order.iter().position(|id| *id == row.identity_code) {
            Some(at) => {
                let courses = &mut cards[at].courses;
                if !courses.contains(&row.course_name) {
                    courses.push(row.course_name.clone());
                }
            }
            None => {
                order.push(row.identity_code);
                cards.push(AssistantCard {
                    name: row.name.clone(),
                    phone: row.phone.clone(),
                    messaging_id: row.messaging_id.clone(),
                    courses: vec![row.course_name.clone()],
                    image: links.photo_url(row.photo_file_id.as_deref()),
                });
            }
        }
    }
    cards
}

pub fn information<Q: DomainQuery + ?Sized>(
    req: &Request<'_, Q>,
) -> Result<HandlerOutput, StoreError> {
    let entities = req.entities()?;
    let filter = entities.course_filter();

    let enrolled = req.query.enrolled_schedule_ids(req.requester)?;
    if enrolled.is_empty() {
        return Ok(HandlerOutput::default());
    }
    let surviving: Vec<i64> = req
        .query
        .schedules_by_id(&enrolled)?
        .into_iter()
        .filter(|s| filter.as_ref().is_none_or(|f| f.matches(&s.course_name)))
        .map(|s| s.schedule_id)
        .collect();
    debug!(
        enrolled = enrolled.len(),
        surviving = surviving.len(),
        "information lookup"
    );
    if surviving.is_empty() {
        return Ok(HandlerOutput::default());
    }

    let posts = req
        .query
        .information_for_schedules(&surviving, entities.time_range.as_ref())?;
    let items = posts
        .into_iter()
        .map(|p| {
            PayloadItem::Information(InformationCard {
                id: p.id,
                title: p.title,
                description: p.description.unwrap_or_default(),
                posted_at: p.created_at.timestamp(),
                image: req.links.information_image.clone(),
            })
        })
        .collect();
    Ok(HandlerOutput::plain(items))
}

pub fn schedules<Q: DomainQuery + ?Sized>(
    req: &Request<'_, Q>,
) -> Result<HandlerOutput, StoreError> {
    let entities = req.entities()?;
    let days = entities.distinct_days();
    let filter = entities.course_filter();
    debug!(
        days = days.len(),
        pattern = filter.as_ref().map(|f| f.pattern()),
        "schedule lookup"
    );

    let rows = req
        .query
        .schedules_with_course(req.requester, filter.as_ref(), &days)?;
    let matched: Vec<(Weekday, &str)> = rows
        .iter()
        .map(|r| (r.day, r.course_name.as_str()))
        .collect();
    let confidence = match_confidence(&entities, &matched);

    let items = rows
        .iter()
        .map(|r| {
            PayloadItem::Schedule(ScheduleCard {
                course_name: r.course_name.clone(),
                day: Lexicon::day_label(r.day).to_string(),
                time: clock_span(r.start_minute, r.end_minute),
                place: r.place.clone(),
            })
        })
        .collect();
    Ok(HandlerOutput {
        items,
        confidence: Some(confidence),
    })
}

pub fn assignments<Q: DomainQuery + ?Sized>(
    req: &Request<'_, Q>,
) -> Result<HandlerOutput, StoreError> {
    let entities = req.entities()?;
    let filter = entities.course_filter();
    let rows = req.query.assignments_with_course(
        req.requester,
        filter.as_ref(),
        entities.time_range.as_ref(),
    )?;
    debug!(rows = rows.len(), "assignment lookup");

    let items = rows
        .into_iter()
        .map(|a| {
            PayloadItem::Assignment(AssignmentCard {
                url: req.links.assignment_url(a.id),
                name: a.name,
                description: a.description.unwrap_or_default(),
                due_date: a.due_date.timestamp(),
                course_name: a.course_name,
            })
        })
        .collect();
    Ok(HandlerOutput::plain(items))
}

pub fn grades<Q: DomainQuery + ?Sized>(req: &Request<'_, Q>) -> Result<HandlerOutput, StoreError> {
    let entities = req.entities()?;
    let filter = entities.course_filter();
    let rows = req.query.grades_with_course(
        req.requester,
        filter.as_ref(),
        entities.time_range.as_ref(),
    )?;
    debug!(rows = rows.len(), "grade lookup");

    let items = rows
        .into_iter()
        .map(|g| {
            PayloadItem::Grade(GradeCard {
                url: req.links.assignment_url(g.assignment_id),
                name: g.name,
                score: format_significant(g.score, 3),
                scored_time: g.updated_at.timestamp(),
                course_name: g.course_name,
            })
        })
        .collect();
    Ok(HandlerOutput::plain(items))
}

/// Share of requested constraints the rows satisfy, 0–100.
///
/// Every explicitly named day and every course fragment is one constraint;
/// a relative range ("besok", "minggu ini") is one more, however many days it
/// spans. A day is satisfied by a row on that day, a range by a row on any
/// day it covers, a fragment by a row whose course name contains it. No rows
/// scores 0; rows without any constraint score 100.
pub fn match_confidence(entities: &ExtractedEntities, rows: &[(Weekday, &str)]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let days = entities.explicit_days();
    let fragments = &entities.course_fragments;
    let implied = entities
        .time_range
        .as_ref()
        .map(TimeRange::implied_days)
        .unwrap_or_default();

    let requested = days.len() + fragments.len() + usize::from(!implied.is_empty());
    if requested == 0 {
        return 100.0;
    }
    let on_day = |d: &Weekday| rows.iter().any(|(day, _)| day == d);
    let lowered: Vec<String> = rows.iter().map(|(_, name)| name.to_lowercase()).collect();
    let days_hit = days.iter().filter(|d| on_day(d)).count();
    let range_hit = usize::from(implied.iter().any(on_day));
    let fragments_hit = fragments
        .iter()
        .filter(|f| lowered.iter().any(|name| name.contains(f.as_str())))
        .count();
    100.0 * (days_hit + range_hit + fragments_hit) as f64 / requested as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, name: &str, course: &str, photo: Option<&str>) -> AssistantRow {
        AssistantRow {
            identity_code: id,
            name: name.into(),
            phone: "0812".into(),
            messaging_id: None,
            photo_file_id: photo.map(str::to_string),
            course_name: course.into(),
            day: Weekday::Mon,
        }
    }

    #[test]
    fn duplicate_assistants_merge_courses() {
        let rows = vec![
            row(7, "Rina", "Fisika", Some("p7")),
            row(8, "Sari", "Kimia", None),
            row(7, "Rina", "Kimia", Some("p7")),
            row(7, "Rina", "Fisika", Some("p7")),
        ];
        let cards = merge_assistants(&rows, &PayloadLinks::default());
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].name, "Rina");
        assert_eq!(cards[0].courses, vec!["Fisika", "Kimia"]);
        assert_eq!(cards[0].image, "/api/v1/file/profile/p7.jpg");
        assert_eq!(cards[1].name, "Sari");
        assert_eq!(cards[1].image, "/api/v1/file/default/nophoto.png");
    }

    fn wanted(days: &[Weekday], fragments: &[&str], range: Option<TimeRange>) -> ExtractedEntities {
        let mut days = days.to_vec();
        if let Some(r) = &range {
            days.extend(r.implied_days());
        }
        ExtractedEntities {
            days,
            time_range: range,
            course_fragments: fragments.iter().map(|f| f.to_string()).collect(),
        }
    }

    fn wib_midnight(day: u32) -> DateTime<FixedOffset> {
        use chrono::TimeZone;
        FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, day, 0, 0, 0)
            .unwrap()
    }

    #[test]
    fn confidence_scores() {
        let rows = [(Weekday::Mon, "Matematika Dasar")];
        let mon = [Weekday::Mon];
        assert_eq!(match_confidence(&wanted(&mon, &["matematika"], None), &rows), 100.0);
        assert_eq!(
            match_confidence(&wanted(&[Weekday::Mon, Weekday::Sat], &["matematika"], None), &rows),
            200.0 / 3.0
        );
        assert_eq!(match_confidence(&wanted(&[Weekday::Tue], &[], None), &rows), 0.0);
        assert_eq!(match_confidence(&wanted(&[], &[], None), &rows), 100.0);
        assert_eq!(match_confidence(&wanted(&mon, &["matematika"], None), &[]), 0.0);
    }

    #[test]
    fn week_range_is_one_constraint() {
        let rows = [(Weekday::Mon, "Matematika Dasar"), (Weekday::Wed, "Fisika")];
        let week = TimeRange::relative(wib_midnight(4), wib_midnight(11));
        assert_eq!(match_confidence(&wanted(&[], &[], Some(week.clone())), &rows), 100.0);
        assert_eq!(
            match_confidence(&wanted(&[Weekday::Sat], &[], Some(week)), &rows),
            50.0
        );

        let saturday = TimeRange::relative(wib_midnight(9), wib_midnight(10));
        assert_eq!(match_confidence(&wanted(&[], &[], Some(saturday)), &rows), 0.0);
    }
}
