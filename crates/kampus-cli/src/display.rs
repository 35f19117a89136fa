//! Terminal rendering of replies and extracted entities.

use kampus_chat::Reply;
use kampus_core::{ExtractedEntities, PayloadItem};
use kampus_nlu::Lexicon;

const LABEL_WIDTH: usize = 14;

/// Print the phrase, then one vertical card per payload item.
pub fn print_reply(reply: &Reply) {
    println!("{}", reply.phrase);
    if let Some(confidence) = reply.confidence {
        println!("  ({} · {confidence:.0}% match)", reply.intent);
    }
    if reply.items.is_empty() {
        return;
    }
    println!();
    for item in &reply.items {
        print_card(item);
    }
}

fn print_card(item: &PayloadItem) {
    println!("=== {} ===", item.title());
    for (label, value) in item.fields() {
        if value.is_empty() {
            continue;
        }
        println!("  {label:<LABEL_WIDTH$} {value}");
    }
    println!();
}

pub fn print_entities(entities: &ExtractedEntities) {
    let days: Vec<&str> = entities.days.iter().map(|d| Lexicon::day_label(*d)).collect();
    print_row("days", &days.join(", "));
    match &entities.time_range {
        Some(range) => print_row(
            "time range",
            &format!("{} .. {}", range.start().to_rfc3339(), range.end().to_rfc3339()),
        ),
        None => print_row("time range", "-"),
    }
    print_row("courses", &entities.course_fragments.join(", "));
    if let Some(filter) = entities.course_filter() {
        print_row("pattern", filter.pattern());
    }
}

fn print_row(label: &str, value: &str) {
    let value = if value.is_empty() { "-" } else { value };
    println!("  {label:<LABEL_WIDTH$} {value}");
}
